// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-reader state kept by a `StatefulWriter` (RTPS §8.4.9).

use crate::qos::Reliability;
use crate::types::{Guid, Locator, SequenceNumber};
use std::collections::BTreeMap;

/// The delivery status of one sequence number with respect to one matched
/// reader (RTPS §8.4.9.1, Table 8.19).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeForReaderStatus {
    /// Not yet decided whether/how to send.
    Unsent,
    /// Sent, not yet acknowledged, no retransmit requested.
    Unacknowledged,
    /// The reader's ACKNACK explicitly asked for this sequence number again.
    Requested,
    /// The reader's ACKNACK confirmed receipt.
    Acknowledged,
    /// A retransmission for this sequence number is currently in flight.
    Underway,
}

/// Everything a `StatefulWriter` tracks about one matched reader.
pub struct ReaderProxy {
    pub remote_reader_guid: Guid,
    pub unicast_locators: Vec<Locator>,
    pub multicast_locators: Vec<Locator>,
    pub is_reliable: bool,
    pub expects_inline_qos: bool,
    changes: BTreeMap<i64, ChangeForReaderStatus>,
    pub last_acknack_count: Option<u32>,
    /// Fragment numbers requested by the most recent NACKFRAG for a given
    /// sequence number, sent via fragment-level retransmission rather than
    /// whole-change resend.
    pub requested_fragments: BTreeMap<i64, Vec<u32>>,
    /// Last NACKFRAG `count` seen per sequence number, for staleness
    /// detection analogous to `last_acknack_count`.
    last_nackfrag_count: BTreeMap<i64, u32>,
}

impl ReaderProxy {
    pub fn new(remote_reader_guid: Guid, reliability: Reliability) -> Self {
        Self {
            remote_reader_guid,
            unicast_locators: Vec::new(),
            multicast_locators: Vec::new(),
            is_reliable: matches!(reliability, Reliability::Reliable),
            expects_inline_qos: false,
            changes: BTreeMap::new(),
            last_acknack_count: None,
            requested_fragments: BTreeMap::new(),
            last_nackfrag_count: BTreeMap::new(),
        }
    }

    /// Register a newly written change as UNSENT (RELIABLE) or
    /// UNACKNOWLEDGED-equivalent (BEST_EFFORT, which never waits for acks).
    pub fn add_change(&mut self, sn: SequenceNumber) {
        let status = if self.is_reliable {
            ChangeForReaderStatus::Unsent
        } else {
            ChangeForReaderStatus::Unacknowledged
        };
        self.changes.insert(sn.0, status);
    }

    pub fn status(&self, sn: SequenceNumber) -> Option<ChangeForReaderStatus> {
        self.changes.get(&sn.0).copied()
    }

    pub fn set_status(&mut self, sn: SequenceNumber, status: ChangeForReaderStatus) {
        self.changes.insert(sn.0, status);
    }

    pub fn unsent_changes(&self) -> Vec<SequenceNumber> {
        self.changes
            .iter()
            .filter(|(_, s)| **s == ChangeForReaderStatus::Unsent)
            .map(|(sn, _)| SequenceNumber::new(*sn))
            .collect()
    }

    pub fn requested_changes(&self) -> Vec<SequenceNumber> {
        self.changes
            .iter()
            .filter(|(_, s)| **s == ChangeForReaderStatus::Requested)
            .map(|(sn, _)| SequenceNumber::new(*sn))
            .collect()
    }

    pub fn unacknowledged_changes(&self) -> Vec<SequenceNumber> {
        self.changes
            .iter()
            .filter(|(_, s)| matches!(**s, ChangeForReaderStatus::Unacknowledged | ChangeForReaderStatus::Unsent))
            .map(|(sn, _)| SequenceNumber::new(*sn))
            .collect()
    }

    pub fn all_acknowledged(&self) -> bool {
        self.changes.values().all(|s| *s == ChangeForReaderStatus::Acknowledged)
    }

    /// Apply an incoming ACKNACK: everything covered by `reader_sn_state`'s
    /// base is acknowledged, and every bit the set marks as missing is
    /// moved to REQUESTED (deduplicating against stale/out-of-order
    /// ACKNACKs via `count`).
    pub fn apply_acknack(
        &mut self,
        reader_sn_state: &crate::wire::SequenceNumberSet,
        count: u32,
    ) -> bool {
        if let Some(last) = self.last_acknack_count {
            if count <= last {
                return false; // stale or duplicate ACKNACK, ignore
            }
        }
        self.last_acknack_count = Some(count);

        for (sn, status) in self.changes.iter_mut() {
            let sequence_number = SequenceNumber::new(*sn);
            if sequence_number < reader_sn_state.base() {
                *status = ChangeForReaderStatus::Acknowledged;
            } else if reader_sn_state.is_set(sequence_number) {
                *status = ChangeForReaderStatus::Requested;
            } else if sequence_number < SequenceNumber::new(reader_sn_state.base().0 + reader_sn_state.num_bits() as i64)
            {
                *status = ChangeForReaderStatus::Acknowledged;
            }
        }
        true
    }

    /// Apply an incoming NACKFRAG: records the fragment numbers the reader
    /// is missing for `sn` and flips that sequence number's status to
    /// REQUESTED so the writer resends it, deduplicating stale/duplicate
    /// NACKFRAGs via a per-sequence-number `count`, the same way
    /// `apply_acknack` deduplicates whole-change requests.
    pub fn apply_nackfrag(
        &mut self,
        sn: SequenceNumber,
        fragment_number_state: &crate::wire::FragmentNumberSet,
        count: u32,
    ) -> bool {
        if let Some(last) = self.last_nackfrag_count.get(&sn.0) {
            if count <= *last {
                return false; // stale or duplicate NACKFRAG, ignore
            }
        }
        self.last_nackfrag_count.insert(sn.0, count);

        let fragments: Vec<u32> = fragment_number_state.iter().map(|fragment| fragment.0 as u32).collect();
        self.requested_fragments.insert(sn.0, fragments);
        self.changes.insert(sn.0, ChangeForReaderStatus::Requested);
        true
    }

    /// Fragment numbers requested for `sn` by the most recent NACKFRAG, if
    /// any are still outstanding.
    pub fn requested_fragments_for(&self, sn: SequenceNumber) -> Option<&[u32]> {
        self.requested_fragments.get(&sn.0).map(|v| v.as_slice())
    }

    /// Clear fragment-level request tracking for `sn`, once the writer has
    /// retransmitted the requested fragments.
    pub fn clear_requested_fragments(&mut self, sn: SequenceNumber) {
        self.requested_fragments.remove(&sn.0);
    }

    /// Drop tracking for sequence numbers the writer has compacted out of
    /// its history (no longer retransmittable).
    pub fn forget_below(&mut self, low_mark: SequenceNumber) {
        self.changes.retain(|sn, _| *sn > low_mark.0);
        self.requested_fragments.retain(|sn, _| *sn > low_mark.0);
        self.last_nackfrag_count.retain(|sn, _| *sn > low_mark.0);
    }
}
