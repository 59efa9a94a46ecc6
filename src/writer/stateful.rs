// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `StatefulWriter`: the reliable (or best-effort) writer state machine
//! that tracks each matched reader individually (RTPS §8.4.9).
//!
//! | Reader-proxy state | Entered when                              | Leaves when            |
//! |---------------------|--------------------------------------------|-------------------------|
//! | UNSENT              | change just added, RELIABLE                 | first send attempt       |
//! | UNACKNOWLEDGED       | sent, no ack yet / writer is BEST_EFFORT    | ack or nack received     |
//! | REQUESTED            | named in an ACKNACK's bitmap                 | retransmitted            |
//! | UNDERWAY             | retransmission in flight                     | send completes            |
//! | ACKNOWLEDGED          | confirmed by ACKNACK (below base, or unset bit) | never (terminal per change) |

use crate::error::Result;
use crate::history::{CacheChange, ChangeKind, HistoryCache, PayloadPoolPolicy};
use crate::qos::{Durability, History, Qos, Reliability};
use crate::telemetry::ReliableMetrics;
use crate::types::{Guid, SequenceNumber};
use crate::wire::{DataFragMsg, FragmentNumberSet, SequenceNumberSet};
use crate::writer::reader_proxy::{ChangeForReaderStatus, ReaderProxy};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

pub struct StatefulWriter {
    pub guid: Guid,
    pub qos: Qos,
    history_cache: HistoryCache,
    proxies: HashMap<Guid, ReaderProxy>,
    next_sn: SequenceNumber,
    heartbeat_count: AtomicU32,
    pub metrics: Arc<ReliableMetrics>,
    /// Payload size above which `write()`'s admitted change must be split
    /// into DATA_FRAG submessages instead of sent as one DATA submessage.
    fragment_size: u16,
}

impl StatefulWriter {
    pub fn new(guid: Guid, qos: Qos) -> Self {
        let history_cache = HistoryCache::with_pool_policy(
            qos.history,
            qos.resource_limits,
            PayloadPoolPolicy::default(),
        );
        Self {
            guid,
            qos,
            history_cache,
            proxies: HashMap::new(),
            next_sn: SequenceNumber::new(1),
            heartbeat_count: AtomicU32::new(0),
            metrics: Arc::new(ReliableMetrics::default()),
            fragment_size: crate::config::constants::DEFAULT_FRAGMENT_SIZE,
        }
    }

    /// Override the fragmentation threshold (default
    /// [`crate::config::constants::DEFAULT_FRAGMENT_SIZE`]).
    pub fn set_fragment_size(&mut self, fragment_size: u16) {
        self.fragment_size = fragment_size;
    }

    pub fn matched_reader_add(&mut self, proxy: ReaderProxy) {
        let guid = proxy.remote_reader_guid;
        self.proxies.insert(guid, proxy);
        // VOLATILE readers only ever see changes written after they match.
        // TRANSIENT_LOCAL/TRANSIENT readers see the writer's entire retained
        // history as unsent.
        if matches!(self.qos.durability, Durability::Volatile) {
            return;
        }
        let sns: Vec<SequenceNumber> = self.history_cache.iter().map(|c| c.sequence_number).collect();
        if let Some(p) = self.proxies.get_mut(&guid) {
            for sn in sns {
                p.add_change(sn);
            }
        }
    }

    pub fn matched_reader_remove(&mut self, reader_guid: Guid) {
        self.proxies.remove(&reader_guid);
    }

    pub fn matched_reader_count(&self) -> usize {
        self.proxies.len()
    }

    /// Write a new sample, admitting it to the history cache and marking it
    /// UNSENT/UNACKNOWLEDGED for every matched reader.
    pub fn write(&mut self, instance_key: Vec<u8>, data: Vec<u8>) -> Result<SequenceNumber> {
        let sn = self.next_sn;
        self.history_cache.add_change(CacheChange {
            writer_guid: self.guid,
            sequence_number: sn,
            kind: ChangeKind::Alive,
            instance_key,
            data,
            source_timestamp: None,
        })?;
        self.next_sn = sn.next();
        for proxy in self.proxies.values_mut() {
            proxy.add_change(sn);
        }
        Ok(sn)
    }

    pub fn get_change(&self, sn: SequenceNumber) -> Option<&CacheChange> {
        self.history_cache.get(self.guid, sn)
    }

    /// `true` if `sn`'s payload is large enough that it must be delivered
    /// as DATA_FRAG submessages rather than a single DATA submessage.
    pub fn requires_fragmentation(&self, sn: SequenceNumber) -> bool {
        self.get_change(sn).map(|c| c.data.len() > self.fragment_size as usize).unwrap_or(false)
    }

    /// Split `sn`'s payload into the DATA_FRAG submessages needed to
    /// deliver it whole to `reader_guid` (RTPS §8.4.14.1.1), one fragment
    /// per submessage. Empty if the change is unknown or small enough to
    /// send as a single DATA submessage instead.
    pub fn fragment_change(&self, reader_guid: Guid, sn: SequenceNumber) -> Vec<DataFragMsg> {
        let Some(change) = self.get_change(sn) else {
            return Vec::new();
        };
        if change.data.len() <= self.fragment_size as usize {
            return Vec::new();
        }
        let sample_size = change.data.len() as u32;
        let fragment_size = self.fragment_size;
        change
            .data
            .chunks(fragment_size as usize)
            .enumerate()
            .map(|(i, chunk)| DataFragMsg {
                reader_id: reader_guid.entity_id,
                writer_id: self.guid.entity_id,
                writer_sn: sn,
                fragment_starting_num: i as u32 + 1,
                fragments_in_submessage: 1,
                fragment_size,
                sample_size,
                inline_qos: None,
                payload: chunk.to_vec(),
            })
            .collect()
    }

    /// Build only the DATA_FRAG submessages covering the fragment numbers
    /// `reader_guid` most recently NACKFRAG'd for `sn`, for a targeted
    /// retransmission instead of resending the whole change.
    pub fn fragments_for_nackfrag(&self, reader_guid: Guid, sn: SequenceNumber) -> Vec<DataFragMsg> {
        let Some(requested) = self.requested_fragments(reader_guid, sn) else {
            return Vec::new();
        };
        self.fragment_change(reader_guid, sn)
            .into_iter()
            .filter(|frag| requested.contains(&frag.fragment_starting_num))
            .collect()
    }

    /// Sequence numbers this reader still needs sent (UNSENT or REQUESTED).
    pub fn changes_to_send(&self, reader_guid: Guid) -> Vec<SequenceNumber> {
        let Some(proxy) = self.proxies.get(&reader_guid) else {
            return Vec::new();
        };
        let mut out = proxy.unsent_changes();
        out.extend(proxy.requested_changes());
        out.sort();
        out
    }

    /// Mark a change as sent to `reader_guid`: RELIABLE readers move to
    /// UNACKNOWLEDGED pending an ACKNACK; BEST_EFFORT readers are
    /// considered done immediately since no ack is ever expected.
    pub fn mark_sent(&mut self, reader_guid: Guid, sn: SequenceNumber) {
        if let Some(proxy) = self.proxies.get_mut(&reader_guid) {
            let status = if proxy.is_reliable {
                ChangeForReaderStatus::Unacknowledged
            } else {
                ChangeForReaderStatus::Acknowledged
            };
            proxy.set_status(sn, status);
        }
    }

    /// Apply an incoming ACKNACK from `reader_guid`, returning `true` if it
    /// changed anything (i.e. wasn't stale).
    pub fn receive_acknack(
        &mut self,
        reader_guid: Guid,
        reader_sn_state: &SequenceNumberSet,
        count: u32,
    ) -> bool {
        self.metrics.record_acknack_received();
        let Some(proxy) = self.proxies.get_mut(&reader_guid) else {
            return false;
        };
        proxy.apply_acknack(reader_sn_state, count)
    }

    /// Apply an incoming NACKFRAG from `reader_guid`, naming fragments of
    /// `writer_sn` the reader is still missing. Returns `true` if it wasn't
    /// stale.
    pub fn receive_nackfrag(
        &mut self,
        reader_guid: Guid,
        writer_sn: SequenceNumber,
        fragment_number_state: &FragmentNumberSet,
        count: u32,
    ) -> bool {
        self.metrics.record_nackfrag_received();
        let Some(proxy) = self.proxies.get_mut(&reader_guid) else {
            return false;
        };
        proxy.apply_nackfrag(writer_sn, fragment_number_state, count)
    }

    /// Fragment numbers of `sn` still requested by `reader_guid`'s most
    /// recent NACKFRAG, if any.
    pub fn requested_fragments(&self, reader_guid: Guid, sn: SequenceNumber) -> Option<Vec<u32>> {
        self.proxies.get(&reader_guid)?.requested_fragments_for(sn).map(|v| v.to_vec())
    }

    /// Clear fragment-level request tracking for `sn` on `reader_guid`,
    /// once those fragments have been retransmitted.
    pub fn mark_fragments_sent(&mut self, reader_guid: Guid, sn: SequenceNumber) {
        if let Some(proxy) = self.proxies.get_mut(&reader_guid) {
            proxy.clear_requested_fragments(sn);
        }
    }

    /// Build the next HEARTBEAT announcing `[first_sn, last_sn]` for the
    /// writer's retained history, with a fresh monotonically increasing
    /// count (RTPS §8.4.9.1.4).
    pub fn next_heartbeat_count(&self) -> u32 {
        self.heartbeat_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn history_range(&self) -> (SequenceNumber, SequenceNumber) {
        let first = self
            .history_cache
            .iter()
            .map(|c| c.sequence_number)
            .min()
            .unwrap_or(SequenceNumber::ZERO);
        let last = self
            .history_cache
            .iter()
            .map(|c| c.sequence_number)
            .max()
            .unwrap_or(SequenceNumber::ZERO);
        (first, last)
    }

    /// Compact the history cache and every reader proxy's tracking below
    /// the lowest sequence number acknowledged by every matched reader —
    /// the writer's low-water mark.
    pub fn compact_fully_acknowledged(&mut self) {
        if self.proxies.is_empty() {
            return;
        }
        let highest_fully_acked = SequenceNumber::new(self.next_sn.0 - 1);
        let low_mark = self
            .proxies
            .values()
            .map(|p| {
                p.unacknowledged_changes()
                    .into_iter()
                    .chain(p.requested_changes())
                    .min()
                    .map(|sn| SequenceNumber::new(sn.0 - 1))
                    .unwrap_or(highest_fully_acked)
            })
            .min()
            .unwrap_or(SequenceNumber::ZERO);

        self.history_cache.compact_below(self.guid, low_mark);
        for proxy in self.proxies.values_mut() {
            proxy.forget_below(low_mark);
        }
    }

    /// `true` once every matched RELIABLE reader has acknowledged every
    /// change currently in the history cache — the condition
    /// `wait_for_all_acked` blocks on.
    pub fn all_readers_acknowledged(&self) -> bool {
        self.proxies.values().all(|p| p.all_acknowledged())
    }

    pub fn is_reliable(&self) -> bool {
        matches!(self.qos.reliability, Reliability::Reliable)
    }

    pub fn history_depth_policy(&self) -> History {
        self.qos.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityId, GuidPrefix};

    fn writer_guid() -> Guid {
        Guid::new(GuidPrefix::new([1u8; 12]), EntityId::new([0, 0, 1, 2]))
    }

    fn reader_guid() -> Guid {
        Guid::new(GuidPrefix::new([2u8; 12]), EntityId::new([0, 0, 1, 7]))
    }

    #[test]
    fn transient_local_matched_reader_sees_existing_history_as_unsent() {
        let mut qos = Qos::default();
        qos.durability = crate::qos::Durability::TransientLocal;
        let mut w = StatefulWriter::new(writer_guid(), qos);
        w.write(vec![], vec![1]).unwrap();
        w.write(vec![], vec![2]).unwrap();

        w.matched_reader_add(ReaderProxy::new(reader_guid(), Reliability::Reliable));
        let to_send = w.changes_to_send(reader_guid());
        assert_eq!(to_send, vec![SequenceNumber::new(1), SequenceNumber::new(2)]);
    }

    #[test]
    fn volatile_matched_reader_does_not_see_existing_history() {
        let w_qos = Qos::default(); // Volatile by default
        let mut w = StatefulWriter::new(writer_guid(), w_qos);
        w.write(vec![], vec![1]).unwrap();
        w.write(vec![], vec![2]).unwrap();

        w.matched_reader_add(ReaderProxy::new(reader_guid(), Reliability::Reliable));
        assert!(w.changes_to_send(reader_guid()).is_empty());

        w.write(vec![], vec![3]).unwrap();
        assert_eq!(w.changes_to_send(reader_guid()), vec![SequenceNumber::new(3)]);
    }

    #[test]
    fn acknack_moves_acknowledged_changes_out_of_unsent() {
        let mut w = StatefulWriter::new(writer_guid(), Qos::default());
        w.write(vec![], vec![1]).unwrap();
        w.matched_reader_add(ReaderProxy::new(reader_guid(), Reliability::Reliable));
        w.mark_sent(reader_guid(), SequenceNumber::new(1));

        let set = SequenceNumberSet::empty(SequenceNumber::new(2));
        w.receive_acknack(reader_guid(), &set, 1);
        assert!(w.all_readers_acknowledged());
    }

    #[test]
    fn nackfrag_requests_fragments_of_an_already_sent_change() {
        let mut w = StatefulWriter::new(writer_guid(), Qos::default());
        let sn = w.write(vec![], vec![1]).unwrap();
        w.matched_reader_add(ReaderProxy::new(reader_guid(), Reliability::Reliable));
        w.mark_sent(reader_guid(), sn);

        let mut fragment_set = SequenceNumberSet::empty(SequenceNumber::new(1));
        fragment_set.set(SequenceNumber::new(2));
        assert!(w.receive_nackfrag(reader_guid(), sn, &fragment_set, 1));

        assert_eq!(w.requested_fragments(reader_guid(), sn), Some(vec![2]));
        assert_eq!(w.changes_to_send(reader_guid()), vec![sn]);

        w.mark_fragments_sent(reader_guid(), sn);
        assert!(w.requested_fragments(reader_guid(), sn).is_none());
    }

    #[test]
    fn oversized_change_requires_fragmentation_and_splits_cleanly() {
        let mut w = StatefulWriter::new(writer_guid(), Qos::default());
        w.set_fragment_size(4);
        let sn = w.write(vec![], vec![1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();

        assert!(w.requires_fragmentation(sn));
        let fragments = w.fragment_change(reader_guid(), sn);
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[0].payload, vec![1, 2, 3, 4]);
        assert_eq!(fragments[1].payload, vec![5, 6, 7, 8]);
        assert_eq!(fragments[2].payload, vec![9]);
        assert_eq!(fragments[2].fragment_starting_num, 3);
        assert!(fragments.iter().all(|f| f.sample_size == 9));
    }

    #[test]
    fn small_change_does_not_require_fragmentation() {
        let mut w = StatefulWriter::new(writer_guid(), Qos::default());
        w.set_fragment_size(1344);
        let sn = w.write(vec![], vec![1, 2, 3]).unwrap();
        assert!(!w.requires_fragmentation(sn));
        assert!(w.fragment_change(reader_guid(), sn).is_empty());
    }

    #[test]
    fn nackfrag_retransmission_sends_only_the_requested_fragments() {
        let mut w = StatefulWriter::new(writer_guid(), Qos::default());
        w.set_fragment_size(4);
        let sn = w.write(vec![], vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        w.matched_reader_add(ReaderProxy::new(reader_guid(), Reliability::Reliable));

        let mut requested = SequenceNumberSet::empty(SequenceNumber::new(1));
        requested.set(SequenceNumber::new(2));
        w.receive_nackfrag(reader_guid(), sn, &requested, 1);

        let to_resend = w.fragments_for_nackfrag(reader_guid(), sn);
        assert_eq!(to_resend.len(), 1);
        assert_eq!(to_resend[0].fragment_starting_num, 2);
        assert_eq!(to_resend[0].payload, vec![5, 6, 7, 8]);
    }

    #[test]
    fn best_effort_reader_is_immediately_acknowledged_on_send() {
        let mut w = StatefulWriter::new(writer_guid(), Qos::default());
        w.write(vec![], vec![1]).unwrap();
        w.matched_reader_add(ReaderProxy::new(reader_guid(), Reliability::BestEffort));
        w.mark_sent(reader_guid(), SequenceNumber::new(1));
        assert!(w.all_readers_acknowledged());
    }
}
