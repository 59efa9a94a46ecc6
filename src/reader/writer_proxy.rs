// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-writer state kept by a `StatefulReader` (RTPS §8.4.10).

use crate::config::lease_expiry_deadline;
use crate::types::{Guid, SequenceNumber};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// The receive-side status of one sequence number with respect to one
/// matched writer (RTPS §8.4.10.1, Table 8.21).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFromWriterStatus {
    /// The reader doesn't yet know this sequence number exists.
    Unknown,
    /// Known missing (named in a HEARTBEAT range but never received).
    Missing,
    /// Received and delivered to the history cache.
    Received,
    /// Declared gone by a GAP; will never arrive.
    Lost,
}

/// Everything a `StatefulReader` tracks about one matched writer: which
/// sequence numbers it has seen, and the writer's liveliness lease.
pub struct WriterProxy {
    pub remote_writer_guid: Guid,
    received: BTreeSet<i64>,
    lost: BTreeSet<i64>,
    highest_known: Option<SequenceNumber>,
    pub lease_duration: Duration,
    last_liveliness_at: Instant,
    acknack_count: u32,
}

impl WriterProxy {
    pub fn new(remote_writer_guid: Guid, lease_duration: Duration) -> Self {
        Self {
            remote_writer_guid,
            received: BTreeSet::new(),
            lost: BTreeSet::new(),
            highest_known: None,
            lease_duration,
            last_liveliness_at: Instant::now(),
            acknack_count: 0,
        }
    }

    pub fn status(&self, sn: SequenceNumber) -> ChangeFromWriterStatus {
        if self.received.contains(&sn.0) {
            ChangeFromWriterStatus::Received
        } else if self.lost.contains(&sn.0) {
            ChangeFromWriterStatus::Lost
        } else if self.highest_known.map(|h| sn <= h).unwrap_or(false) {
            ChangeFromWriterStatus::Missing
        } else {
            ChangeFromWriterStatus::Unknown
        }
    }

    pub fn mark_received(&mut self, sn: SequenceNumber) {
        self.received.insert(sn.0);
        self.advance_highest_known(sn);
    }

    pub fn mark_lost(&mut self, sn: SequenceNumber) {
        if !self.received.contains(&sn.0) {
            self.lost.insert(sn.0);
        }
        self.advance_highest_known(sn);
    }

    fn advance_highest_known(&mut self, sn: SequenceNumber) {
        self.highest_known = Some(self.highest_known.map_or(sn, |h| h.max(sn)));
    }

    /// Apply a HEARTBEAT's `[first_sn, last_sn]` range: anything in range
    /// never seen becomes MISSING; `last_sn` becomes the new high-water
    /// mark even if it's below what we already know (writers never shrink
    /// the range in practice, but we don't trust that blindly).
    pub fn apply_heartbeat(&mut self, first_sn: SequenceNumber, last_sn: SequenceNumber) {
        self.advance_highest_known(last_sn);
        let mut sn = first_sn;
        while sn <= last_sn {
            if !self.received.contains(&sn.0) && !self.lost.contains(&sn.0) {
                // stays Unknown/Missing by virtue of highest_known advancing
            }
            sn = sn + 1;
        }
    }

    /// Every sequence number the reader knows about but has not received,
    /// in ascending order — candidates for the next ACKNACK's bitmap.
    pub fn missing_changes(&self) -> Vec<SequenceNumber> {
        let Some(highest) = self.highest_known else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut sn = SequenceNumber::new(1);
        while sn <= highest {
            if !self.received.contains(&sn.0) && !self.lost.contains(&sn.0) {
                out.push(sn);
            }
            sn = sn + 1;
        }
        out
    }

    pub fn next_acknack_count(&mut self) -> u32 {
        self.acknack_count += 1;
        self.acknack_count
    }

    pub fn assert_liveliness(&mut self) {
        self.last_liveliness_at = Instant::now();
    }

    pub fn is_alive(&self) -> bool {
        Instant::now() < self.last_liveliness_at + lease_expiry_deadline(self.lease_duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityId, GuidPrefix};

    fn writer_guid() -> Guid {
        Guid::new(GuidPrefix::new([3u8; 12]), EntityId::new([0, 0, 1, 2]))
    }

    #[test]
    fn heartbeat_then_missing_changes_lists_unreceived_sequence_numbers() {
        let mut proxy = WriterProxy::new(writer_guid(), Duration::from_secs(20));
        proxy.apply_heartbeat(SequenceNumber::new(1), SequenceNumber::new(5));
        proxy.mark_received(SequenceNumber::new(2));
        proxy.mark_received(SequenceNumber::new(4));

        let missing = proxy.missing_changes();
        assert_eq!(
            missing,
            vec![1, 3, 5].into_iter().map(SequenceNumber::new).collect::<Vec<_>>()
        );
    }

    #[test]
    fn gap_marks_lost_unless_already_received() {
        let mut proxy = WriterProxy::new(writer_guid(), Duration::from_secs(20));
        proxy.mark_received(SequenceNumber::new(1));
        proxy.mark_lost(SequenceNumber::new(1)); // already received, no-op
        proxy.mark_lost(SequenceNumber::new(2));

        assert_eq!(proxy.status(SequenceNumber::new(1)), ChangeFromWriterStatus::Received);
        assert_eq!(proxy.status(SequenceNumber::new(2)), ChangeFromWriterStatus::Lost);
    }

    #[test]
    fn fresh_proxy_is_alive_and_becomes_not_alive_after_lease_expiry() {
        let mut proxy = WriterProxy::new(writer_guid(), Duration::from_millis(1));
        assert!(proxy.is_alive());
        std::thread::sleep(Duration::from_millis(10));
        assert!(!proxy.is_alive());
        proxy.assert_liveliness();
        assert!(proxy.is_alive());
    }
}
