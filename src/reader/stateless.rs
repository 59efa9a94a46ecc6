// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `StatelessReader`: admits samples from any writer without per-writer
//! tracking or acknowledgement (RTPS §8.4.8) — used for SPDP reception and
//! any BEST_EFFORT reader that doesn't need writer-liveliness bookkeeping.

use crate::history::{CacheChange, ChangeKind, HistoryCache};
use crate::qos::{History, ResourceLimits};
use crate::types::{Guid, SequenceNumber};

pub struct StatelessReader {
    pub guid: Guid,
    history_cache: HistoryCache,
}

impl StatelessReader {
    pub fn new(guid: Guid) -> Self {
        Self {
            guid,
            history_cache: HistoryCache::new(History::KeepLast(1), ResourceLimits::default()),
        }
    }

    pub fn receive_change(
        &mut self,
        writer_guid: Guid,
        sn: SequenceNumber,
        instance_key: Vec<u8>,
        data: Vec<u8>,
    ) -> bool {
        self.history_cache
            .add_change(CacheChange {
                writer_guid,
                sequence_number: sn,
                kind: ChangeKind::Alive,
                instance_key,
                data,
                source_timestamp: None,
            })
            .is_ok()
    }

    pub fn iter_changes(&self) -> impl Iterator<Item = &CacheChange> {
        self.history_cache.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityId, GuidPrefix};

    #[test]
    fn admits_changes_from_any_writer_without_matching() {
        let reader_guid = Guid::new(GuidPrefix::new([6u8; 12]), EntityId::new([0, 0, 1, 7]));
        let writer_a = Guid::new(GuidPrefix::new([7u8; 12]), EntityId::new([0, 0, 1, 2]));
        let writer_b = Guid::new(GuidPrefix::new([8u8; 12]), EntityId::new([0, 0, 1, 2]));

        let mut r = StatelessReader::new(reader_guid);
        assert!(r.receive_change(writer_a, SequenceNumber::new(1), vec![], vec![1]));
        assert!(r.receive_change(writer_b, SequenceNumber::new(1), vec![], vec![2]));
        assert_eq!(r.iter_changes().count(), 2);
    }
}
