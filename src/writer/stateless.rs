// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `StatelessWriter`: broadcasts changes to whatever locators are
//! configured without tracking individual readers (RTPS §8.4.7).
//! Used for SPDP and any BEST_EFFORT, unmatched-reader-agnostic traffic.

use crate::history::{CacheChange, ChangeKind, HistoryCache};
use crate::qos::{History, ResourceLimits};
use crate::types::{Guid, Locator, SequenceNumber};

pub struct StatelessWriter {
    pub guid: Guid,
    pub reader_locators: Vec<Locator>,
    history_cache: HistoryCache,
    next_sn: SequenceNumber,
}

impl StatelessWriter {
    pub fn new(guid: Guid) -> Self {
        Self {
            guid,
            reader_locators: Vec::new(),
            history_cache: HistoryCache::new(History::KeepLast(1), ResourceLimits::default()),
            next_sn: SequenceNumber::new(1),
        }
    }

    pub fn add_reader_locator(&mut self, locator: Locator) {
        if !self.reader_locators.contains(&locator) {
            self.reader_locators.push(locator);
        }
    }

    /// Register a new sample, assigning it the next sequence number.
    pub fn write(&mut self, instance_key: Vec<u8>, data: Vec<u8>) -> crate::error::Result<SequenceNumber> {
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
        Ok(sn)
    }

    /// Every change currently retained, to be unconditionally sent (again)
    /// to each of `reader_locators` — BEST_EFFORT never retransmits based
    /// on feedback because a `StatelessWriter` accepts none.
    pub fn changes_to_send(&self) -> impl Iterator<Item = &CacheChange> {
        self.history_cache.iter()
    }
}
