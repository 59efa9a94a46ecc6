// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Persistence contract for TRANSIENT writers and persistent readers
//! (RTPS §8.7.4 "TRANSIENT and PERSISTENT data"). No concrete store ships
//! here — the crate only gates the Durability=TRANSIENT replay path on
//! these traits.

use crate::history::CacheChange;
use crate::types::{Guid, SequenceNumber};

/// Backs a TRANSIENT `StatefulWriter`'s history across process restarts.
/// `persistence_guid` substitutes the writer's run-scoped GUID as the key,
/// so a restarted writer resumes the same retained history under a stable
/// identity.
pub trait WriterStore: Send + Sync {
    fn load_writer_state(&self, persistence_guid: Guid) -> crate::error::Result<Vec<CacheChange>>;
    fn store_change(&self, persistence_guid: Guid, change: &CacheChange) -> crate::error::Result<()>;
    fn remove_change(&self, persistence_guid: Guid, seq: SequenceNumber) -> crate::error::Result<()>;
}

/// Backs a persistent reader's last-notified watermark per writer, so a
/// restarted reader doesn't redeliver samples the application already saw.
pub trait ReaderStore: Send + Sync {
    fn load_last_notified(&self, persistence_guid: Guid, writer_guid: Guid) -> crate::error::Result<SequenceNumber>;
    fn store_last_notified(
        &self,
        persistence_guid: Guid,
        writer_guid: Guid,
        seq: SequenceNumber,
    ) -> crate::error::Result<()>;
}

/// A `WriterStore`/`ReaderStore` pair that retains nothing — the default
/// for VOLATILE/TRANSIENT_LOCAL durability, where no Non-goal is violated
/// by simply not persisting.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPersistence;

impl WriterStore for NoPersistence {
    fn load_writer_state(&self, _persistence_guid: Guid) -> crate::error::Result<Vec<CacheChange>> {
        Ok(Vec::new())
    }

    fn store_change(&self, _persistence_guid: Guid, _change: &CacheChange) -> crate::error::Result<()> {
        Ok(())
    }

    fn remove_change(&self, _persistence_guid: Guid, _seq: SequenceNumber) -> crate::error::Result<()> {
        Ok(())
    }
}

impl ReaderStore for NoPersistence {
    fn load_last_notified(&self, _persistence_guid: Guid, _writer_guid: Guid) -> crate::error::Result<SequenceNumber> {
        Ok(SequenceNumber::ZERO)
    }

    fn store_last_notified(
        &self,
        _persistence_guid: Guid,
        _writer_guid: Guid,
        _seq: SequenceNumber,
    ) -> crate::error::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityId, GuidPrefix};

    fn guid() -> Guid {
        Guid::new(GuidPrefix::new([1u8; 12]), EntityId::new([0, 0, 1, 2]))
    }

    #[test]
    fn no_persistence_always_reports_an_empty_history() {
        let store = NoPersistence;
        assert!(store.load_writer_state(guid()).unwrap().is_empty());
    }

    #[test]
    fn no_persistence_reports_watermark_zero_for_any_writer() {
        let store = NoPersistence;
        assert_eq!(store.load_last_notified(guid(), guid()).unwrap(), SequenceNumber::ZERO);
    }
}
