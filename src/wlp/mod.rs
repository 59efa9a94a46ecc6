// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Writer Liveliness Protocol (RTPS §8.4.13): a built-in stateful
//! writer/reader pair carrying periodic `ParticipantMessageData` samples
//! that assert MANUAL_BY_PARTICIPANT and MANUAL_BY_TOPIC liveliness.
//! AUTOMATIC liveliness needs no WLP traffic — any RTPS message from the
//! remote participant already refreshes it (RTPS §8.4.13.2).

use crate::qos::Qos;
use crate::reader::StatefulReader;
use crate::types::{Guid, GuidPrefix};
use crate::writer::StatefulWriter;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// The liveliness kind a `ParticipantMessageData` sample asserts — the
/// wire key's 4-byte kind suffix (RTPS §8.4.13.5, Table 8.44).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionKind {
    ManualByParticipant,
    ManualByTopic,
}

impl AssertionKind {
    fn kind_bytes(self) -> [u8; 4] {
        match self {
            AssertionKind::ManualByParticipant => [0, 0, 0, 1],
            AssertionKind::ManualByTopic => [0, 0, 0, 2],
        }
    }
}

/// Drives the Writer Liveliness Protocol for one local Participant.
pub struct Wlp {
    local_guid_prefix: GuidPrefix,
    writer: StatefulWriter,
    reader: StatefulReader,
    last_participant_assertion: Instant,
    last_topic_assertion: HashMap<Guid, Instant>,
}

impl Wlp {
    pub fn new(local_guid_prefix: GuidPrefix, wlp_writer_guid: Guid, wlp_reader_guid: Guid) -> Self {
        Self {
            local_guid_prefix,
            writer: StatefulWriter::new(wlp_writer_guid, Qos::default()),
            reader: StatefulReader::new(wlp_reader_guid, Qos::default()),
            last_participant_assertion: Instant::now(),
            last_topic_assertion: HashMap::new(),
        }
    }

    fn participant_message_key(&self, kind: AssertionKind) -> Vec<u8> {
        let mut key = self.local_guid_prefix.0.to_vec();
        key.extend_from_slice(&kind.kind_bytes());
        key
    }

    /// Enqueue a MANUAL_BY_PARTICIPANT assertion, refreshing every local
    /// writer whose Liveliness kind is MANUAL_BY_PARTICIPANT at once.
    pub fn assert_liveliness_by_participant(&mut self) -> crate::error::Result<()> {
        let key = self.participant_message_key(AssertionKind::ManualByParticipant);
        self.writer.write(key, Vec::new())?;
        self.last_participant_assertion = Instant::now();
        Ok(())
    }

    /// Enqueue a MANUAL_BY_TOPIC assertion for one specific local writer.
    pub fn assert_liveliness_by_topic(&mut self, writer_guid: Guid) -> crate::error::Result<()> {
        let mut key = self.participant_message_key(AssertionKind::ManualByTopic);
        key.extend_from_slice(&writer_guid.entity_id.0);
        self.writer.write(key, Vec::new())?;
        self.last_topic_assertion.insert(writer_guid, Instant::now());
        Ok(())
    }

    /// `true` once `min_lease_duration / 2` has elapsed since the last
    /// MANUAL_BY_PARTICIPANT assertion — the schedule named in RTPS
    /// §8.4.13.2 for when the next assertion must go out.
    pub fn participant_assertion_due(&self, min_lease_duration: Duration) -> bool {
        Instant::now() >= self.last_participant_assertion + min_lease_duration / 2
    }

    pub fn topic_assertion_due(&self, writer_guid: Guid, min_lease_duration: Duration) -> bool {
        match self.last_topic_assertion.get(&writer_guid) {
            Some(last) => Instant::now() >= *last + min_lease_duration / 2,
            None => true,
        }
    }

    pub fn matched_participant_add(&mut self, remote_writer_guid: Guid, remote_reader_guid: Guid, lease_duration: Duration) {
        self.reader.matched_writer_add(remote_writer_guid, lease_duration);
        self.writer
            .matched_reader_add(crate::writer::ReaderProxy::new(remote_reader_guid, crate::qos::Reliability::Reliable));
    }

    pub fn matched_participant_remove(&mut self, remote_writer_guid: Guid) {
        self.reader.matched_writer_remove(remote_writer_guid);
    }

    pub fn changes_to_send(&self) -> impl Iterator<Item = &crate::history::CacheChange> {
        self.reader.iter_changes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityId;

    fn guid(prefix: u8, key: [u8; 4]) -> Guid {
        Guid::new(GuidPrefix::new([prefix; 12]), EntityId::new(key))
    }

    fn new_wlp() -> Wlp {
        Wlp::new(
            GuidPrefix::new([1u8; 12]),
            guid(1, [0, 2, 0, 0xc2]),
            guid(1, [0, 2, 0, 0xc7]),
        )
    }

    #[test]
    fn participant_assertion_due_after_half_the_lease_elapses() {
        let wlp = new_wlp();
        assert!(!wlp.participant_assertion_due(Duration::from_secs(20)));
        assert!(wlp.participant_assertion_due(Duration::from_millis(0)));
    }

    #[test]
    fn asserting_by_participant_resets_the_due_timer() {
        let mut wlp = new_wlp();
        wlp.assert_liveliness_by_participant().unwrap();
        assert!(!wlp.participant_assertion_due(Duration::from_secs(20)));
    }

    #[test]
    fn topic_assertion_is_tracked_per_writer() {
        let mut wlp = new_wlp();
        let w = guid(2, [0, 0, 1, 2]);
        assert!(wlp.topic_assertion_due(w, Duration::from_secs(20)));
        wlp.assert_liveliness_by_topic(w).unwrap();
        assert!(!wlp.topic_assertion_due(w, Duration::from_secs(20)));
    }
}
