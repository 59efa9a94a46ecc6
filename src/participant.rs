// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `Participant`: wires one local Domain Participant's builtin discovery
//! endpoints (SPDP, SEDP, WLP), user endpoint registries, and the timed
//! event scheduler together. Owns no socket — callers supply a
//! [`Transport`] and drive `housekeeping_tick`/message dispatch themselves.

use crate::discovery::endpoint_data::{QosSnapshot, ReaderProxyData, WriterProxyData};
use crate::discovery::matcher::{match_all, MatchOutcome};
use crate::discovery::{Pdp, Sedp};
use crate::error::{Error, Result};
use crate::qos::Qos;
use crate::reader::StatefulReader;
use crate::scheduler::TimedEventQueue;
use crate::types::guid::{
    ENTITYID_SEDP_BUILTIN_PUBLICATIONS_READER, ENTITYID_SEDP_BUILTIN_PUBLICATIONS_WRITER,
    ENTITYID_SEDP_BUILTIN_SUBSCRIPTIONS_READER, ENTITYID_SEDP_BUILTIN_SUBSCRIPTIONS_WRITER,
    ENTITYID_SPDP_BUILTIN_PARTICIPANT_READER, ENTITYID_SPDP_BUILTIN_PARTICIPANT_WRITER,
    ENTITY_KIND_USER_READER_WITH_KEY, ENTITY_KIND_USER_WRITER_WITH_KEY,
};
use crate::types::{EntityId, Guid, GuidPrefix};
use crate::writer::StatefulWriter;
use crate::wlp::Wlp;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Configuration needed to bring up one local Participant.
pub struct ParticipantConfig {
    pub domain_id: u32,
    pub participant_id: u8,
    pub guid_prefix: GuidPrefix,
}

/// One local Domain Participant: discovery state plus the user endpoints
/// it hosts. User endpoint dispatch (matching a DATA submessage's reader/
/// writer EntityId to the right `StatefulWriter`/`StatefulReader`) is the
/// registry this type exists to provide.
pub struct Participant {
    pub guid_prefix: GuidPrefix,
    pub domain_id: u32,
    pdp: Pdp,
    sedp: Sedp,
    wlp: Wlp,
    scheduler: TimedEventQueue,
    writers: HashMap<Guid, StatefulWriter>,
    readers: HashMap<Guid, StatefulReader>,
    writer_topics: HashMap<Guid, (String, String)>,
    reader_topics: HashMap<Guid, (String, String)>,
    next_entity_key: AtomicU32,
}

impl Participant {
    pub fn new(config: ParticipantConfig) -> Result<Self> {
        if config.domain_id > crate::config::constants::MAX_DOMAIN_ID {
            return Err(Error::InvalidDomainId(config.domain_id));
        }
        if config.participant_id > crate::config::constants::MAX_PARTICIPANT_ID {
            return Err(Error::InvalidParticipantId(config.participant_id));
        }

        let prefix = config.guid_prefix;
        let pdp = Pdp::new(
            prefix,
            Guid::new(prefix, ENTITYID_SPDP_BUILTIN_PARTICIPANT_WRITER),
            Guid::new(prefix, ENTITYID_SPDP_BUILTIN_PARTICIPANT_READER),
        );
        let sedp = Sedp::new(
            Guid::new(prefix, ENTITYID_SEDP_BUILTIN_PUBLICATIONS_WRITER),
            Guid::new(prefix, ENTITYID_SEDP_BUILTIN_PUBLICATIONS_READER),
            Guid::new(prefix, ENTITYID_SEDP_BUILTIN_SUBSCRIPTIONS_WRITER),
            Guid::new(prefix, ENTITYID_SEDP_BUILTIN_SUBSCRIPTIONS_READER),
        );
        let wlp = Wlp::new(
            prefix,
            Guid::new(prefix, crate::types::guid::ENTITYID_P2P_BUILTIN_PARTICIPANT_MESSAGE_WRITER),
            Guid::new(prefix, crate::types::guid::ENTITYID_P2P_BUILTIN_PARTICIPANT_MESSAGE_READER),
        );

        Ok(Self {
            guid_prefix: prefix,
            domain_id: config.domain_id,
            pdp,
            sedp,
            wlp,
            scheduler: TimedEventQueue::new(),
            writers: HashMap::new(),
            readers: HashMap::new(),
            writer_topics: HashMap::new(),
            reader_topics: HashMap::new(),
            next_entity_key: AtomicU32::new(1),
        })
    }

    fn next_entity_id(&self, kind: u8) -> EntityId {
        let key = self.next_entity_key.fetch_add(1, Ordering::Relaxed);
        let bytes = key.to_be_bytes();
        EntityId::new([bytes[1], bytes[2], bytes[3], kind])
    }

    /// Create and register a local DataWriter-backing `StatefulWriter`,
    /// returning its freshly assigned GUID. `topic_name`/`type_name` are
    /// kept so the endpoint can be announced over SEDP and matched against
    /// discovered remote readers.
    pub fn create_writer(
        &mut self,
        topic_name: impl Into<String>,
        type_name: impl Into<String>,
        qos: Qos,
    ) -> Result<Guid> {
        qos.validate()?;
        let entity_id = self.next_entity_id(ENTITY_KIND_USER_WRITER_WITH_KEY);
        let guid = Guid::new(self.guid_prefix, entity_id);
        self.writers.insert(guid, StatefulWriter::new(guid, qos));
        self.writer_topics.insert(guid, (topic_name.into(), type_name.into()));
        Ok(guid)
    }

    /// Create and register a local DataReader-backing `StatefulReader`.
    pub fn create_reader(
        &mut self,
        topic_name: impl Into<String>,
        type_name: impl Into<String>,
        qos: Qos,
    ) -> Result<Guid> {
        qos.validate()?;
        let entity_id = self.next_entity_id(ENTITY_KIND_USER_READER_WITH_KEY);
        let guid = Guid::new(self.guid_prefix, entity_id);
        self.readers.insert(guid, StatefulReader::new(guid, qos));
        self.reader_topics.insert(guid, (topic_name.into(), type_name.into()));
        Ok(guid)
    }

    fn local_writer_proxy_data(&self, guid: Guid) -> Option<WriterProxyData> {
        let (topic_name, type_name) = self.writer_topics.get(&guid)?.clone();
        let writer = self.writers.get(&guid)?;
        Some(WriterProxyData {
            guid,
            topic_name,
            type_name,
            qos: QosSnapshot::from(&writer.qos),
            unicast_locators: vec![],
            multicast_locators: vec![],
        })
    }

    fn local_reader_proxy_data(&self, guid: Guid) -> Option<ReaderProxyData> {
        let (topic_name, type_name) = self.reader_topics.get(&guid)?.clone();
        let reader = self.readers.get(&guid)?;
        Some(ReaderProxyData {
            guid,
            topic_name,
            type_name,
            qos: QosSnapshot::from(&reader.qos),
            unicast_locators: vec![],
            multicast_locators: vec![],
            expects_inline_qos: false,
        })
    }

    /// Match every local user endpoint against everything SEDP has
    /// discovered so far (RTPS §8.5.5.1), completing matches in both
    /// directions by adding the remote side as a proxy on the local
    /// `StatefulWriter`/`StatefulReader`. Idempotent: re-matching an
    /// already-matched pair just re-inserts the same proxy entry.
    pub fn match_sedp_discoveries(&mut self) {
        let local_writers: Vec<WriterProxyData> = self
            .writer_topics
            .keys()
            .filter_map(|guid| self.local_writer_proxy_data(*guid))
            .collect();
        let local_readers: Vec<ReaderProxyData> = self
            .reader_topics
            .keys()
            .filter_map(|guid| self.local_reader_proxy_data(*guid))
            .collect();
        let remote_writers: Vec<WriterProxyData> = self.sedp.discovered_writers().cloned().collect();
        let remote_readers: Vec<ReaderProxyData> = self.sedp.discovered_readers().cloned().collect();

        for (local_reader, remote_writer, outcome) in match_all(&local_readers, &remote_writers) {
            if outcome == MatchOutcome::Matched {
                if let Some(reader) = self.readers.get_mut(&local_reader.guid) {
                    reader.matched_writer_add(remote_writer.guid, remote_writer.qos.liveliness.lease_duration);
                }
            }
        }

        for (remote_reader, local_writer, outcome) in match_all(&remote_readers, &local_writers) {
            if outcome == MatchOutcome::Matched {
                if let Some(writer) = self.writers.get_mut(&local_writer.guid) {
                    writer.matched_reader_add(crate::writer::ReaderProxy::new(
                        remote_reader.guid,
                        remote_reader.qos.reliability,
                    ));
                }
            }
        }
    }

    pub fn writer(&self, guid: Guid) -> Option<&StatefulWriter> {
        self.writers.get(&guid)
    }

    pub fn writer_mut(&mut self, guid: Guid) -> Option<&mut StatefulWriter> {
        self.writers.get_mut(&guid)
    }

    pub fn reader(&self, guid: Guid) -> Option<&StatefulReader> {
        self.readers.get(&guid)
    }

    pub fn reader_mut(&mut self, guid: Guid) -> Option<&mut StatefulReader> {
        self.readers.get_mut(&guid)
    }

    /// Every local reader matched to `writer_guid` — used by the message
    /// receiver to fan a multicast-addressed (`ENTITYID_UNKNOWN`) DATA/
    /// HEARTBEAT/GAP submessage out to every reader that should see it,
    /// rather than just one.
    pub(crate) fn readers_matching_mut(&mut self, writer_guid: Guid) -> impl Iterator<Item = &mut StatefulReader> {
        self.readers.values_mut().filter(move |r| r.is_matched_writer(writer_guid))
    }

    pub fn delete_writer(&mut self, guid: Guid) -> bool {
        self.writers.remove(&guid).is_some()
    }

    pub fn delete_reader(&mut self, guid: Guid) -> bool {
        self.readers.remove(&guid).is_some()
    }

    pub fn pdp(&self) -> &Pdp {
        &self.pdp
    }

    pub fn pdp_mut(&mut self) -> &mut Pdp {
        &mut self.pdp
    }

    pub fn sedp(&self) -> &Sedp {
        &self.sedp
    }

    pub fn sedp_mut(&mut self) -> &mut Sedp {
        &mut self.sedp
    }

    pub fn wlp_mut(&mut self) -> &mut Wlp {
        &mut self.wlp
    }

    pub fn scheduler(&self) -> &TimedEventQueue {
        &self.scheduler
    }

    /// Drop every expired PDP lease, returning the dead participants'
    /// GuidPrefixes. The caller (which tracks proxy GUIDs per remote
    /// participant via SEDP) is responsible for unmatching those proxies
    /// from the affected local writers/readers.
    pub fn expire_participant_leases(&mut self) -> Vec<GuidPrefix> {
        self.pdp.expire_leases().into_iter().map(|p| p.guid_prefix).collect()
    }
}
