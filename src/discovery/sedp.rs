// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simple Endpoint Discovery Protocol (RTPS §8.5.4): two stateful
//! writer/reader pairs per participant, exchanging `WriterProxyData` and
//! `ReaderProxyData` over the metatraffic unicast channel.

use crate::discovery::endpoint_data::{ReaderProxyData, WriterProxyData};
use crate::qos::Qos;
use crate::reader::StatefulReader;
use crate::types::Guid;
use crate::writer::reader_proxy::ReaderProxy;
use crate::writer::StatefulWriter;
use std::collections::HashMap;

/// One SEDP direction (publications or subscriptions) bundles the local
/// announcing writer with the local discovering reader.
struct SedpChannel<T> {
    writer: StatefulWriter,
    reader: StatefulReader,
    discovered: HashMap<Guid, T>,
}

impl<T> SedpChannel<T> {
    fn new(writer_guid: Guid, reader_guid: Guid) -> Self {
        Self {
            writer: StatefulWriter::new(writer_guid, Qos::default()),
            reader: StatefulReader::new(reader_guid, Qos::default()),
            discovered: HashMap::new(),
        }
    }
}

/// Drives SEDP for one local Participant: a publications channel
/// (announces local DataWriters, discovers remote ones) and a
/// subscriptions channel (the mirror, for DataReaders).
pub struct Sedp {
    publications: SedpChannel<WriterProxyData>,
    subscriptions: SedpChannel<ReaderProxyData>,
}

impl Sedp {
    pub fn new(
        publications_writer_guid: Guid,
        publications_reader_guid: Guid,
        subscriptions_writer_guid: Guid,
        subscriptions_reader_guid: Guid,
    ) -> Self {
        Self {
            publications: SedpChannel::new(publications_writer_guid, publications_reader_guid),
            subscriptions: SedpChannel::new(subscriptions_writer_guid, subscriptions_reader_guid),
        }
    }

    /// Connect a newly-discovered remote participant's SEDP endpoints to
    /// ours — called once PDP reports a matching peer (RTPS §8.5.4.1).
    pub fn matched_participant_add(
        &mut self,
        remote_publications_writer: Guid,
        remote_publications_reader: Guid,
        remote_subscriptions_writer: Guid,
        remote_subscriptions_reader: Guid,
    ) {
        self.publications
            .reader
            .matched_writer_add(remote_publications_writer, crate::config::constants::SPDP_DEFAULT_LEASE_DURATION);
        self.publications
            .writer
            .matched_reader_add(ReaderProxy::new(remote_publications_reader, crate::qos::Reliability::Reliable));
        self.subscriptions
            .reader
            .matched_writer_add(remote_subscriptions_writer, crate::config::constants::SPDP_DEFAULT_LEASE_DURATION);
        self.subscriptions
            .writer
            .matched_reader_add(ReaderProxy::new(remote_subscriptions_reader, crate::qos::Reliability::Reliable));
    }

    pub fn matched_participant_remove(&mut self, remote_publications_writer: Guid, remote_subscriptions_writer: Guid) {
        self.publications.reader.matched_writer_remove(remote_publications_writer);
        self.subscriptions.reader.matched_writer_remove(remote_subscriptions_writer);
    }

    /// Announce a local DataWriter: enqueue its proxy data on the
    /// publications writer for delivery to every matched remote participant.
    pub fn announce_writer(&mut self, proxy: WriterProxyData, serialized: Vec<u8>) -> crate::error::Result<()> {
        self.publications.writer.write(proxy.guid.as_bytes().to_vec(), serialized)?;
        Ok(())
    }

    pub fn announce_reader(&mut self, proxy: ReaderProxyData, serialized: Vec<u8>) -> crate::error::Result<()> {
        self.subscriptions.writer.write(proxy.guid.as_bytes().to_vec(), serialized)?;
        Ok(())
    }

    /// Admit a decoded remote `WriterProxyData` DATA(w) sample.
    pub fn receive_writer_data(&mut self, proxy: WriterProxyData) {
        self.publications.discovered.insert(proxy.guid, proxy);
    }

    /// Admit a decoded remote `ReaderProxyData` DATA(r) sample.
    pub fn receive_reader_data(&mut self, proxy: ReaderProxyData) {
        self.subscriptions.discovered.insert(proxy.guid, proxy);
    }

    /// A DATA(w)-dispose or matched-participant removal retires a remote
    /// writer announcement (RTPS §8.5.4.1 endpoint deletion).
    pub fn forget_writer(&mut self, guid: Guid) -> Option<WriterProxyData> {
        self.publications.discovered.remove(&guid)
    }

    pub fn forget_reader(&mut self, guid: Guid) -> Option<ReaderProxyData> {
        self.subscriptions.discovered.remove(&guid)
    }

    pub fn discovered_writers(&self) -> impl Iterator<Item = &WriterProxyData> {
        self.publications.discovered.values()
    }

    pub fn discovered_readers(&self) -> impl Iterator<Item = &ReaderProxyData> {
        self.subscriptions.discovered.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::endpoint_data::QosSnapshot;
    use crate::types::{EntityId, GuidPrefix};

    fn guid(prefix: u8, key: [u8; 4]) -> Guid {
        Guid::new(GuidPrefix::new([prefix; 12]), EntityId::new(key))
    }

    fn sedp() -> Sedp {
        Sedp::new(
            guid(1, [0, 0, 3, 0xc2]),
            guid(1, [0, 0, 3, 0xc7]),
            guid(1, [0, 0, 4, 0xc2]),
            guid(1, [0, 0, 4, 0xc7]),
        )
    }

    fn writer_proxy(guid: Guid) -> WriterProxyData {
        WriterProxyData {
            guid,
            topic_name: "Square".into(),
            type_name: "ShapeType".into(),
            qos: QosSnapshot::from(&Qos::default()),
            unicast_locators: vec![],
            multicast_locators: vec![],
        }
    }

    #[test]
    fn receiving_remote_writer_data_makes_it_discoverable() {
        let mut s = sedp();
        let remote = guid(9, [0, 0, 1, 2]);
        s.receive_writer_data(writer_proxy(remote));
        assert_eq!(s.discovered_writers().count(), 1);
    }

    #[test]
    fn forgetting_a_writer_removes_it() {
        let mut s = sedp();
        let remote = guid(9, [0, 0, 1, 2]);
        s.receive_writer_data(writer_proxy(remote));
        assert!(s.forget_writer(remote).is_some());
        assert_eq!(s.discovered_writers().count(), 0);
    }
}
