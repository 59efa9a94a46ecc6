// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simple Participant Discovery Protocol (RTPS §8.5.3): a stateless
//! writer/reader pair on the metatraffic multicast locator that
//! announces and discovers `ParticipantProxyData`.

use crate::config::constants::{
    SPDP_DEFAULT_ANNOUNCEMENT_PERIOD, SPDP_INITIAL_ANNOUNCEMENT_COUNT,
    SPDP_INITIAL_ANNOUNCEMENT_PERIOD,
};
use crate::discovery::participant_data::{DiscoveredParticipant, ParticipantProxyData};
use crate::reader::StatelessReader;
use crate::types::{Guid, GuidPrefix};
use crate::writer::StatelessWriter;
use std::collections::HashMap;
use std::time::Duration;

/// Drives SPDP announce/discover for one local Participant.
pub struct Pdp {
    local_guid_prefix: GuidPrefix,
    writer: StatelessWriter,
    reader: StatelessReader,
    discovered: HashMap<GuidPrefix, DiscoveredParticipant>,
    announcements_sent: u32,
}

impl Pdp {
    pub fn new(local_guid_prefix: GuidPrefix, spdp_writer_guid: Guid, spdp_reader_guid: Guid) -> Self {
        Self {
            local_guid_prefix,
            writer: StatelessWriter::new(spdp_writer_guid),
            reader: StatelessReader::new(spdp_reader_guid),
            discovered: HashMap::new(),
            announcements_sent: 0,
        }
    }

    /// The announcement period to wait before the next `announce` call:
    /// a fast burst of `SPDP_INITIAL_ANNOUNCEMENT_COUNT` at
    /// `SPDP_INITIAL_ANNOUNCEMENT_PERIOD`, then steady-state
    /// `SPDP_DEFAULT_ANNOUNCEMENT_PERIOD` forever after.
    pub fn next_announcement_period(&self) -> Duration {
        if self.announcements_sent < SPDP_INITIAL_ANNOUNCEMENT_COUNT {
            SPDP_INITIAL_ANNOUNCEMENT_PERIOD
        } else {
            SPDP_DEFAULT_ANNOUNCEMENT_PERIOD
        }
    }

    /// Enqueue `data` (the local participant's proxy data, already
    /// serialized by the caller) for broadcast and bump the burst counter.
    pub fn announce(&mut self, serialized: Vec<u8>) -> crate::error::Result<()> {
        self.writer.write(self.local_guid_prefix.0.to_vec(), serialized)?;
        self.announcements_sent += 1;
        Ok(())
    }

    pub fn changes_to_send(&self) -> impl Iterator<Item = &crate::history::CacheChange> {
        self.writer.changes_to_send()
    }

    /// Admit a remote participant announcement: first sighting inserts a
    /// fresh lease, a repeat refreshes it (RTPS §8.5.3.3 "remote participant
    /// liveliness assertion" — any DATA(p) counts as a liveliness signal).
    pub fn receive_participant_data(&mut self, data: ParticipantProxyData) {
        self.discovered
            .entry(data.guid_prefix)
            .and_modify(|known| {
                known.data = data.clone();
                known.touch();
            })
            .or_insert_with(|| DiscoveredParticipant::new(data));
    }

    /// Drop and return every participant whose lease has expired. Called
    /// periodically by the scheduler's lease-watchdog event.
    pub fn expire_leases(&mut self) -> Vec<ParticipantProxyData> {
        let expired: Vec<GuidPrefix> = self
            .discovered
            .iter()
            .filter(|(_, p)| p.is_expired())
            .map(|(prefix, _)| *prefix)
            .collect();

        expired
            .into_iter()
            .filter_map(|prefix| self.discovered.remove(&prefix).map(|p| p.data))
            .collect()
    }

    pub fn discovered_participant(&self, prefix: GuidPrefix) -> Option<&ParticipantProxyData> {
        self.discovered.get(&prefix).map(|p| &p.data)
    }

    pub fn discovered_participants(&self) -> impl Iterator<Item = &ParticipantProxyData> {
        self.discovered.values().map(|p| &p.data)
    }

    pub fn forget_participant(&mut self, prefix: GuidPrefix) -> Option<ParticipantProxyData> {
        self.discovered.remove(&prefix).map(|p| p.data)
    }

    pub fn reader(&mut self) -> &mut StatelessReader {
        &mut self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityId, Locator, ProtocolVersion, VendorId};
    use std::net::Ipv4Addr;

    fn local_prefix() -> GuidPrefix {
        GuidPrefix::new([1u8; 12])
    }

    fn remote_data(prefix: [u8; 12], lease: Duration) -> ParticipantProxyData {
        ParticipantProxyData {
            guid_prefix: GuidPrefix::new(prefix),
            protocol_version: ProtocolVersion::V2_5,
            vendor_id: VendorId::UNKNOWN,
            domain_id: 0,
            metatraffic_unicast_locators: vec![Locator::udpv4(Ipv4Addr::new(10, 0, 0, 2), 7410)],
            metatraffic_multicast_locators: vec![],
            default_unicast_locators: vec![],
            default_multicast_locators: vec![],
            builtin_endpoints: crate::discovery::participant_data::BuiltinEndpointSet::empty(),
            lease_duration: lease,
            manual_liveliness_count: 0,
        }
    }

    fn new_pdp() -> Pdp {
        Pdp::new(
            local_prefix(),
            Guid::new(local_prefix(), EntityId::new([0, 1, 0, 0xc2])),
            Guid::new(local_prefix(), EntityId::new([0, 1, 0, 0xc7])),
        )
    }

    #[test]
    fn announcement_period_is_fast_then_slows_after_the_initial_burst() {
        let mut pdp = new_pdp();
        for _ in 0..SPDP_INITIAL_ANNOUNCEMENT_COUNT {
            assert_eq!(pdp.next_announcement_period(), SPDP_INITIAL_ANNOUNCEMENT_PERIOD);
            pdp.announce(vec![0]).unwrap();
        }
        assert_eq!(pdp.next_announcement_period(), SPDP_DEFAULT_ANNOUNCEMENT_PERIOD);
    }

    #[test]
    fn discovering_the_same_participant_twice_refreshes_rather_than_duplicates() {
        let mut pdp = new_pdp();
        pdp.receive_participant_data(remote_data([2u8; 12], Duration::from_secs(20)));
        pdp.receive_participant_data(remote_data([2u8; 12], Duration::from_secs(20)));
        assert_eq!(pdp.discovered_participants().count(), 1);
    }

    #[test]
    fn expired_leases_are_removed_and_returned() {
        let mut pdp = new_pdp();
        pdp.receive_participant_data(remote_data([3u8; 12], Duration::from_millis(1)));
        std::thread::sleep(Duration::from_millis(10));

        let expired = pdp.expire_leases();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].guid_prefix, GuidPrefix::new([3u8; 12]));
        assert_eq!(pdp.discovered_participants().count(), 0);
    }
}
