// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `StatefulReader`: the reliable (or best-effort) reader state machine
//! that tracks each matched writer individually (RTPS §8.4.10).

use crate::fragment::FragmentedChangePitStop;
use crate::history::{CacheChange, ChangeKind, HistoryCache};
use crate::qos::Qos;
use crate::telemetry::ReliableMetrics;
use crate::types::{Guid, SequenceNumber};
use crate::wire::SequenceNumberSet;
use crate::reader::writer_proxy::WriterProxy;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub struct StatefulReader {
    pub guid: Guid,
    pub qos: Qos,
    history_cache: HistoryCache,
    proxies: HashMap<Guid, WriterProxy>,
    pub metrics: Arc<ReliableMetrics>,
    fragments: FragmentedChangePitStop,
}

impl StatefulReader {
    pub fn new(guid: Guid, qos: Qos) -> Self {
        let history_cache = HistoryCache::new(qos.history, qos.resource_limits);
        Self {
            guid,
            qos,
            history_cache,
            proxies: HashMap::new(),
            metrics: Arc::new(ReliableMetrics::default()),
            fragments: FragmentedChangePitStop::new(),
        }
    }

    pub fn matched_writer_add(&mut self, writer_guid: Guid, lease_duration: Duration) {
        self.proxies
            .entry(writer_guid)
            .or_insert_with(|| WriterProxy::new(writer_guid, lease_duration));
    }

    pub fn matched_writer_remove(&mut self, writer_guid: Guid) {
        self.proxies.remove(&writer_guid);
    }

    pub fn matched_writer_count(&self) -> usize {
        self.proxies.len()
    }

    /// Whether `writer_guid` is one of this reader's matched writers —
    /// callers fanning a multicast-addressed submessage out to every local
    /// reader use this to skip readers that never matched its writer.
    pub fn is_matched_writer(&self, writer_guid: Guid) -> bool {
        self.proxies.contains_key(&writer_guid)
    }

    /// Admit a DATA submessage's sample into the history cache and mark it
    /// received on the originating writer's proxy. Returns `false` without
    /// touching the history cache if `writer_guid` isn't matched, and
    /// `false` (not an error) for a duplicate from one that is — the
    /// protocol simply drops repeats.
    pub fn receive_change(
        &mut self,
        writer_guid: Guid,
        sn: SequenceNumber,
        instance_key: Vec<u8>,
        data: Vec<u8>,
    ) -> bool {
        if !self.proxies.contains_key(&writer_guid) {
            return false;
        }
        let admitted = self
            .history_cache
            .add_change(CacheChange {
                writer_guid,
                sequence_number: sn,
                kind: ChangeKind::Alive,
                instance_key,
                data,
                source_timestamp: None,
            })
            .is_ok();

        if let Some(proxy) = self.proxies.get_mut(&writer_guid) {
            if admitted {
                proxy.mark_received(sn);
            } else {
                self.metrics.record_out_of_order();
            }
        }
        admitted
    }

    pub fn receive_gap(&mut self, writer_guid: Guid, irrelevant: &[SequenceNumber]) {
        if let Some(proxy) = self.proxies.get_mut(&writer_guid) {
            self.metrics.record_gap(irrelevant.len() as u64);
            for sn in irrelevant {
                proxy.mark_lost(*sn);
                self.fragments.discard(writer_guid, *sn);
            }
        }
    }

    /// Admit one DATA_FRAG submessage's worth of bytes for `sn`. Once every
    /// fragment has arrived, the reassembled sample is admitted to the
    /// history cache exactly as [`Self::receive_change`] would and
    /// `Some(true)`/`Some(false)` is returned (duplicate-vs-admitted, same
    /// as `receive_change`). `None` while reassembly is still incomplete.
    pub fn receive_data_frag(
        &mut self,
        writer_guid: Guid,
        sn: SequenceNumber,
        instance_key: Vec<u8>,
        fragment_starting_num: u32,
        fragments_in_submessage: u16,
        fragment_size: u16,
        sample_size: u32,
        payload: &[u8],
    ) -> Option<bool> {
        if !self.proxies.contains_key(&writer_guid) {
            return None;
        }
        self.fragments.add_fragment(
            writer_guid,
            sn,
            fragment_starting_num,
            fragments_in_submessage,
            fragment_size,
            sample_size,
            payload,
        );
        let data = self.fragments.take_if_complete(writer_guid, sn)?;
        Some(self.receive_change(writer_guid, sn, instance_key, data))
    }

    /// Fragment numbers still missing for an in-progress reassembly of
    /// `(writer_guid, sn)`, for building a NACKFRAG. `None` if unknown or
    /// already complete.
    pub fn missing_fragments(&self, writer_guid: Guid, sn: SequenceNumber) -> Option<Vec<u32>> {
        self.fragments.missing_fragments(writer_guid, sn)
    }

    /// Discard any in-progress reassembly for `(writer_guid, sn)`.
    pub fn discard_fragments(&mut self, writer_guid: Guid, sn: SequenceNumber) {
        self.fragments.discard(writer_guid, sn);
    }

    pub fn receive_heartbeat(&mut self, writer_guid: Guid, first_sn: SequenceNumber, last_sn: SequenceNumber) {
        if let Some(proxy) = self.proxies.get_mut(&writer_guid) {
            proxy.apply_heartbeat(first_sn, last_sn);
        }
    }

    /// Build the ACKNACK to send back to `writer_guid`: base is one past
    /// the highest contiguous sequence number received, with the proxy's
    /// missing changes flagged in the bitmap. Returns `None` if the reader
    /// isn't tracking this writer at all.
    pub fn build_acknack(&mut self, writer_guid: Guid) -> Option<(SequenceNumberSet, u32)> {
        let proxy = self.proxies.get_mut(&writer_guid)?;
        let missing = proxy.missing_changes();
        let base = missing.first().copied().unwrap_or(SequenceNumber::new(1));
        let mut set = SequenceNumberSet::empty(base);
        for sn in &missing {
            set.set(*sn);
        }
        Some((set, proxy.next_acknack_count()))
    }

    pub fn assert_writer_liveliness(&mut self, writer_guid: Guid) {
        if let Some(proxy) = self.proxies.get_mut(&writer_guid) {
            proxy.assert_liveliness();
        }
    }

    pub fn alive_writers(&self) -> Vec<Guid> {
        self.proxies
            .values()
            .filter(|p| p.is_alive())
            .map(|p| p.remote_writer_guid)
            .collect()
    }

    pub fn iter_changes(&self) -> impl Iterator<Item = &CacheChange> {
        self.history_cache.iter()
    }
}
