// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fragment reassembly (RTPS §8.4.14.1.1): a `FragmentedChangePitStop` holds
//! the in-progress bytes of one change until every fragment has arrived,
//! keyed by `(writer_guid, sequence_number)` so concurrent fragmented
//! changes from different writers (or different samples) never collide.

use crate::types::{Guid, SequenceNumber};
use std::collections::HashMap;

struct InFlight {
    sample_size: u32,
    fragment_size: u16,
    buffer: Vec<u8>,
    received: Vec<bool>,
}

impl InFlight {
    fn new(sample_size: u32, fragment_size: u16) -> Self {
        let total = total_fragments(sample_size, fragment_size);
        Self {
            sample_size,
            fragment_size,
            buffer: vec![0u8; sample_size as usize],
            received: vec![false; total as usize],
        }
    }

    fn total_fragments(&self) -> u32 {
        total_fragments(self.sample_size, self.fragment_size)
    }

    fn is_complete(&self) -> bool {
        self.received.iter().all(|r| *r)
    }

    fn missing_fragments(&self) -> Vec<u32> {
        self.received
            .iter()
            .enumerate()
            .filter(|(_, r)| !**r)
            .map(|(i, _)| i as u32 + 1)
            .collect()
    }
}

fn total_fragments(sample_size: u32, fragment_size: u16) -> u32 {
    if fragment_size == 0 {
        0
    } else {
        sample_size.div_ceil(fragment_size as u32)
    }
}

/// Reassembles DATA_FRAG submessages into complete sample payloads.
#[derive(Default)]
pub struct FragmentedChangePitStop {
    in_flight: HashMap<(Guid, i64), InFlight>,
}

impl FragmentedChangePitStop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one DATA_FRAG's worth of bytes in. `fragment_starting_num` is
    /// 1-based; `payload` must cover exactly `fragments_in_submessage`
    /// fragments (the last one may be shorter than `fragment_size` to
    /// cover the sample's tail).
    pub fn add_fragment(
        &mut self,
        writer_guid: Guid,
        sn: SequenceNumber,
        fragment_starting_num: u32,
        fragments_in_submessage: u16,
        fragment_size: u16,
        sample_size: u32,
        payload: &[u8],
    ) {
        let entry = self
            .in_flight
            .entry((writer_guid, sn.0))
            .or_insert_with(|| InFlight::new(sample_size, fragment_size));

        let mut offset = 0usize;
        for i in 0..fragments_in_submessage as u32 {
            let fragment_index = fragment_starting_num + i;
            let byte_start = (fragment_index - 1) as usize * fragment_size as usize;
            let byte_end = (byte_start + fragment_size as usize).min(entry.buffer.len());
            if byte_start >= entry.buffer.len() {
                break;
            }
            let len = byte_end - byte_start;
            if offset + len > payload.len() {
                break;
            }
            entry.buffer[byte_start..byte_end].copy_from_slice(&payload[offset..offset + len]);
            if let Some(slot) = entry.received.get_mut((fragment_index - 1) as usize) {
                *slot = true;
            }
            offset += len;
        }
    }

    /// If every fragment for `(writer_guid, sn)` has arrived, remove and
    /// return the complete payload.
    pub fn take_if_complete(&mut self, writer_guid: Guid, sn: SequenceNumber) -> Option<Vec<u8>> {
        let key = (writer_guid, sn.0);
        if self.in_flight.get(&key)?.is_complete() {
            self.in_flight.remove(&key).map(|f| f.buffer)
        } else {
            None
        }
    }

    /// Fragment numbers still missing for `(writer_guid, sn)`, for building
    /// a NACKFRAG. Empty (and `None` overall) if unknown or already complete.
    pub fn missing_fragments(&self, writer_guid: Guid, sn: SequenceNumber) -> Option<Vec<u32>> {
        self.in_flight.get(&(writer_guid, sn.0)).map(|f| f.missing_fragments())
    }

    pub fn total_fragments(&self, writer_guid: Guid, sn: SequenceNumber) -> Option<u32> {
        self.in_flight.get(&(writer_guid, sn.0)).map(|f| f.total_fragments())
    }

    /// Drop any in-progress reassembly for `(writer_guid, sn)` — used when
    /// a GAP declares the change irrelevant.
    pub fn discard(&mut self, writer_guid: Guid, sn: SequenceNumber) {
        self.in_flight.remove(&(writer_guid, sn.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityId, GuidPrefix};

    fn writer_guid() -> Guid {
        Guid::new(GuidPrefix::new([9u8; 12]), EntityId::new([0, 0, 1, 2]))
    }

    #[test]
    fn reassembles_sample_delivered_in_two_fragments() {
        let mut pit = FragmentedChangePitStop::new();
        let sn = SequenceNumber::new(1);
        pit.add_fragment(writer_guid(), sn, 1, 1, 4, 8, &[1, 2, 3, 4]);
        assert!(pit.take_if_complete(writer_guid(), sn).is_none());
        pit.add_fragment(writer_guid(), sn, 2, 1, 4, 8, &[5, 6, 7, 8]);

        let complete = pit.take_if_complete(writer_guid(), sn).unwrap();
        assert_eq!(complete, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn missing_fragments_reports_gaps_until_reassembly_completes() {
        let mut pit = FragmentedChangePitStop::new();
        let sn = SequenceNumber::new(1);
        pit.add_fragment(writer_guid(), sn, 1, 1, 4, 12, &[1, 2, 3, 4]);
        pit.add_fragment(writer_guid(), sn, 3, 1, 4, 12, &[9, 10, 11, 12]);

        assert_eq!(pit.missing_fragments(writer_guid(), sn), Some(vec![2]));
    }

    #[test]
    fn discard_removes_in_progress_reassembly() {
        let mut pit = FragmentedChangePitStop::new();
        let sn = SequenceNumber::new(1);
        pit.add_fragment(writer_guid(), sn, 1, 1, 4, 8, &[1, 2, 3, 4]);
        pit.discard(writer_guid(), sn);
        assert!(pit.missing_fragments(writer_guid(), sn).is_none());
    }
}
