// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Message receiver: dispatches a parsed [`RtpsMessage`]'s submessages to
//! the local user endpoints a [`Participant`] hosts (RTPS §8.3.4, "the
//! actual transfer of data"). DATA/DATA_FRAG samples land in the matching
//! `StatefulReader`'s history cache, HEARTBEAT/GAP update reader-side
//! writer proxies, and ACKNACK/NACKFRAG update writer-side reader proxies.
//!
//! Builtin SPDP/SEDP/WLP traffic is still driven through
//! `Participant::pdp_mut`/`sedp_mut`/`wlp_mut` by whatever decodes those
//! announcements — this module wires up only the user data plane, the
//! `reader_id`/`writer_id` → local endpoint lookup that nothing previously
//! connected to the wire framer.

use crate::participant::Participant;
use crate::reader::StatefulReader;
use crate::types::guid::ENTITYID_UNKNOWN;
use crate::types::{EntityId, Guid, GuidPrefix};
use crate::wire::cdr::CdrResult;
use crate::wire::{ContextualSubmessage, RtpsMessage, SubmessageBody};

/// How many of a message's submessages were handed to a known local
/// endpoint versus addressed to one this participant doesn't host (a
/// builtin entity id, a stale reference, or a deleted endpoint).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub dispatched: usize,
    pub unroutable: usize,
}

/// Parse `buf` as one RTPS message and dispatch every submessage addressed
/// to one of `participant`'s user writers/readers.
pub fn receive(participant: &mut Participant, buf: &[u8]) -> CdrResult<DispatchStats> {
    let message = RtpsMessage::parse(buf)?;
    let mut stats = DispatchStats::default();
    for sm in &message.submessages {
        if dispatch_one(participant, sm) {
            stats.dispatched += 1;
        } else {
            stats.unroutable += 1;
        }
    }
    Ok(stats)
}

fn dispatch_one(participant: &mut Participant, sm: &ContextualSubmessage) -> bool {
    let local_prefix = participant.guid_prefix;
    match &sm.body {
        SubmessageBody::Data(data) => {
            let remote_writer = Guid::new(sm.source_guid_prefix, data.writer_id);
            let payload = data
                .serialized_payload
                .as_ref()
                .or(data.serialized_key.as_ref())
                .map(|p| p.data.clone())
                .unwrap_or_default();
            dispatch_to_readers(participant, local_prefix, data.reader_id, remote_writer, |reader| {
                reader.receive_change(remote_writer, data.writer_sn, Vec::new(), payload.clone());
            })
        }
        SubmessageBody::DataFrag(frag) => {
            let remote_writer = Guid::new(sm.source_guid_prefix, frag.writer_id);
            dispatch_to_readers(participant, local_prefix, frag.reader_id, remote_writer, |reader| {
                reader.receive_data_frag(
                    remote_writer,
                    frag.writer_sn,
                    Vec::new(),
                    frag.fragment_starting_num,
                    frag.fragments_in_submessage,
                    frag.fragment_size,
                    frag.sample_size,
                    &frag.payload,
                );
            })
        }
        SubmessageBody::Heartbeat(hb) => {
            let remote_writer = Guid::new(sm.source_guid_prefix, hb.writer_id);
            dispatch_to_readers(participant, local_prefix, hb.reader_id, remote_writer, |reader| {
                reader.receive_heartbeat(remote_writer, hb.first_sn, hb.last_sn);
            })
        }
        SubmessageBody::Gap(gap) => {
            let remote_writer = Guid::new(sm.source_guid_prefix, gap.writer_id);
            let mut irrelevant: Vec<_> = gap.gap_list.iter().collect();
            irrelevant.push(gap.gap_start);
            dispatch_to_readers(participant, local_prefix, gap.reader_id, remote_writer, |reader| {
                reader.receive_gap(remote_writer, &irrelevant);
            })
        }
        SubmessageBody::AckNack(ack) => {
            let remote_reader = Guid::new(sm.source_guid_prefix, ack.reader_id);
            let local_writer = Guid::new(local_prefix, ack.writer_id);
            match participant.writer_mut(local_writer) {
                Some(writer) => {
                    writer.receive_acknack(remote_reader, &ack.reader_sn_state, ack.count);
                    true
                }
                None => false,
            }
        }
        SubmessageBody::NackFrag(nackfrag) => {
            let remote_reader = Guid::new(sm.source_guid_prefix, nackfrag.reader_id);
            let local_writer = Guid::new(local_prefix, nackfrag.writer_id);
            match participant.writer_mut(local_writer) {
                Some(writer) => {
                    writer.receive_nackfrag(
                        remote_reader,
                        nackfrag.writer_sn,
                        &nackfrag.fragment_number_state,
                        nackfrag.count,
                    );
                    true
                }
                None => false,
            }
        }
        SubmessageBody::HeartbeatFrag(_)
        | SubmessageBody::InfoTs(_)
        | SubmessageBody::InfoSrc(_)
        | SubmessageBody::InfoDst(_)
        | SubmessageBody::Pad
        | SubmessageBody::Unrecognized(_) => false,
    }
}

/// Route to the single reader named by `reader_id`, or — when `reader_id`
/// is `ENTITYID_UNKNOWN` (a multicast-addressed submessage) — to every
/// local reader that has `remote_writer` matched. Returns whether at least
/// one reader received it.
fn dispatch_to_readers(
    participant: &mut Participant,
    local_prefix: GuidPrefix,
    reader_id: EntityId,
    remote_writer: Guid,
    mut action: impl FnMut(&mut StatefulReader),
) -> bool {
    if reader_id == ENTITYID_UNKNOWN {
        let mut hit = false;
        for reader in participant.readers_matching_mut(remote_writer) {
            action(reader);
            hit = true;
        }
        hit
    } else {
        match participant.reader_mut(Guid::new(local_prefix, reader_id)) {
            Some(reader) => {
                action(reader);
                true
            }
            None => false,
        }
    }
}
