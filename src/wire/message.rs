// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Whole-message assembly and parsing (RTPS §9.4): a message is a 20-byte
//! header followed by a sequence of `{ submessage_header, body }` pairs.
//! INFO_SRC/INFO_DST/INFO_TS mutate the interpretation context of the
//! submessages that follow them within the same message.

use crate::types::GuidPrefix;
use crate::wire::acknack::{AckNackMsg, NackFragMsg};
use crate::wire::cdr::{CdrResult, Cursor, CursorMut, Endianness};
use crate::wire::data::{DataFragMsg, DataMsg};
use crate::wire::gap::GapMsg;
use crate::wire::header::{RtpsHeader, SubmessageHeader, SubmessageKind, RTPS_HEADER_LEN, SUBMESSAGE_HEADER_LEN};
use crate::wire::heartbeat::{HeartbeatFragMsg, HeartbeatMsg};
use crate::wire::info::{InfoDstMsg, InfoSrcMsg, InfoTsMsg};

/// One parsed submessage together with the ambient context (apparent
/// source GuidPrefix, destination GuidPrefix, and timestamp) established by
/// any INFO_* submessages that preceded it in the same message.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextualSubmessage {
    pub source_guid_prefix: GuidPrefix,
    pub dest_guid_prefix: Option<GuidPrefix>,
    pub timestamp: Option<(i32, u32)>,
    pub body: SubmessageBody,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmessageBody {
    Data(DataMsg),
    DataFrag(DataFragMsg),
    Heartbeat(HeartbeatMsg),
    HeartbeatFrag(HeartbeatFragMsg),
    AckNack(AckNackMsg),
    NackFrag(NackFragMsg),
    Gap(GapMsg),
    InfoTs(InfoTsMsg),
    InfoSrc(InfoSrcMsg),
    InfoDst(InfoDstMsg),
    Pad,
    /// A recognized-but-out-of-scope or vendor-specific submessage kind;
    /// carried so callers can skip it without losing message framing.
    Unrecognized(SubmessageKind),
}

/// A fully parsed RTPS message: the header plus the contextualized body of
/// each submessage that parsed successfully.
#[derive(Clone, Debug, PartialEq)]
pub struct RtpsMessage {
    pub header: RtpsHeader,
    pub submessages: Vec<ContextualSubmessage>,
}

impl RtpsMessage {
    pub fn new(guid_prefix: GuidPrefix) -> Self {
        Self {
            header: RtpsHeader::new(guid_prefix),
            submessages: Vec::new(),
        }
    }

    /// Parse a complete datagram. Per §4.1 failure semantics: a bad header
    /// fails the whole message; a submessage whose own header is malformed
    /// or whose declared length runs past the buffer truncates parsing at
    /// that point but returns everything parsed before it, rather than
    /// discarding the whole message.
    pub fn parse(buf: &[u8]) -> CdrResult<Self> {
        let header = RtpsHeader::parse(buf)?;
        let mut submessages = Vec::new();

        let mut source_guid_prefix = header.guid_prefix;
        let mut dest_guid_prefix: Option<GuidPrefix> = None;
        let mut timestamp: Option<(i32, u32)> = None;
        let mut offset = RTPS_HEADER_LEN;

        while offset + SUBMESSAGE_HEADER_LEN <= buf.len() {
            let sm_header = match SubmessageHeader::parse(&buf[offset..]) {
                Ok(h) => h,
                Err(_) => break,
            };
            let body_start = offset + SUBMESSAGE_HEADER_LEN;
            let body_len = if sm_header.length == 0 {
                // Last submessage in the message: extends to the end.
                buf.len().saturating_sub(body_start)
            } else {
                sm_header.length as usize
            };
            if body_start + body_len > buf.len() {
                // Declared length overruns the datagram: stop, keep what we have.
                break;
            }
            let body_buf = &buf[body_start..body_start + body_len];
            let endianness = Endianness::from_flag_bit(sm_header.flags);

            match Self::parse_body(sm_header, body_buf, endianness) {
                Ok(ParsedBody::Context(ctx)) => match ctx {
                    ContextUpdate::Src(src) => {
                        source_guid_prefix = src;
                    }
                    ContextUpdate::Dst(dst) => {
                        dest_guid_prefix = Some(dst);
                    }
                    ContextUpdate::Ts(ts) => {
                        timestamp = ts;
                    }
                },
                Ok(ParsedBody::Body(body)) => {
                    submessages.push(ContextualSubmessage {
                        source_guid_prefix,
                        dest_guid_prefix,
                        timestamp,
                        body,
                    });
                }
                Err(_) => {
                    // Malformed submessage body: skip it by its declared
                    // length (already validated above) and keep parsing.
                }
            }

            offset = body_start + body_len;
            if sm_header.length == 0 {
                break;
            }
        }

        Ok(Self {
            header,
            submessages,
        })
    }

    fn parse_body(
        sm_header: SubmessageHeader,
        body_buf: &[u8],
        endianness: Endianness,
    ) -> CdrResult<ParsedBody> {
        let mut r = Cursor::new(body_buf, endianness);
        let body = match sm_header.kind {
            SubmessageKind::Pad => ParsedBody::Body(SubmessageBody::Pad),
            SubmessageKind::Data => ParsedBody::Body(SubmessageBody::Data(DataMsg::decode(&mut r, sm_header.flags)?)),
            SubmessageKind::DataFrag => {
                ParsedBody::Body(SubmessageBody::DataFrag(DataFragMsg::decode(&mut r, sm_header.flags)?))
            }
            SubmessageKind::Heartbeat => {
                ParsedBody::Body(SubmessageBody::Heartbeat(HeartbeatMsg::decode(&mut r, sm_header.flags)?))
            }
            SubmessageKind::HeartbeatFrag => {
                ParsedBody::Body(SubmessageBody::HeartbeatFrag(HeartbeatFragMsg::decode(&mut r)?))
            }
            SubmessageKind::AckNack => {
                ParsedBody::Body(SubmessageBody::AckNack(AckNackMsg::decode(&mut r, sm_header.flags)?))
            }
            SubmessageKind::NackFrag => ParsedBody::Body(SubmessageBody::NackFrag(NackFragMsg::decode(&mut r)?)),
            SubmessageKind::Gap => ParsedBody::Body(SubmessageBody::Gap(GapMsg::decode(&mut r)?)),
            SubmessageKind::InfoTs => {
                ParsedBody::Context(ContextUpdate::Ts(match InfoTsMsg::decode(&mut r, sm_header.flags)? {
                    InfoTsMsg::Timestamp { seconds, fraction } => Some((seconds, fraction)),
                    InfoTsMsg::Invalidate => None,
                }))
            }
            SubmessageKind::InfoSrc => {
                let info = InfoSrcMsg::decode(&mut r)?;
                ParsedBody::Context(ContextUpdate::Src(info.guid_prefix))
            }
            SubmessageKind::InfoDst => {
                let info = InfoDstMsg::decode(&mut r)?;
                ParsedBody::Context(ContextUpdate::Dst(info.guid_prefix))
            }
            other => ParsedBody::Body(SubmessageBody::Unrecognized(other)),
        };
        Ok(body)
    }

    /// Encode the header followed by each provided `(submessage header,
    /// pre-encoded body bytes)` pair. Callers build bodies with the wire
    /// types directly; this just frames and concatenates them.
    pub fn encode(&self, bodies: &[(SubmessageHeader, Vec<u8>)]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.header.encode());
        for (header, body) in bodies {
            let mut h = *header;
            h.length = body.len() as u16;
            out.extend_from_slice(&h.encode());
            out.extend_from_slice(body);
        }
        out
    }
}

enum ParsedBody {
    Context(ContextUpdate),
    Body(SubmessageBody),
}

enum ContextUpdate {
    Src(GuidPrefix),
    Dst(GuidPrefix),
    Ts(Option<(i32, u32)>),
}

/// Encode a single submessage body with a freshly-built header whose
/// endianness flag is taken from `endianness`.
pub fn frame_submessage(kind: SubmessageKind, endianness: Endianness, body: Vec<u8>) -> (SubmessageHeader, Vec<u8>) {
    let header = SubmessageHeader {
        kind,
        flags: endianness.flag_bit(),
        length: body.len() as u16,
    };
    (header, body)
}

/// Build the INFO_SRC body announcing `(version, vendor_id, guid_prefix)`.
pub fn info_src_body(endianness: Endianness, info: InfoSrcMsg) -> CdrResult<Vec<u8>> {
    let mut w = CursorMut::new(endianness);
    info.encode(&mut w)?;
    Ok(w.into_bytes())
}

/// Build the INFO_DST body targeting `guid_prefix`.
pub fn info_dst_body(endianness: Endianness, guid_prefix: GuidPrefix) -> CdrResult<Vec<u8>> {
    let mut w = CursorMut::new(endianness);
    InfoDstMsg { guid_prefix }.encode(&mut w)?;
    Ok(w.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityId, SequenceNumber};
    use crate::wire::cdr::CursorMut;

    fn sample_data_submessage(endianness: Endianness) -> (SubmessageHeader, Vec<u8>) {
        let msg = DataMsg {
            reader_id: EntityId::new([0; 4]),
            writer_id: EntityId::new([0, 0, 1, 2]),
            writer_sn: SequenceNumber::new(1),
            inline_qos: None,
            serialized_payload: Some(crate::wire::data::SerializedPayload {
                encapsulation: crate::wire::data::Encapsulation::for_endianness(endianness, false),
                data: vec![1, 2, 3, 4],
            }),
            serialized_key: None,
        };
        let mut w = CursorMut::new(endianness);
        msg.encode(&mut w).unwrap();
        let flags = msg.flags(endianness);
        (
            SubmessageHeader {
                kind: SubmessageKind::Data,
                flags,
                length: 0,
            },
            w.into_bytes(),
        )
    }

    #[test]
    fn round_trips_a_message_with_info_dst_then_data() {
        let guid_prefix = GuidPrefix::new([1u8; 12]);
        let msg = RtpsMessage::new(guid_prefix);
        let dst_prefix = GuidPrefix::new([2u8; 12]);

        let info_dst = frame_submessage(
            SubmessageKind::InfoDst,
            Endianness::Little,
            info_dst_body(Endianness::Little, dst_prefix).unwrap(),
        );
        let data = sample_data_submessage(Endianness::Little);

        let bytes = msg.encode(&[info_dst, data]);
        let parsed = RtpsMessage::parse(&bytes).unwrap();

        assert_eq!(parsed.header.guid_prefix, guid_prefix);
        assert_eq!(parsed.submessages.len(), 1);
        assert_eq!(parsed.submessages[0].dest_guid_prefix, Some(dst_prefix));
        assert!(matches!(parsed.submessages[0].body, SubmessageBody::Data(_)));
    }

    #[test]
    fn last_submessage_length_zero_extends_to_buffer_end() {
        let guid_prefix = GuidPrefix::new([3u8; 12]);
        let msg = RtpsMessage::new(guid_prefix);
        let (mut header, body) = sample_data_submessage(Endianness::Big);
        header.length = 0;
        let bytes = msg.encode(&[(header, body)]);

        let parsed = RtpsMessage::parse(&bytes).unwrap();
        assert_eq!(parsed.submessages.len(), 1);
    }

    #[test]
    fn truncated_submessage_stops_parsing_without_failing_whole_message() {
        let guid_prefix = GuidPrefix::new([4u8; 12]);
        let msg = RtpsMessage::new(guid_prefix);
        let (mut header, body) = sample_data_submessage(Endianness::Little);
        header.length = 9000; // overruns whatever buffer we give it
        let mut bytes = msg.encode(&[(header, body)]);
        bytes.truncate(bytes.len() - 2); // also physically truncate

        let parsed = RtpsMessage::parse(&bytes).unwrap();
        assert!(parsed.submessages.is_empty());
    }

    #[test]
    fn bad_header_fails_the_whole_message() {
        let mut bytes = RtpsMessage::new(GuidPrefix::UNKNOWN).encode(&[]);
        bytes[0] = b'X';
        assert!(RtpsMessage::parse(&bytes).is_err());
    }
}
