// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wire-level integration: an INFO_TS submessage followed by a DATA
//! submessage survives a full `RtpsMessage` encode/parse round trip, with
//! the timestamp context correctly attached to the DATA that follows it.

use rtps_core::types::{EntityId, GuidPrefix, SequenceNumber};
use rtps_core::wire::cdr::CursorMut;
use rtps_core::wire::data::{Encapsulation, SerializedPayload};
use rtps_core::wire::header::SubmessageKind;
use rtps_core::wire::{DataMsg, Endianness, InfoTsMsg, RtpsMessage, SubmessageBody};

fn data_submessage(endianness: Endianness) -> (rtps_core::wire::header::SubmessageHeader, Vec<u8>) {
    let msg = DataMsg {
        reader_id: EntityId::new([0, 0, 1, 7]),
        writer_id: EntityId::new([0, 0, 1, 2]),
        writer_sn: SequenceNumber::new(1),
        inline_qos: None,
        serialized_payload: Some(SerializedPayload {
            encapsulation: Encapsulation::for_endianness(endianness, false),
            data: vec![0xDE, 0xAD, 0xBE, 0xEF],
        }),
        serialized_key: None,
    };
    let mut w = CursorMut::new(endianness);
    msg.encode(&mut w).unwrap();
    let flags = msg.flags(endianness);
    (
        rtps_core::wire::header::SubmessageHeader {
            kind: SubmessageKind::Data,
            flags,
            length: 0,
        },
        w.into_bytes(),
    )
}

fn info_ts_submessage(endianness: Endianness, ts: InfoTsMsg) -> (rtps_core::wire::header::SubmessageHeader, Vec<u8>) {
    let mut w = CursorMut::new(endianness);
    ts.encode(&mut w).unwrap();
    let body = w.into_bytes();
    (
        rtps_core::wire::header::SubmessageHeader {
            kind: SubmessageKind::InfoTs,
            flags: endianness.flag_bit() | ts.flags(),
            length: 0,
        },
        body,
    )
}

#[test]
fn info_ts_context_attaches_to_the_data_submessage_that_follows_it() {
    let guid_prefix = GuidPrefix::new([9u8; 12]);
    let message = RtpsMessage::new(guid_prefix);

    let ts = InfoTsMsg::Timestamp {
        seconds: 1_700_000_000,
        fraction: 0,
    };
    let info_ts = info_ts_submessage(Endianness::Little, ts);
    let data = data_submessage(Endianness::Little);

    let bytes = message.encode(&[info_ts, data]);
    let parsed = RtpsMessage::parse(&bytes).expect("a well-formed message must parse");

    assert_eq!(parsed.header.guid_prefix, guid_prefix);
    assert_eq!(parsed.submessages.len(), 1);
    assert_eq!(parsed.submessages[0].timestamp, Some((1_700_000_000, 0)));
    match &parsed.submessages[0].body {
        SubmessageBody::Data(data) => {
            assert_eq!(data.writer_sn, SequenceNumber::new(1));
            assert_eq!(
                data.serialized_payload.as_ref().unwrap().data,
                vec![0xDE, 0xAD, 0xBE, 0xEF]
            );
        }
        other => panic!("expected a DATA submessage, got {other:?}"),
    }
}

#[test]
fn a_second_info_ts_invalidate_clears_the_timestamp_context() {
    let guid_prefix = GuidPrefix::new([10u8; 12]);
    let message = RtpsMessage::new(guid_prefix);

    let set_ts = info_ts_submessage(
        Endianness::Little,
        InfoTsMsg::Timestamp {
            seconds: 42,
            fraction: 0,
        },
    );
    let clear_ts = info_ts_submessage(Endianness::Little, InfoTsMsg::Invalidate);
    let data = data_submessage(Endianness::Little);

    let bytes = message.encode(&[set_ts, clear_ts, data]);
    let parsed = RtpsMessage::parse(&bytes).unwrap();

    assert_eq!(parsed.submessages.len(), 1);
    assert_eq!(parsed.submessages[0].timestamp, None);
}
