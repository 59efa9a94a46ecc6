// SPDX-License-Identifier: Apache-2.0 OR MIT

//! S3 — a sample too large for one DATA submessage is fragmented by a
//! `StatefulWriter`, partially reassembled by a `StatefulReader`, and the
//! missing middle fragment is recovered through a real NACKFRAG round trip
//! rather than driving `FragmentedChangePitStop` directly.

use rtps_core::qos::Qos;
use rtps_core::reader::StatefulReader;
use rtps_core::types::{EntityId, Guid, GuidPrefix, SequenceNumber};
use rtps_core::writer::{ReaderProxy, StatefulWriter};

fn writer_guid() -> Guid {
    Guid::new(GuidPrefix::new([4u8; 12]), EntityId::new([0, 0, 1, 2]))
}

fn reader_guid() -> Guid {
    Guid::new(GuidPrefix::new([8u8; 12]), EntityId::new([0, 0, 1, 7]))
}

#[test]
fn fragmented_sample_is_reassembled_after_a_missing_fragment_is_nackfragged_back() {
    let mut writer = StatefulWriter::new(writer_guid(), Qos::default());
    writer.set_fragment_size(8);
    writer.matched_reader_add(ReaderProxy::new(reader_guid(), rtps_core::qos::Reliability::Reliable));

    let sample: Vec<u8> = (0..24u8).collect();
    let sn = writer.write(vec![1], sample.clone()).unwrap();
    assert!(writer.requires_fragmentation(sn));

    let fragments = writer.fragment_change(reader_guid(), sn);
    assert_eq!(fragments.len(), 3);

    let mut reader = StatefulReader::new(reader_guid(), Qos::default());
    reader.matched_writer_add(writer_guid(), std::time::Duration::from_secs(20));

    // Fragment 2 (the middle) is lost in transit.
    for frag in [&fragments[0], &fragments[2]] {
        let result = reader.receive_data_frag(
            writer_guid(),
            sn,
            vec![1],
            frag.fragment_starting_num,
            frag.fragments_in_submessage,
            frag.fragment_size,
            frag.sample_size,
            &frag.payload,
        );
        assert_eq!(result, None);
    }
    assert_eq!(reader.missing_fragments(writer_guid(), sn), Some(vec![2]));
    assert_eq!(reader.iter_changes().count(), 0);

    // Reader requests the missing fragment via NACKFRAG; writer resends
    // only that fragment.
    let mut missing = rtps_core::wire::FragmentNumberSet::empty(SequenceNumber::new(1));
    missing.set(SequenceNumber::new(2));
    assert!(writer.receive_nackfrag(reader_guid(), sn, &missing, 1));

    let retransmitted = writer.fragments_for_nackfrag(reader_guid(), sn);
    assert_eq!(retransmitted.len(), 1);
    assert_eq!(retransmitted[0].fragment_starting_num, 2);

    let frag = &retransmitted[0];
    let result = reader.receive_data_frag(
        writer_guid(),
        sn,
        vec![1],
        frag.fragment_starting_num,
        frag.fragments_in_submessage,
        frag.fragment_size,
        frag.sample_size,
        &frag.payload,
    );
    assert_eq!(result, Some(true));
    assert_eq!(reader.iter_changes().count(), 1);
    assert_eq!(reader.iter_changes().next().unwrap().data, sample);

    writer.mark_fragments_sent(reader_guid(), sn);
    assert!(writer.requested_fragments(reader_guid(), sn).is_none());
}

#[test]
fn small_sample_is_never_fragmented_by_the_writer() {
    let mut writer = StatefulWriter::new(writer_guid(), Qos::default());
    let sn = writer.write(vec![1], vec![0xAA, 0xBB]).unwrap();
    assert!(!writer.requires_fragmentation(sn));
    assert!(writer.fragment_change(reader_guid(), sn).is_empty());
}
