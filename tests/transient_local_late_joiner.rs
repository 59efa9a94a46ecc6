// SPDX-License-Identifier: Apache-2.0 OR MIT

//! S4 — a reader that matches a writer after samples were already written
//! sees the writer's entire retained history as UNSENT (TRANSIENT_LOCAL
//! durability semantics), rather than only samples written after match.

use rtps_core::qos::{Durability, Qos, Reliability};
use rtps_core::types::{EntityId, Guid, GuidPrefix, SequenceNumber};
use rtps_core::writer::{ReaderProxy, StatefulWriter};

fn writer_guid() -> Guid {
    Guid::new(GuidPrefix::new([5u8; 12]), EntityId::new([0, 0, 1, 2]))
}

fn late_reader_guid() -> Guid {
    Guid::new(GuidPrefix::new([6u8; 12]), EntityId::new([0, 0, 1, 7]))
}

#[test]
fn late_joining_reader_receives_the_writers_full_retained_history_as_unsent() {
    let mut qos = Qos::default();
    qos.durability = Durability::TransientLocal;
    let mut writer = StatefulWriter::new(writer_guid(), qos);
    writer.write(vec![1], vec![0xAA]).unwrap();
    writer.write(vec![2], vec![0xBB]).unwrap();
    writer.write(vec![3], vec![0xCC]).unwrap();

    // Reader matches only now, well after the writes above.
    writer.matched_reader_add(ReaderProxy::new(late_reader_guid(), Reliability::Reliable));

    let to_send = writer.changes_to_send(late_reader_guid());
    assert_eq!(
        to_send,
        vec![SequenceNumber::new(1), SequenceNumber::new(2), SequenceNumber::new(3)]
    );
}

#[test]
fn volatile_late_joining_reader_does_not_receive_retained_history() {
    // VOLATILE (the default) is scoped to future writes only: a reader
    // matching after the fact sees nothing retroactive.
    let writer_qos = Qos::default();
    let mut writer = StatefulWriter::new(writer_guid(), writer_qos);
    writer.write(vec![1], vec![0xAA]).unwrap();
    writer.write(vec![2], vec![0xBB]).unwrap();

    writer.matched_reader_add(ReaderProxy::new(late_reader_guid(), Reliability::Reliable));
    assert!(writer.changes_to_send(late_reader_guid()).is_empty());

    writer.write(vec![3], vec![0xCC]).unwrap();
    assert_eq!(writer.changes_to_send(late_reader_guid()), vec![SequenceNumber::new(3)]);
}
