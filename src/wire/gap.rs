// SPDX-License-Identifier: Apache-2.0 OR MIT

//! GAP submessage (RTPS §9.4.5.5): tells a reader that a range of sequence
//! numbers will never be sent, either because they were irrelevant to it or
//! because the writer has already disposed of them.

use crate::types::{EntityId, SequenceNumber};
use crate::wire::acknack::SequenceNumberSet;
use crate::wire::cdr::{CdrResult, Cursor, CursorMut};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GapMsg {
    pub reader_id: EntityId,
    pub writer_id: EntityId,
    /// First sequence number still potentially relevant; everything before
    /// it is unconditionally gone.
    pub gap_start: SequenceNumber,
    /// Additional individual sequence numbers, at or after `gap_start`,
    /// that are also gone.
    pub gap_list: SequenceNumberSet,
}

impl GapMsg {
    pub fn encode(&self, w: &mut CursorMut) -> CdrResult<()> {
        w.write_bytes(&self.reader_id.0)?;
        w.write_bytes(&self.writer_id.0)?;
        let (hi, lo) = self.gap_start.to_high_low();
        w.write_i32(hi)?;
        w.write_u32(lo)?;
        self.gap_list.encode(w)?;
        Ok(())
    }

    pub fn decode(r: &mut Cursor) -> CdrResult<Self> {
        let reader_id = EntityId::new(r.read_bytes(4)?.try_into().unwrap());
        let writer_id = EntityId::new(r.read_bytes(4)?.try_into().unwrap());
        let hi = r.read_i32()?;
        let lo = r.read_u32()?;
        let gap_list = SequenceNumberSet::decode(r)?;
        Ok(Self {
            reader_id,
            writer_id,
            gap_start: SequenceNumber::from_high_low(hi, lo),
            gap_list,
        })
    }

    /// Every sequence number this GAP irrevocably removes: `gap_start` up to
    /// (but not including) the base of `gap_list`, plus whatever `gap_list`
    /// itself marks.
    pub fn irrelevant_sequence_numbers(&self) -> Vec<SequenceNumber> {
        let mut out = Vec::new();
        let mut sn = self.gap_start;
        while sn < self.gap_list.base() {
            out.push(sn);
            sn = sn + 1;
        }
        out.extend(self.gap_list.iter());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::cdr::Endianness;

    #[test]
    fn gap_round_trips() {
        let mut list = SequenceNumberSet::empty(SequenceNumber::new(10));
        list.set(SequenceNumber::new(10));
        let gap = GapMsg {
            reader_id: EntityId::new([0; 4]),
            writer_id: EntityId::new([0, 0, 1, 2]),
            gap_start: SequenceNumber::new(5),
            gap_list: list,
        };
        let mut w = CursorMut::new(Endianness::Little);
        gap.encode(&mut w).unwrap();
        let bytes = w.into_bytes();
        let mut r = Cursor::new(&bytes, Endianness::Little);
        assert_eq!(GapMsg::decode(&mut r).unwrap(), gap);
    }

    #[test]
    fn irrelevant_range_covers_start_through_list() {
        let mut list = SequenceNumberSet::empty(SequenceNumber::new(10));
        list.set(SequenceNumber::new(10));
        list.set(SequenceNumber::new(12));
        let gap = GapMsg {
            reader_id: EntityId::new([0; 4]),
            writer_id: EntityId::new([0, 0, 1, 2]),
            gap_start: SequenceNumber::new(5),
            gap_list: list,
        };
        let got = gap.irrelevant_sequence_numbers();
        assert_eq!(
            got,
            vec![5, 6, 7, 8, 9, 10, 12]
                .into_iter()
                .map(SequenceNumber::new)
                .collect::<Vec<_>>()
        );
    }
}
