// SPDX-License-Identifier: Apache-2.0 OR MIT

//! SequenceNumberSet, ACKNACK, and NACKFRAG submessages (RTPS §9.4.5.7,
//! §9.4.5.13, §9.4.5.20).

use crate::types::{EntityId, SequenceNumber};
use crate::wire::cdr::{CdrError, CdrResult, Cursor, CursorMut, Endianness};

pub const MAX_BITMAP_BITS: u32 = 256;
const BITMAP_WORDS: usize = (MAX_BITMAP_BITS / 32) as usize;

/// A set of sequence numbers expressed as `{ base, num_bits, bitmap }`: bit
/// `i` set means `base + i` is present in the set (RTPS §9.4.2.6).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceNumberSet {
    base: SequenceNumber,
    num_bits: u32,
    bitmap: [u32; BITMAP_WORDS],
}

impl SequenceNumberSet {
    pub const MAX_BITS: u32 = MAX_BITMAP_BITS;

    pub fn empty(base: SequenceNumber) -> Self {
        Self {
            base,
            num_bits: 0,
            bitmap: [0; BITMAP_WORDS],
        }
    }

    pub fn base(&self) -> SequenceNumber {
        self.base
    }

    pub fn num_bits(&self) -> u32 {
        self.num_bits
    }

    pub fn set(&mut self, seq: SequenceNumber) -> bool {
        let offset = seq - self.base;
        if offset < 0 || offset as u32 >= MAX_BITMAP_BITS {
            return false;
        }
        let bit = offset as u32;
        self.bitmap[(bit / 32) as usize] |= 1 << (31 - (bit % 32));
        if bit + 1 > self.num_bits {
            self.num_bits = bit + 1;
        }
        true
    }

    pub fn is_set(&self, seq: SequenceNumber) -> bool {
        let offset = seq - self.base;
        if offset < 0 || offset as u32 >= self.num_bits {
            return false;
        }
        let bit = offset as u32;
        (self.bitmap[(bit / 32) as usize] >> (31 - (bit % 32))) & 1 != 0
    }

    /// Every sequence number currently set, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = SequenceNumber> + '_ {
        (0..self.num_bits).filter_map(move |bit| {
            let word = self.bitmap[(bit / 32) as usize];
            if (word >> (31 - (bit % 32))) & 1 != 0 {
                Some(self.base + bit as i64)
            } else {
                None
            }
        })
    }

    /// Build one or more `SequenceNumberSet`s covering exactly the missing
    /// sequence numbers in `missing` (sorted ascending). A run spanning more
    /// than 256 bits is split into multiple sets whose union reproduces the
    /// input, honoring the §4.1 "refuse to emit bitmaps ≥ 256 bits" rule.
    pub fn chunk_from_missing(missing: &[SequenceNumber]) -> Vec<SequenceNumberSet> {
        if missing.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut idx = 0;
        while idx < missing.len() {
            let base = missing[idx];
            let mut set = SequenceNumberSet::empty(base);
            while idx < missing.len() && set.set(missing[idx]) {
                idx += 1;
            }
            out.push(set);
        }
        out
    }

    pub fn encode(&self, w: &mut CursorMut) -> CdrResult<()> {
        let (hi, lo) = self.base.to_high_low();
        w.write_i32(hi)?;
        w.write_u32(lo)?;
        w.write_u32(self.num_bits)?;
        let words = (self.num_bits as usize).div_ceil(32).max(0);
        for word in self.bitmap.iter().take(words) {
            w.write_u32(*word)?;
        }
        Ok(())
    }

    pub fn decode(r: &mut Cursor) -> CdrResult<Self> {
        let hi = r.read_i32()?;
        let lo = r.read_u32()?;
        let num_bits = r.read_u32()?;
        if num_bits > MAX_BITMAP_BITS {
            return Err(CdrError::InvalidData(format!(
                "SequenceNumberSet num_bits {num_bits} exceeds {MAX_BITMAP_BITS}"
            )));
        }
        let words = (num_bits as usize).div_ceil(32);
        let mut bitmap = [0u32; BITMAP_WORDS];
        for word in bitmap.iter_mut().take(words) {
            *word = r.read_u32()?;
        }
        Ok(Self {
            base: SequenceNumber::from_high_low(hi, lo),
            num_bits,
            bitmap,
        })
    }
}

/// ACKNACK submessage body (RTPS §9.4.5.7).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AckNackMsg {
    pub reader_id: EntityId,
    pub writer_id: EntityId,
    pub reader_sn_state: SequenceNumberSet,
    pub count: u32,
    /// Final flag: reader is not soliciting a reply for this ACKNACK.
    pub is_final: bool,
}

impl AckNackMsg {
    pub fn encode(&self, w: &mut CursorMut) -> CdrResult<()> {
        w.write_bytes(&self.reader_id.0)?;
        w.write_bytes(&self.writer_id.0)?;
        self.reader_sn_state.encode(w)?;
        w.write_u32(self.count)?;
        Ok(())
    }

    pub fn decode(r: &mut Cursor, flags: u8) -> CdrResult<Self> {
        let reader_id = EntityId::new(r.read_bytes(4)?.try_into().unwrap());
        let writer_id = EntityId::new(r.read_bytes(4)?.try_into().unwrap());
        let reader_sn_state = SequenceNumberSet::decode(r)?;
        let count = r.read_u32()?;
        Ok(Self {
            reader_id,
            writer_id,
            reader_sn_state,
            count,
            is_final: flags & 0x02 != 0,
        })
    }
}

/// A set of missing fragment numbers, same shape as [`SequenceNumberSet`]
/// but 1-based over fragment indices (RTPS §9.4.2.9).
pub type FragmentNumberSet = SequenceNumberSet;

/// NACKFRAG submessage body (RTPS §9.4.5.13).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NackFragMsg {
    pub reader_id: EntityId,
    pub writer_id: EntityId,
    pub writer_sn: SequenceNumber,
    pub fragment_number_state: FragmentNumberSet,
    pub count: u32,
}

impl NackFragMsg {
    pub fn encode(&self, w: &mut CursorMut) -> CdrResult<()> {
        w.write_bytes(&self.reader_id.0)?;
        w.write_bytes(&self.writer_id.0)?;
        let (hi, lo) = self.writer_sn.to_high_low();
        w.write_i32(hi)?;
        w.write_u32(lo)?;
        self.fragment_number_state.encode(w)?;
        w.write_u32(self.count)?;
        Ok(())
    }

    pub fn decode(r: &mut Cursor) -> CdrResult<Self> {
        let reader_id = EntityId::new(r.read_bytes(4)?.try_into().unwrap());
        let writer_id = EntityId::new(r.read_bytes(4)?.try_into().unwrap());
        let hi = r.read_i32()?;
        let lo = r.read_u32()?;
        let fragment_number_state = FragmentNumberSet::decode(r)?;
        let count = r.read_u32()?;
        Ok(Self {
            reader_id,
            writer_id,
            writer_sn: SequenceNumber::from_high_low(hi, lo),
            fragment_number_state,
            count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_number_set_round_trips() {
        let mut set = SequenceNumberSet::empty(SequenceNumber::new(5));
        set.set(SequenceNumber::new(5));
        set.set(SequenceNumber::new(7));

        let mut w = CursorMut::new(Endianness::Little);
        set.encode(&mut w).unwrap();
        let bytes = w.into_bytes();
        let mut r = Cursor::new(&bytes, Endianness::Little);
        let decoded = SequenceNumberSet::decode(&mut r).unwrap();

        assert_eq!(decoded, set);
        assert!(decoded.is_set(SequenceNumber::new(5)));
        assert!(!decoded.is_set(SequenceNumber::new(6)));
        assert!(decoded.is_set(SequenceNumber::new(7)));
    }

    #[test]
    fn rejects_bitmaps_at_or_above_256_bits() {
        let mut bytes = vec![];
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&300u32.to_le_bytes());
        let mut r = Cursor::new(&bytes, Endianness::Little);
        assert!(SequenceNumberSet::decode(&mut r).is_err());
    }

    #[test]
    fn chunking_splits_wide_gaps_into_disjoint_sets_covering_the_union() {
        let missing: Vec<SequenceNumber> = (1..=300).map(SequenceNumber::new).collect();
        let chunks = SequenceNumberSet::chunk_from_missing(&missing);
        assert!(chunks.len() >= 2);
        for c in &chunks {
            assert!(c.num_bits() <= SequenceNumberSet::MAX_BITS);
        }
        let mut recovered: Vec<SequenceNumber> = chunks.iter().flat_map(|c| c.iter()).collect();
        recovered.sort();
        assert_eq!(recovered, missing);
    }

    #[test]
    fn acknack_round_trips() {
        let mut set = SequenceNumberSet::empty(SequenceNumber::new(3));
        set.set(SequenceNumber::new(3));
        let msg = AckNackMsg {
            reader_id: EntityId::new([0, 0, 1, 7]),
            writer_id: EntityId::new([0, 0, 1, 2]),
            reader_sn_state: set,
            count: 9,
            is_final: false,
        };
        let mut w = CursorMut::new(Endianness::Little);
        msg.encode(&mut w).unwrap();
        let bytes = w.into_bytes();
        let mut r = Cursor::new(&bytes, Endianness::Little);
        let decoded = AckNackMsg::decode(&mut r, 0x00).unwrap();
        assert_eq!(decoded.count, 9);
        assert_eq!(decoded.reader_sn_state.base(), SequenceNumber::new(3));
    }
}
