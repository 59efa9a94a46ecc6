// SPDX-License-Identifier: Apache-2.0 OR MIT

//! HEARTBEAT and HEARTBEATFRAG submessages (RTPS §9.4.5.6, §9.4.5.8).

use crate::types::{EntityId, SequenceNumber};
use crate::wire::cdr::{CdrResult, Cursor, CursorMut};

/// HEARTBEAT submessage body: tells a reader the range of sequence numbers
/// `[first_sn, last_sn]` the writer currently holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeartbeatMsg {
    pub reader_id: EntityId,
    pub writer_id: EntityId,
    pub first_sn: SequenceNumber,
    pub last_sn: SequenceNumber,
    pub count: u32,
    /// Final flag: reader need not respond with an ACKNACK.
    pub is_final: bool,
    /// Liveliness flag: this heartbeat is a liveliness assertion, not
    /// necessarily a request to ack outstanding samples.
    pub is_liveliness: bool,
}

impl HeartbeatMsg {
    pub fn flags(&self) -> u8 {
        let mut f = 0u8;
        if self.is_final {
            f |= 0x02;
        }
        if self.is_liveliness {
            f |= 0x04;
        }
        f
    }

    pub fn encode(&self, w: &mut CursorMut) -> CdrResult<()> {
        w.write_bytes(&self.reader_id.0)?;
        w.write_bytes(&self.writer_id.0)?;
        let (fhi, flo) = self.first_sn.to_high_low();
        w.write_i32(fhi)?;
        w.write_u32(flo)?;
        let (lhi, llo) = self.last_sn.to_high_low();
        w.write_i32(lhi)?;
        w.write_u32(llo)?;
        w.write_u32(self.count)?;
        Ok(())
    }

    pub fn decode(r: &mut Cursor, flags: u8) -> CdrResult<Self> {
        let reader_id = EntityId::new(r.read_bytes(4)?.try_into().unwrap());
        let writer_id = EntityId::new(r.read_bytes(4)?.try_into().unwrap());
        let fhi = r.read_i32()?;
        let flo = r.read_u32()?;
        let lhi = r.read_i32()?;
        let llo = r.read_u32()?;
        let count = r.read_u32()?;
        Ok(Self {
            reader_id,
            writer_id,
            first_sn: SequenceNumber::from_high_low(fhi, flo),
            last_sn: SequenceNumber::from_high_low(lhi, llo),
            count,
            is_final: flags & 0x02 != 0,
            is_liveliness: flags & 0x04 != 0,
        })
    }
}

/// HEARTBEATFRAG submessage body: announces the highest fragment number the
/// writer has made available for a given, still-fragmenting, change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeartbeatFragMsg {
    pub reader_id: EntityId,
    pub writer_id: EntityId,
    pub writer_sn: SequenceNumber,
    pub last_fragment_num: u32,
    pub count: u32,
}

impl HeartbeatFragMsg {
    pub fn encode(&self, w: &mut CursorMut) -> CdrResult<()> {
        w.write_bytes(&self.reader_id.0)?;
        w.write_bytes(&self.writer_id.0)?;
        let (hi, lo) = self.writer_sn.to_high_low();
        w.write_i32(hi)?;
        w.write_u32(lo)?;
        w.write_u32(self.last_fragment_num)?;
        w.write_u32(self.count)?;
        Ok(())
    }

    pub fn decode(r: &mut Cursor) -> CdrResult<Self> {
        let reader_id = EntityId::new(r.read_bytes(4)?.try_into().unwrap());
        let writer_id = EntityId::new(r.read_bytes(4)?.try_into().unwrap());
        let hi = r.read_i32()?;
        let lo = r.read_u32()?;
        let last_fragment_num = r.read_u32()?;
        let count = r.read_u32()?;
        Ok(Self {
            reader_id,
            writer_id,
            writer_sn: SequenceNumber::from_high_low(hi, lo),
            last_fragment_num,
            count,
        })
    }
}
