// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DATA and DATA_FRAG submessages (RTPS §9.4.5.3, §9.4.5.4): carry a
//! serialized sample (whole or one fragment of it) plus optional inline QoS.

use crate::types::{EntityId, SequenceNumber};
use crate::wire::cdr::{CdrError, CdrResult, Cursor, CursorMut, Endianness};
use crate::wire::parameter_list::ParameterList;

/// CDR encapsulation identifiers (RTPS §10.2, Table 10.3). Every serialized
/// payload is prefixed by one of these plus two reserved option bytes.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Encapsulation {
    CdrBe,
    CdrLe,
    PlCdrBe,
    PlCdrLe,
}

impl Encapsulation {
    pub fn from_id(id: u16) -> CdrResult<Self> {
        match id {
            0x0000 => Ok(Self::CdrBe),
            0x0001 => Ok(Self::CdrLe),
            0x0002 => Ok(Self::PlCdrBe),
            0x0003 => Ok(Self::PlCdrLe),
            other => Err(CdrError::InvalidData(format!("unknown encapsulation id 0x{other:04x}"))),
        }
    }

    pub fn to_id(self) -> u16 {
        match self {
            Self::CdrBe => 0x0000,
            Self::CdrLe => 0x0001,
            Self::PlCdrBe => 0x0002,
            Self::PlCdrLe => 0x0003,
        }
    }

    pub fn endianness(self) -> Endianness {
        match self {
            Self::CdrBe | Self::PlCdrBe => Endianness::Big,
            Self::CdrLe | Self::PlCdrLe => Endianness::Little,
        }
    }

    pub fn for_endianness(endianness: Endianness, parameter_list: bool) -> Self {
        match (endianness, parameter_list) {
            (Endianness::Big, false) => Self::CdrBe,
            (Endianness::Little, false) => Self::CdrLe,
            (Endianness::Big, true) => Self::PlCdrBe,
            (Endianness::Little, true) => Self::PlCdrLe,
        }
    }
}

/// A serialized sample payload: a 4-byte encapsulation header followed by
/// the encoded bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerializedPayload {
    pub encapsulation: Encapsulation,
    pub data: Vec<u8>,
}

impl SerializedPayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.data.len());
        out.extend_from_slice(&self.encapsulation.to_id().to_be_bytes());
        out.extend_from_slice(&[0, 0]); // options, unused
        out.extend_from_slice(&self.data);
        out
    }

    pub fn decode(buf: &[u8]) -> CdrResult<Self> {
        if buf.len() < 4 {
            return Err(CdrError::ReadOverrun { offset: 0, needed: 4, len: buf.len() });
        }
        let id = u16::from_be_bytes([buf[0], buf[1]]);
        let encapsulation = Encapsulation::from_id(id)?;
        Ok(Self {
            encapsulation,
            data: buf[4..].to_vec(),
        })
    }
}

/// DATA submessage body (RTPS §9.4.5.3). `octets_to_inline_qos` lets a
/// reader that doesn't understand the key/data flags still locate the
/// inline QoS parameter list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataMsg {
    pub reader_id: EntityId,
    pub writer_id: EntityId,
    pub writer_sn: SequenceNumber,
    pub inline_qos: Option<ParameterList>,
    /// Present when the D flag is set: the full serialized sample.
    pub serialized_payload: Option<SerializedPayload>,
    /// Present when the K flag is set instead of D: a serialized key-only
    /// payload, signaling unregister/dispose rather than a full sample.
    pub serialized_key: Option<SerializedPayload>,
}

const INLINE_QOS_FLAG: u8 = 0x02;
const DATA_FLAG: u8 = 0x04;
const KEY_FLAG: u8 = 0x08;

impl DataMsg {
    pub fn flags(&self, endianness: Endianness) -> u8 {
        let mut f = endianness.flag_bit();
        if self.inline_qos.is_some() {
            f |= INLINE_QOS_FLAG;
        }
        if self.serialized_payload.is_some() {
            f |= DATA_FLAG;
        }
        if self.serialized_key.is_some() {
            f |= KEY_FLAG;
        }
        f
    }

    pub fn encode(&self, w: &mut CursorMut) -> CdrResult<()> {
        w.write_u16(0)?; // extraFlags
        let octets_at = w.reserve(2);
        let header_start = w.offset();
        w.write_bytes(&self.reader_id.0)?;
        w.write_bytes(&self.writer_id.0)?;
        let (hi, lo) = self.writer_sn.to_high_low();
        w.write_i32(hi)?;
        w.write_u32(lo)?;
        let octets_to_inline_qos = (w.offset() - header_start) as u16;
        w.patch_u16_at(octets_at, octets_to_inline_qos);
        if let Some(qos) = &self.inline_qos {
            w.write_bytes(&qos.encode(w.endianness()))?;
        }
        if let Some(payload) = &self.serialized_payload {
            w.write_bytes(&payload.encode())?;
        } else if let Some(key) = &self.serialized_key {
            w.write_bytes(&key.encode())?;
        }
        Ok(())
    }

    pub fn decode(r: &mut Cursor, flags: u8) -> CdrResult<Self> {
        r.skip(2)?; // extraFlags
        let octets_to_inline_qos = r.read_u16()? as usize;
        let header_start = r.offset();
        let reader_id = EntityId::new(r.read_bytes(4)?.try_into().unwrap());
        let writer_id = EntityId::new(r.read_bytes(4)?.try_into().unwrap());
        let hi = r.read_i32()?;
        let lo = r.read_u32()?;
        let consumed = r.offset() - header_start;
        if octets_to_inline_qos > consumed {
            r.skip(octets_to_inline_qos - consumed)?;
        }

        let inline_qos = if flags & INLINE_QOS_FLAG != 0 {
            Some(ParameterList::decode_from_cursor(r)?)
        } else {
            None
        };

        let (serialized_payload, serialized_key) = if flags & (DATA_FLAG | KEY_FLAG) != 0 {
            let rest = r.read_bytes(r.remaining())?;
            let payload = SerializedPayload::decode(rest)?;
            if flags & KEY_FLAG != 0 {
                (None, Some(payload))
            } else {
                (Some(payload), None)
            }
        } else {
            (None, None)
        };

        Ok(Self {
            reader_id,
            writer_id,
            writer_sn: SequenceNumber::from_high_low(hi, lo),
            inline_qos,
            serialized_payload,
            serialized_key,
        })
    }
}

/// DATA_FRAG submessage body (RTPS §9.4.5.4): one fragment (or a
/// contiguous run of fragments) of a larger sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataFragMsg {
    pub reader_id: EntityId,
    pub writer_id: EntityId,
    pub writer_sn: SequenceNumber,
    /// 1-based index of the first fragment carried in this submessage.
    pub fragment_starting_num: u32,
    /// How many consecutive fragments this submessage carries.
    pub fragments_in_submessage: u16,
    pub fragment_size: u16,
    /// Total size, in bytes, of the unfragmented sample.
    pub sample_size: u32,
    pub inline_qos: Option<ParameterList>,
    pub payload: Vec<u8>,
}

impl DataFragMsg {
    pub fn flags(&self, endianness: Endianness) -> u8 {
        let mut f = endianness.flag_bit();
        if self.inline_qos.is_some() {
            f |= INLINE_QOS_FLAG;
        }
        f
    }

    /// Total number of fragments the unfragmented sample is split into.
    pub fn total_fragments(&self) -> u32 {
        if self.fragment_size == 0 {
            0
        } else {
            self.sample_size.div_ceil(self.fragment_size as u32)
        }
    }

    /// §8 boundary rule: a submessage naming fragments past the end of the
    /// sample is malformed and must be rejected rather than partially used.
    pub fn validate_bounds(&self) -> CdrResult<()> {
        let total = self.total_fragments();
        let last = self.fragment_starting_num + self.fragments_in_submessage as u32 - 1;
        if self.fragment_starting_num == 0 || last > total {
            return Err(CdrError::InvalidData(format!(
                "DATA_FRAG fragments [{}, {last}] exceed total_fragments {total}",
                self.fragment_starting_num
            )));
        }
        Ok(())
    }

    pub fn encode(&self, w: &mut CursorMut) -> CdrResult<()> {
        w.write_u16(0)?; // extraFlags
        let octets_at = w.reserve(2);
        let header_start = w.offset();
        w.write_bytes(&self.reader_id.0)?;
        w.write_bytes(&self.writer_id.0)?;
        let (hi, lo) = self.writer_sn.to_high_low();
        w.write_i32(hi)?;
        w.write_u32(lo)?;
        w.write_u32(self.fragment_starting_num)?;
        w.write_u16(self.fragments_in_submessage)?;
        w.write_u16(self.fragment_size)?;
        w.write_u32(self.sample_size)?;
        let octets_to_inline_qos = (w.offset() - header_start) as u16;
        w.patch_u16_at(octets_at, octets_to_inline_qos);
        if let Some(qos) = &self.inline_qos {
            w.write_bytes(&qos.encode(w.endianness()))?;
        }
        w.write_bytes(&self.payload)?;
        Ok(())
    }

    pub fn decode(r: &mut Cursor, flags: u8) -> CdrResult<Self> {
        r.skip(2)?;
        let octets_to_inline_qos = r.read_u16()? as usize;
        let header_start = r.offset();
        let reader_id = EntityId::new(r.read_bytes(4)?.try_into().unwrap());
        let writer_id = EntityId::new(r.read_bytes(4)?.try_into().unwrap());
        let hi = r.read_i32()?;
        let lo = r.read_u32()?;
        let fragment_starting_num = r.read_u32()?;
        let fragments_in_submessage = r.read_u16()?;
        let fragment_size = r.read_u16()?;
        let sample_size = r.read_u32()?;
        let consumed = r.offset() - header_start;
        if octets_to_inline_qos > consumed {
            r.skip(octets_to_inline_qos - consumed)?;
        }

        let inline_qos = if flags & INLINE_QOS_FLAG != 0 {
            Some(ParameterList::decode_from_cursor(r)?)
        } else {
            None
        };

        let payload = r.read_bytes(r.remaining())?.to_vec();

        let msg = Self {
            reader_id,
            writer_id,
            writer_sn: SequenceNumber::from_high_low(hi, lo),
            fragment_starting_num,
            fragments_in_submessage,
            fragment_size,
            sample_size,
            inline_qos,
            payload,
        };
        msg.validate_bounds()?;
        Ok(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::parameter_list::PID_TOPIC_NAME;

    #[test]
    fn data_round_trips_with_payload_and_inline_qos() {
        let mut qos = ParameterList::new();
        qos.push(PID_TOPIC_NAME, b"square".to_vec());
        let msg = DataMsg {
            reader_id: EntityId::new([0; 4]),
            writer_id: EntityId::new([0, 0, 1, 2]),
            writer_sn: SequenceNumber::new(7),
            inline_qos: Some(qos),
            serialized_payload: Some(SerializedPayload {
                encapsulation: Encapsulation::CdrLe,
                data: vec![1, 2, 3, 4],
            }),
            serialized_key: None,
        };
        let mut w = CursorMut::new(Endianness::Little);
        msg.encode(&mut w).unwrap();
        let bytes = w.into_bytes();
        let flags = msg.flags(Endianness::Little);
        let mut r = Cursor::new(&bytes, Endianness::Little);
        let decoded = DataMsg::decode(&mut r, flags).unwrap();

        assert_eq!(decoded.writer_sn, msg.writer_sn);
        assert_eq!(
            decoded.serialized_payload.as_ref().unwrap().data,
            vec![1, 2, 3, 4]
        );
        assert!(decoded.inline_qos.is_some());
    }

    #[test]
    fn data_frag_round_trips() {
        let msg = DataFragMsg {
            reader_id: EntityId::new([0; 4]),
            writer_id: EntityId::new([0, 0, 1, 2]),
            writer_sn: SequenceNumber::new(1),
            fragment_starting_num: 1,
            fragments_in_submessage: 2,
            fragment_size: 512,
            sample_size: 1024,
            inline_qos: None,
            payload: vec![9u8; 1024],
        };
        let mut w = CursorMut::new(Endianness::Little);
        msg.encode(&mut w).unwrap();
        let bytes = w.into_bytes();
        let mut r = Cursor::new(&bytes, Endianness::Little);
        let decoded = DataFragMsg::decode(&mut r, 0x00).unwrap();
        assert_eq!(decoded.payload.len(), 1024);
    }

    #[test]
    fn data_frag_rejects_fragments_past_total() {
        let msg = DataFragMsg {
            reader_id: EntityId::new([0; 4]),
            writer_id: EntityId::new([0, 0, 1, 2]),
            writer_sn: SequenceNumber::new(1),
            fragment_starting_num: 3,
            fragments_in_submessage: 1,
            fragment_size: 512,
            sample_size: 1024, // only 2 fragments total
            inline_qos: None,
            payload: vec![],
        };
        assert!(msg.validate_bounds().is_err());
    }

    #[test]
    fn encapsulation_round_trips_endianness() {
        assert_eq!(Encapsulation::for_endianness(Endianness::Big, true), Encapsulation::PlCdrBe);
        assert_eq!(Encapsulation::PlCdrLe.endianness(), Endianness::Little);
    }
}
