// SPDX-License-Identifier: Apache-2.0 OR MIT

//! INFO_TS, INFO_SRC, and INFO_DST submessages (RTPS §9.4.5.9-11): these
//! carry no payload of their own but modify how subsequent submessages in
//! the same message are interpreted.

use crate::types::{GuidPrefix, ProtocolVersion, VendorId};
use crate::wire::cdr::{CdrResult, Cursor, CursorMut};

/// INFO_TS: a timestamp applied to subsequent submessages' reception
/// timestamp, until overridden or the message ends. Absent (`Invalidate`
/// flag set) clears any previously established timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InfoTsMsg {
    Timestamp { seconds: i32, fraction: u32 },
    Invalidate,
}

impl InfoTsMsg {
    pub fn flags(&self) -> u8 {
        match self {
            InfoTsMsg::Timestamp { .. } => 0x00,
            InfoTsMsg::Invalidate => 0x02,
        }
    }

    pub fn encode(&self, w: &mut CursorMut) -> CdrResult<()> {
        if let InfoTsMsg::Timestamp { seconds, fraction } = self {
            w.write_i32(*seconds)?;
            w.write_u32(*fraction)?;
        }
        Ok(())
    }

    pub fn decode(r: &mut Cursor, flags: u8) -> CdrResult<Self> {
        if flags & 0x02 != 0 {
            return Ok(InfoTsMsg::Invalidate);
        }
        let seconds = r.read_i32()?;
        let fraction = r.read_u32()?;
        Ok(InfoTsMsg::Timestamp { seconds, fraction })
    }
}

/// INFO_SRC: overrides the apparent origin (protocol version, vendor,
/// guid prefix) of subsequent submessages — used when relaying.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InfoSrcMsg {
    pub protocol_version: ProtocolVersion,
    pub vendor_id: VendorId,
    pub guid_prefix: GuidPrefix,
}

impl InfoSrcMsg {
    pub fn encode(&self, w: &mut CursorMut) -> CdrResult<()> {
        w.write_u32(0)?; // unused
        w.write_u8(self.protocol_version.major)?;
        w.write_u8(self.protocol_version.minor)?;
        w.write_bytes(&self.vendor_id.0)?;
        w.write_bytes(&self.guid_prefix.0)?;
        Ok(())
    }

    pub fn decode(r: &mut Cursor) -> CdrResult<Self> {
        r.skip(4)?;
        let major = r.read_u8()?;
        let minor = r.read_u8()?;
        let vendor_id = VendorId(r.read_bytes(2)?.try_into().unwrap());
        let guid_prefix = GuidPrefix::new(r.read_bytes(12)?.try_into().unwrap());
        Ok(Self {
            protocol_version: ProtocolVersion { major, minor },
            vendor_id,
            guid_prefix,
        })
    }
}

/// INFO_DST: sets the destination GuidPrefix for subsequent submessages
/// whose own entity ids otherwise leave the participant ambiguous.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InfoDstMsg {
    pub guid_prefix: GuidPrefix,
}

impl InfoDstMsg {
    pub fn encode(&self, w: &mut CursorMut) -> CdrResult<()> {
        w.write_bytes(&self.guid_prefix.0)
    }

    pub fn decode(r: &mut Cursor) -> CdrResult<Self> {
        let guid_prefix = GuidPrefix::new(r.read_bytes(12)?.try_into().unwrap());
        Ok(Self { guid_prefix })
    }
}
