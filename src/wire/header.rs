// SPDX-License-Identifier: Apache-2.0 OR MIT

//! RTPS message header and submessage header (RTPS §9.4.2, §9.4.3).

use crate::types::{GuidPrefix, ProtocolVersion, VendorId};
use crate::wire::cdr::{CdrError, CdrResult};

pub const RTPS_MAGIC: [u8; 4] = *b"RTPS";
pub const RTPS_HEADER_LEN: usize = 20;
pub const SUBMESSAGE_HEADER_LEN: usize = 4;

/// The 20-byte header that begins every RTPS message.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct RtpsHeader {
    pub version: ProtocolVersion,
    pub vendor_id: VendorId,
    pub guid_prefix: GuidPrefix,
}

impl RtpsHeader {
    pub fn new(guid_prefix: GuidPrefix) -> Self {
        Self {
            version: ProtocolVersion::V2_5,
            vendor_id: VendorId::UNKNOWN,
            guid_prefix,
        }
    }

    pub fn encode(&self) -> [u8; RTPS_HEADER_LEN] {
        let mut buf = [0u8; RTPS_HEADER_LEN];
        buf[0..4].copy_from_slice(&RTPS_MAGIC);
        buf[4] = self.version.major;
        buf[5] = self.version.minor;
        buf[6..8].copy_from_slice(&self.vendor_id.0);
        buf[8..20].copy_from_slice(&self.guid_prefix.0);
        buf
    }

    /// Parse a header, rejecting wrong magic or a protocol major version we
    /// don't understand — per §4.1 failure semantics, the whole message is
    /// dropped rather than partially interpreted.
    pub fn parse(buf: &[u8]) -> CdrResult<Self> {
        if buf.len() < RTPS_HEADER_LEN {
            return Err(CdrError::ReadOverrun {
                offset: 0,
                needed: RTPS_HEADER_LEN,
                len: buf.len(),
            });
        }
        if buf[0..4] != RTPS_MAGIC {
            return Err(CdrError::InvalidData("bad RTPS magic".into()));
        }
        let major = buf[4];
        if major != ProtocolVersion::V2_5.major {
            return Err(CdrError::InvalidData(format!(
                "unsupported protocol major version {major}"
            )));
        }
        let mut guid_prefix = [0u8; 12];
        guid_prefix.copy_from_slice(&buf[8..20]);
        Ok(Self {
            version: ProtocolVersion {
                major,
                minor: buf[5],
            },
            vendor_id: VendorId([buf[6], buf[7]]),
            guid_prefix: GuidPrefix(guid_prefix),
        })
    }
}

/// Submessage kind octet (RTPS §9.4.5.1.1, Table 9.13).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SubmessageKind {
    Pad,
    AckNack,
    Heartbeat,
    Gap,
    InfoTs,
    InfoSrc,
    InfoReplyIp4,
    InfoDst,
    InfoReply,
    NackFrag,
    HeartbeatFrag,
    Data,
    DataFrag,
    SecPrefix,
    SecPostfix,
    SrtpsPrefix,
    SrtpsPostfix,
    Unknown(u8),
}

impl SubmessageKind {
    pub fn from_id(id: u8) -> Self {
        match id {
            0x01 => Self::Pad,
            0x06 => Self::AckNack,
            0x07 => Self::Heartbeat,
            0x08 => Self::Gap,
            0x09 => Self::InfoTs,
            0x0c => Self::InfoSrc,
            0x0d => Self::InfoReplyIp4,
            0x0e => Self::InfoDst,
            0x0f => Self::InfoReply,
            0x12 => Self::NackFrag,
            0x13 => Self::HeartbeatFrag,
            0x15 => Self::Data,
            0x16 => Self::DataFrag,
            0x31 => Self::SecPrefix,
            0x32 => Self::SecPostfix,
            0x33 => Self::SrtpsPrefix,
            0x34 => Self::SrtpsPostfix,
            other => Self::Unknown(other),
        }
    }

    pub fn to_id(self) -> u8 {
        match self {
            Self::Pad => 0x01,
            Self::AckNack => 0x06,
            Self::Heartbeat => 0x07,
            Self::Gap => 0x08,
            Self::InfoTs => 0x09,
            Self::InfoSrc => 0x0c,
            Self::InfoReplyIp4 => 0x0d,
            Self::InfoDst => 0x0e,
            Self::InfoReply => 0x0f,
            Self::NackFrag => 0x12,
            Self::HeartbeatFrag => 0x13,
            Self::Data => 0x15,
            Self::DataFrag => 0x16,
            Self::SecPrefix => 0x31,
            Self::SecPostfix => 0x32,
            Self::SrtpsPrefix => 0x33,
            Self::SrtpsPostfix => 0x34,
            Self::Unknown(id) => id,
        }
    }
}

/// `{ kind: u8, flags: u8, length: u16 }` — 4-byte submessage header.
/// `length == 0` on the last submessage means "extends to end of message."
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SubmessageHeader {
    pub kind: SubmessageKind,
    pub flags: u8,
    pub length: u16,
}

impl SubmessageHeader {
    pub fn endianness_flag(self) -> bool {
        self.flags & 0x01 != 0
    }

    pub fn encode(&self) -> [u8; SUBMESSAGE_HEADER_LEN] {
        let len = self.length.to_le_bytes();
        [self.kind.to_id(), self.flags, len[0], len[1]]
    }

    pub fn parse(buf: &[u8]) -> CdrResult<Self> {
        if buf.len() < SUBMESSAGE_HEADER_LEN {
            return Err(CdrError::ReadOverrun {
                offset: 0,
                needed: SUBMESSAGE_HEADER_LEN,
                len: buf.len(),
            });
        }
        // Submessage header length itself is always little-endian per
        // RTPS §9.4.5.1.3, regardless of the body's endianness flag.
        let length = u16::from_le_bytes([buf[2], buf[3]]);
        Ok(Self {
            kind: SubmessageKind::from_id(buf[0]),
            flags: buf[1],
            length,
        })
    }
}
