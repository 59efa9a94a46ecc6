// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The RTPS wire framer: message/submessage headers, CDR primitive cursors,
//! parameter lists, and the submessage bodies themselves.
//!
//! ```text
//! RtpsMessage
//!   └─ RtpsHeader (20 bytes: magic, version, vendor, guid_prefix)
//!   └─ [SubmessageHeader + body]*
//!        ├─ DATA / DATA_FRAG      (wire::data)
//!        ├─ HEARTBEAT / ...FRAG   (wire::heartbeat)
//!        ├─ ACKNACK / NACKFRAG    (wire::acknack)
//!        ├─ GAP                   (wire::gap)
//!        └─ INFO_TS/SRC/DST       (wire::info)
//! ```
//!
//! Every submessage body is encoded/decoded through [`cdr::Cursor`] /
//! [`cdr::CursorMut`], which pick big- or little-endian per that
//! submessage's own endianness flag bit rather than a single fixed wire
//! convention.

pub mod acknack;
pub mod cdr;
pub mod data;
pub mod gap;
pub mod header;
pub mod heartbeat;
pub mod info;
pub mod message;
pub mod parameter_list;

pub use acknack::{AckNackMsg, FragmentNumberSet, NackFragMsg, SequenceNumberSet};
pub use cdr::{CdrError, CdrResult, Cursor, CursorMut, Endianness};
pub use data::{DataFragMsg, DataMsg, Encapsulation, SerializedPayload};
pub use gap::GapMsg;
pub use header::{RtpsHeader, SubmessageHeader, SubmessageKind, RTPS_HEADER_LEN, SUBMESSAGE_HEADER_LEN};
pub use heartbeat::{HeartbeatFragMsg, HeartbeatMsg};
pub use info::{InfoDstMsg, InfoSrcMsg, InfoTsMsg};
pub use message::{frame_submessage, info_dst_body, info_src_body, ContextualSubmessage, RtpsMessage, SubmessageBody};
pub use parameter_list::ParameterList;
