// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core identifiers and wire-shaped value types shared across every module:
//! GUIDs, sequence numbers, locators, and RTPS durations.

pub mod duration;
pub mod guid;
pub mod locator;
pub mod sequence_number;

pub use duration::RtpsDuration;
pub use guid::{EntityId, Guid, GuidPrefix};
pub use locator::Locator;
pub use sequence_number::SequenceNumber;

/// Protocol version carried in the RTPS header.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProtocolVersion {
    pub const V2_5: ProtocolVersion = ProtocolVersion { major: 2, minor: 5 };
}

/// Vendor ID carried in the RTPS header.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct VendorId(pub [u8; 2]);

impl VendorId {
    pub const UNKNOWN: VendorId = VendorId([0, 0]);
}
