// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `ParticipantProxyData`: the decoded contents of one SPDP announcement
//! (RTPS §8.5.3.2), plus the built-in endpoint bitmask advertising which
//! discovery writers/readers the announcing participant runs.

use crate::types::{GuidPrefix, Locator, ProtocolVersion, VendorId};
use std::time::{Duration, Instant};

/// Minimal local bitflags implementation, avoiding a dependency for one
/// small bitmask type.
macro_rules! bitflags_like {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $ty:ty {
            $(const $variant:ident = $value:expr;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name(pub $ty);

        impl $name {
            $(pub const $variant: $name = $name($value);)*

            pub const fn empty() -> Self {
                $name(0)
            }

            pub fn contains(self, other: Self) -> bool {
                (self.0 & other.0) == other.0
            }

            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                $name(self.0 | rhs.0)
            }
        }
    };
}

bitflags_like! {
    /// Bit positions of `PID_BUILTIN_ENDPOINT_SET` (RTPS §8.5.4.3, Table 8.77).
    pub struct BuiltinEndpointSet: u32 {
        const PARTICIPANT_ANNOUNCER = 1 << 0;
        const PARTICIPANT_DETECTOR = 1 << 1;
        const PUBLICATIONS_ANNOUNCER = 1 << 2;
        const PUBLICATIONS_DETECTOR = 1 << 3;
        const SUBSCRIPTIONS_ANNOUNCER = 1 << 4;
        const SUBSCRIPTIONS_DETECTOR = 1 << 5;
        const PARTICIPANT_MESSAGE_DATA_WRITER = 1 << 10;
        const PARTICIPANT_MESSAGE_DATA_READER = 1 << 11;
    }
}

/// A decoded SPDP participant announcement.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantProxyData {
    pub guid_prefix: GuidPrefix,
    pub protocol_version: ProtocolVersion,
    pub vendor_id: VendorId,
    pub domain_id: u32,
    pub metatraffic_unicast_locators: Vec<Locator>,
    pub metatraffic_multicast_locators: Vec<Locator>,
    pub default_unicast_locators: Vec<Locator>,
    pub default_multicast_locators: Vec<Locator>,
    pub builtin_endpoints: BuiltinEndpointSet,
    pub lease_duration: Duration,
    pub manual_liveliness_count: u32,
}

/// Per-participant lease bookkeeping the local PDP keeps alongside the
/// last-received `ParticipantProxyData`.
pub struct DiscoveredParticipant {
    pub data: ParticipantProxyData,
    pub last_seen: Instant,
}

impl DiscoveredParticipant {
    pub fn new(data: ParticipantProxyData) -> Self {
        Self {
            data,
            last_seen: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() > self.last_seen + crate::config::lease_expiry_deadline(self.data.lease_duration)
    }
}
