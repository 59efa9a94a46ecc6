// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Participant and Endpoint Discovery: SPDP announces/discovers
//! Participants, SEDP exchanges DataWriter/DataReader proxy records,
//! `matcher` applies RxO QoS compatibility to decide which discovered
//! endpoints get matched locally.

pub mod endpoint_data;
pub mod matcher;
pub mod participant_data;
pub mod sedp;
pub mod spdp;

pub use endpoint_data::{QosSnapshot, ReaderProxyData, WriterProxyData};
pub use matcher::{evaluate_match, match_all, MatchOutcome};
pub use participant_data::{BuiltinEndpointSet, DiscoveredParticipant, ParticipantProxyData};
pub use sedp::Sedp;
pub use spdp::Pdp;
