// SPDX-License-Identifier: Apache-2.0 OR MIT

//! QoS matching (RxO — "Requested vs Offered" compatibility, DDS 2.2.3).
//!
//! A reader's requested QoS and a writer's offered QoS are compatible when,
//! for every RxO policy, the requested side does not ask for more than the
//! offered side provides:
//!
//! | Policy       | Compatible when                                  |
//! |--------------|---------------------------------------------------|
//! | DURABILITY   | offered >= requested (VOLATILE < TRANSIENT_LOCAL < TRANSIENT) |
//! | RELIABILITY  | offered >= requested (BEST_EFFORT < RELIABLE)     |
//! | LIVELINESS   | offered kind >= requested kind AND offered lease <= requested lease |
//! | OWNERSHIP    | kinds must match exactly (SHARED/EXCLUSIVE)       |
//! | DEADLINE     | offered period <= requested period               |
//! | PARTITION    | at least one name in common (or both empty)       |

use crate::qos::policy::{Durability, Liveliness, LivelinessKind, OwnershipKind, Partition, Reliability};
use std::time::Duration;

fn durability_rank(d: Durability) -> u8 {
    match d {
        Durability::Volatile => 0,
        Durability::TransientLocal => 1,
        Durability::Transient => 2,
    }
}

fn reliability_rank(r: Reliability) -> u8 {
    match r {
        Reliability::BestEffort => 0,
        Reliability::Reliable => 1,
    }
}

fn liveliness_rank(k: LivelinessKind) -> u8 {
    match k {
        LivelinessKind::Automatic => 0,
        LivelinessKind::ManualByParticipant => 1,
        LivelinessKind::ManualByTopic => 2,
    }
}

/// A single incompatibility reason, naming the policy that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incompatibility {
    Durability,
    Reliability,
    Liveliness,
    Ownership,
    Deadline,
    Partition,
}

impl Incompatibility {
    pub fn policy_name(self) -> &'static str {
        match self {
            Incompatibility::Durability => "DURABILITY",
            Incompatibility::Reliability => "RELIABILITY",
            Incompatibility::Liveliness => "LIVELINESS",
            Incompatibility::Ownership => "OWNERSHIP",
            Incompatibility::Deadline => "DEADLINE",
            Incompatibility::Partition => "PARTITION",
        }
    }
}

/// Requested-side QoS subset relevant to matching.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestedQos {
    pub durability: Durability,
    pub reliability: Reliability,
    pub liveliness: Liveliness,
    pub ownership: OwnershipKind,
    pub deadline: Option<Duration>,
    pub partition: Partition,
}

/// Offered-side QoS subset relevant to matching.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferedQos {
    pub durability: Durability,
    pub reliability: Reliability,
    pub liveliness: Liveliness,
    pub ownership: OwnershipKind,
    pub deadline: Option<Duration>,
    pub partition: Partition,
}

/// Check RxO compatibility between a reader's requested QoS and a writer's
/// offered QoS, returning every policy that fails (not just the first).
pub fn incompatibilities(requested: &RequestedQos, offered: &OfferedQos) -> Vec<Incompatibility> {
    let mut failures = Vec::new();

    if durability_rank(offered.durability) < durability_rank(requested.durability) {
        failures.push(Incompatibility::Durability);
    }
    if reliability_rank(offered.reliability) < reliability_rank(requested.reliability) {
        failures.push(Incompatibility::Reliability);
    }
    if liveliness_rank(offered.liveliness.kind) < liveliness_rank(requested.liveliness.kind)
        || offered.liveliness.lease_duration > requested.liveliness.lease_duration
    {
        failures.push(Incompatibility::Liveliness);
    }
    if offered.ownership != requested.ownership {
        failures.push(Incompatibility::Ownership);
    }
    if let (Some(req), Some(off)) = (requested.deadline, offered.deadline) {
        if off > req {
            failures.push(Incompatibility::Deadline);
        }
    } else if requested.deadline.is_some() && offered.deadline.is_none() {
        failures.push(Incompatibility::Deadline);
    }
    if !requested.partition.matches(&offered.partition) {
        failures.push(Incompatibility::Partition);
    }

    failures
}

pub fn is_compatible(requested: &RequestedQos, offered: &OfferedQos) -> bool {
    incompatibilities(requested, offered).is_empty()
}
