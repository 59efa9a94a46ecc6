// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DDS QoS policies and RxO compatibility matching.

pub mod compatibility;
pub mod policy;

pub use compatibility::{incompatibilities, is_compatible, Incompatibility, OfferedQos, RequestedQos};
pub use policy::{
    Durability, History, Liveliness, LivelinessKind, Ownership, OwnershipKind, Partition, Reliability,
    ResourceLimits,
};

/// The full QoS profile attached to a writer or reader. Individual fields
/// are consulted independently by the history cache, the reliability state
/// machines, and [`compatibility`] — this struct just bundles them for
/// convenient construction and storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Qos {
    pub durability: Durability,
    pub reliability: Reliability,
    pub liveliness: Liveliness,
    pub history: History,
    pub resource_limits: ResourceLimits,
    pub ownership: Ownership,
    pub partition: Partition,
    pub deadline: Option<std::time::Duration>,
}

impl Default for Qos {
    fn default() -> Self {
        Self {
            durability: Durability::default(),
            reliability: Reliability::default(),
            liveliness: Liveliness::default(),
            history: History::default(),
            resource_limits: ResourceLimits::default(),
            ownership: Ownership::default(),
            partition: Partition::default(),
            deadline: None,
        }
    }
}

impl Qos {
    pub fn as_requested(&self) -> RequestedQos {
        RequestedQos {
            durability: self.durability,
            reliability: self.reliability,
            liveliness: self.liveliness,
            ownership: self.ownership.kind,
            deadline: self.deadline,
            partition: self.partition.clone(),
        }
    }

    pub fn as_offered(&self) -> OfferedQos {
        OfferedQos {
            durability: self.durability,
            reliability: self.reliability,
            liveliness: self.liveliness,
            ownership: self.ownership.kind,
            deadline: self.deadline,
            partition: self.partition.clone(),
        }
    }

    /// Validate internal consistency, independent of any peer — e.g. a
    /// `KeepLast(0)` depth or a `max_samples_per_instance` that exceeds
    /// `max_samples` makes no sense regardless of matching.
    pub fn validate(&self) -> crate::error::Result<()> {
        if let History::KeepLast(depth) = self.history {
            if depth == 0 {
                return Err(crate::error::Error::InvalidQos(
                    "HISTORY KEEP_LAST depth must be >= 1".into(),
                ));
            }
        }
        if let (Some(max_samples), Some(per_instance)) = (
            self.resource_limits.max_samples,
            self.resource_limits.max_samples_per_instance,
        ) {
            if per_instance > max_samples {
                return Err(crate::error::Error::InvalidQos(
                    "max_samples_per_instance must not exceed max_samples".into(),
                ));
            }
        }
        Ok(())
    }
}
