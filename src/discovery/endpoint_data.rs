// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `WriterProxyData`/`ReaderProxyData`: the decoded contents of one SEDP
//! publication/subscription announcement (RTPS §8.5.5).

use crate::qos::Qos;
use crate::types::{Guid, Locator};

/// A remote writer as announced over SEDP.
#[derive(Debug, Clone, PartialEq)]
pub struct WriterProxyData {
    pub guid: Guid,
    pub topic_name: String,
    pub type_name: String,
    pub qos: QosSnapshot,
    pub unicast_locators: Vec<Locator>,
    pub multicast_locators: Vec<Locator>,
}

/// A remote reader as announced over SEDP.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderProxyData {
    pub guid: Guid,
    pub topic_name: String,
    pub type_name: String,
    pub qos: QosSnapshot,
    pub unicast_locators: Vec<Locator>,
    pub multicast_locators: Vec<Locator>,
    pub expects_inline_qos: bool,
}

/// The subset of [`Qos`] carried over the wire in a SEDP announcement —
/// everything relevant to RxO matching, detached from in-process-only
/// fields like `ResourceLimits`.
#[derive(Debug, Clone, PartialEq)]
pub struct QosSnapshot {
    pub durability: crate::qos::Durability,
    pub reliability: crate::qos::Reliability,
    pub liveliness: crate::qos::Liveliness,
    pub ownership: crate::qos::Ownership,
    pub partition: crate::qos::Partition,
    pub deadline: Option<std::time::Duration>,
}

impl From<&Qos> for QosSnapshot {
    fn from(qos: &Qos) -> Self {
        Self {
            durability: qos.durability,
            reliability: qos.reliability,
            liveliness: qos.liveliness,
            ownership: qos.ownership,
            partition: qos.partition.clone(),
            deadline: qos.deadline,
        }
    }
}

impl QosSnapshot {
    pub fn as_requested(&self) -> crate::qos::RequestedQos {
        crate::qos::RequestedQos {
            durability: self.durability,
            reliability: self.reliability,
            liveliness: self.liveliness,
            ownership: self.ownership.kind,
            deadline: self.deadline,
            partition: self.partition.clone(),
        }
    }

    pub fn as_offered(&self) -> crate::qos::OfferedQos {
        crate::qos::OfferedQos {
            durability: self.durability,
            reliability: self.reliability,
            liveliness: self.liveliness,
            ownership: self.ownership.kind,
            deadline: self.deadline,
            partition: self.partition.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qos_snapshot_round_trips_the_matching_relevant_fields() {
        let qos = Qos::default();
        let snapshot = QosSnapshot::from(&qos);
        assert_eq!(snapshot.reliability, qos.reliability);
        assert_eq!(snapshot.durability, qos.durability);
    }
}
