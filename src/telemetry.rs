// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-endpoint reliability counters.
//!
//! No external metrics backend ships with this crate — that's an outer
//! collaborator's job. What does ship is a small set of named atomic
//! counters any stateful writer/reader can bump on the hot path and an
//! operator can snapshot cheaply.

use std::sync::atomic::{AtomicU64, Ordering};

pub const TAG_HEARTBEATS_SENT: &str = "heartbeats_sent";
pub const TAG_ACKNACKS_RECEIVED: &str = "acknacks_received";
pub const TAG_NACKFRAGS_RECEIVED: &str = "nackfrags_received";
pub const TAG_GAPS_DETECTED: &str = "gaps_detected";
pub const TAG_RETRANSMIT_SENT: &str = "retransmit_sent";
pub const TAG_OUT_OF_ORDER: &str = "out_of_order";
pub const TAG_MAX_GAP_SIZE: &str = "max_gap_size";

/// Point-in-time snapshot of [`ReliableMetrics`], safe to move across
/// threads and log or export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub heartbeats_sent: u64,
    pub acknacks_received: u64,
    pub nackfrags_received: u64,
    pub gaps_detected: u64,
    pub retransmit_sent: u64,
    pub out_of_order: u64,
    pub max_gap_size: u64,
}

/// Atomic reliability-protocol counters for one writer or reader endpoint.
#[derive(Debug, Default)]
pub struct ReliableMetrics {
    heartbeats_sent: AtomicU64,
    acknacks_received: AtomicU64,
    nackfrags_received: AtomicU64,
    gaps_detected: AtomicU64,
    retransmit_sent: AtomicU64,
    out_of_order: AtomicU64,
    max_gap_size: AtomicU64,
}

impl ReliableMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_heartbeat_sent(&self) {
        self.heartbeats_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_acknack_received(&self) {
        self.acknacks_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_nackfrag_received(&self) {
        self.nackfrags_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_gap(&self, gap_size: u64) {
        self.gaps_detected.fetch_add(1, Ordering::Relaxed);
        self.max_gap_size.fetch_max(gap_size, Ordering::Relaxed);
    }

    pub fn record_retransmit(&self, count: u64) {
        self.retransmit_sent.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_out_of_order(&self) {
        self.out_of_order.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            heartbeats_sent: self.heartbeats_sent.load(Ordering::Relaxed),
            acknacks_received: self.acknacks_received.load(Ordering::Relaxed),
            nackfrags_received: self.nackfrags_received.load(Ordering::Relaxed),
            gaps_detected: self.gaps_detected.load(Ordering::Relaxed),
            retransmit_sent: self.retransmit_sent.load(Ordering::Relaxed),
            out_of_order: self.out_of_order.load(Ordering::Relaxed),
            max_gap_size: self.max_gap_size.load(Ordering::Relaxed),
        }
    }
}
