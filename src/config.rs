// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Global configuration — single source of truth for RTPS wire constants.
//!
//! Two levels, mirroring the rest of this crate's config conventions:
//!
//! - **Level 1 (static)**: compile-time constants from the RTPS spec
//!   (`constants` module) — port formula parameters, default periods.
//! - **Level 2 (dynamic)**: [`RuntimeConfig`] for operator overrides (QoS
//!   string overrides, port remapping) that can be swapped in without
//!   taking a lock on the hot path.

use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// RTPS wire constants (OMG DDS-RTPS v2.5 §9.6.1.1 port formula, and the
/// default protocol periods named throughout §4 of the design).
pub mod constants {
    use std::time::Duration;

    /// IANA-registered RTPS base port.
    pub const PORT_BASE: u16 = 7400;
    pub const DOMAIN_ID_GAIN: u16 = 250;
    pub const PARTICIPANT_ID_GAIN: u16 = 2;
    pub const OFFSET_D0: u16 = 0;
    pub const OFFSET_D1: u16 = 10;
    pub const OFFSET_D2: u16 = 1;
    pub const OFFSET_D3: u16 = 11;

    /// Largest domain id such that every derived port stays in u16 range
    /// for the largest participant id (119).
    pub const MAX_DOMAIN_ID: u32 = 232;
    pub const MAX_PARTICIPANT_ID: u8 = 119;

    pub const SPDP_DEFAULT_LEASE_DURATION: Duration = Duration::from_secs(20);
    pub const SPDP_DEFAULT_ANNOUNCEMENT_PERIOD: Duration = Duration::from_secs(3);
    pub const SPDP_INITIAL_ANNOUNCEMENT_COUNT: u32 = 5;
    pub const SPDP_INITIAL_ANNOUNCEMENT_PERIOD: Duration = Duration::from_millis(100);

    /// Multiplier applied to `lease_duration` before declaring a peer lost,
    /// absorbing scheduler/network jitter (see original_source PDP lease
    /// checks; this crate carries the same slack).
    pub const LEASE_EXPIRY_MULTIPLIER: f64 = 1.5;

    pub const HEARTBEAT_PERIOD_DEFAULT: Duration = Duration::from_secs(3);
    pub const HEARTBEAT_RESPONSE_DELAY_DEFAULT: Duration = Duration::from_millis(5);
    pub const NACK_SUPPRESSION_DURATION_DEFAULT: Duration = Duration::from_millis(0);

    /// Default per-fragment payload size (RTPS §8.4.14.1.1) used when a
    /// `StatefulWriter` splits a sample exceeding one datagram into
    /// DATA_FRAG submessages. Sized to stay well under a 1500-byte Ethernet
    /// MTU once headers are accounted for.
    pub const DEFAULT_FRAGMENT_SIZE: u16 = 1344;

    /// Derive the multicast metatraffic port for a domain id.
    pub fn metatraffic_multicast_port(domain_id: u32) -> u16 {
        PORT_BASE + DOMAIN_ID_GAIN * domain_id as u16 + OFFSET_D0
    }

    /// Derive the unicast metatraffic port for a (domain id, participant id) pair.
    pub fn metatraffic_unicast_port(domain_id: u32, participant_id: u8) -> u16 {
        PORT_BASE
            + DOMAIN_ID_GAIN * domain_id as u16
            + OFFSET_D1
            + PARTICIPANT_ID_GAIN * participant_id as u16
    }

    /// Derive the multicast user-data port for a domain id.
    pub fn userdata_multicast_port(domain_id: u32) -> u16 {
        PORT_BASE + DOMAIN_ID_GAIN * domain_id as u16 + OFFSET_D2
    }

    /// Derive the unicast user-data port for a (domain id, participant id) pair.
    pub fn userdata_unicast_port(domain_id: u32, participant_id: u8) -> u16 {
        PORT_BASE
            + DOMAIN_ID_GAIN * domain_id as u16
            + OFFSET_D3
            + PARTICIPANT_ID_GAIN * participant_id as u16
    }
}

/// Operator-configurable port substitution, swapped atomically so the hot
/// receive/send path never blocks behind a config update.
#[derive(Debug, Clone, Default)]
pub struct PortMapping {
    pub metatraffic_multicast: Option<u16>,
    pub metatraffic_unicast: Option<u16>,
    pub userdata_multicast: Option<u16>,
    pub userdata_unicast: Option<u16>,
}

/// Dynamic runtime configuration: QoS string overrides plus port remapping.
///
/// Cloning a `RuntimeConfig` is cheap — it's a handle around `Arc`-shared
/// state — so it can be passed freely to every endpoint and discovery
/// collaborator in a Participant.
#[derive(Clone)]
pub struct RuntimeConfig {
    qos_overrides: Arc<DashMap<Arc<str>, Arc<str>>>,
    ports: Arc<ArcSwap<PortMapping>>,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self {
            qos_overrides: Arc::new(DashMap::new()),
            ports: Arc::new(ArcSwap::from_pointee(PortMapping::default())),
        }
    }

    /// Set a QoS override, e.g. `"reliability.kind" -> "RELIABLE"`.
    pub fn set_qos(&self, key: impl Into<Arc<str>>, value: impl Into<Arc<str>>) {
        self.qos_overrides.insert(key.into(), value.into());
    }

    pub fn get_qos(&self, key: &str) -> Option<Arc<str>> {
        self.qos_overrides.get(key).map(|v| v.clone())
    }

    /// All overrides whose key starts with `prefix`.
    pub fn search_qos_prefix(&self, prefix: &str) -> Vec<(Arc<str>, Arc<str>)> {
        self.qos_overrides
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// Atomically replace the port mapping.
    pub fn set_port_mapping(&self, mapping: PortMapping) {
        self.ports.store(Arc::new(mapping));
    }

    pub fn port_mapping(&self) -> Arc<PortMapping> {
        self.ports.load_full()
    }

    /// Resolve the metatraffic multicast port for a domain, honoring any
    /// operator override before falling back to the RTPS formula.
    pub fn metatraffic_multicast_port(&self, domain_id: u32) -> u16 {
        self.ports
            .load()
            .metatraffic_multicast
            .unwrap_or_else(|| constants::metatraffic_multicast_port(domain_id))
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Lease duration with the jitter multiplier already applied — the value a
/// lease watchdog should actually compare elapsed time against.
pub fn lease_expiry_deadline(lease_duration: Duration) -> Duration {
    lease_duration.mul_f64(constants::LEASE_EXPIRY_MULTIPLIER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_formula_matches_spec_defaults() {
        assert_eq!(constants::metatraffic_multicast_port(0), 7400);
        assert_eq!(constants::metatraffic_unicast_port(0, 0), 7410);
        assert_eq!(constants::userdata_multicast_port(0), 7401);
        assert_eq!(constants::userdata_unicast_port(0, 0), 7411);
        assert_eq!(constants::metatraffic_multicast_port(1), 7650);
    }

    #[test]
    fn runtime_config_overrides_take_precedence() {
        let cfg = RuntimeConfig::new();
        assert_eq!(cfg.metatraffic_multicast_port(0), 7400);

        cfg.set_port_mapping(PortMapping {
            metatraffic_multicast: Some(9999),
            ..Default::default()
        });
        assert_eq!(cfg.metatraffic_multicast_port(0), 9999);
    }

    #[test]
    fn qos_overrides_search_by_prefix() {
        let cfg = RuntimeConfig::new();
        cfg.set_qos("reliability.kind", "RELIABLE");
        cfg.set_qos("reliability.max_blocking_time", "100ms");
        cfg.set_qos("durability.kind", "VOLATILE");

        let hits = cfg.search_qos_prefix("reliability.");
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn lease_expiry_applies_multiplier() {
        let d = lease_expiry_deadline(Duration::from_secs(20));
        assert_eq!(d, Duration::from_secs(30));
    }
}
