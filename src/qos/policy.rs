// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Individual QoS policies (RTPS/DDS QoS model).

use std::time::Duration;

/// How long a late-joining reader can recover samples published before it
/// matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Durability {
    #[default]
    Volatile,
    TransientLocal,
    Transient,
}

/// Whether a writer/reader pair negotiates guaranteed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reliability {
    BestEffort,
    #[default]
    Reliable,
}

/// How liveliness is asserted: automatically by the middleware, manually
/// per participant, or manually per individual writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LivelinessKind {
    #[default]
    Automatic,
    ManualByParticipant,
    ManualByTopic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Liveliness {
    pub kind: LivelinessKind,
    pub lease_duration: Duration,
}

impl Default for Liveliness {
    fn default() -> Self {
        Self {
            kind: LivelinessKind::default(),
            lease_duration: Duration::from_secs(u32::MAX as u64),
        }
    }
}

/// How many samples per instance a reader's HistoryCache retains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum History {
    KeepLast(u32),
    KeepAll,
}

impl Default for History {
    fn default() -> Self {
        History::KeepLast(1)
    }
}

/// Caps on HistoryCache occupancy (RTPS §8.7.2, DDS 2.2.3.17).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceLimits {
    pub max_samples: Option<u32>,
    pub max_instances: Option<u32>,
    pub max_samples_per_instance: Option<u32>,
}

/// Whether multiple writers of the same instance race (SHARED) or a single
/// highest-strength writer wins exclusivity (EXCLUSIVE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnershipKind {
    #[default]
    Shared,
    Exclusive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ownership {
    pub kind: OwnershipKind,
    pub strength: i32,
}

/// Logical grouping used by partition-based matching (exact-string or
/// shell-glob members, joined as an OR across the set).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Partition {
    pub names: Vec<String>,
}

impl Partition {
    pub fn matches(&self, other: &Partition) -> bool {
        if self.names.is_empty() && other.names.is_empty() {
            return true;
        }
        self.names.iter().any(|a| other.names.iter().any(|b| glob_match(a, b)))
    }
}

/// Minimal shell-glob matcher supporting `*` wildcards, mirroring the
/// partition name matching rules used by DDS implementations.
fn glob_match(pattern: &str, text: &str) -> bool {
    fn rec(p: &[u8], t: &[u8]) -> bool {
        match (p.first(), t.first()) {
            (None, None) => true,
            (Some(b'*'), _) => rec(&p[1..], t) || (!t.is_empty() && rec(p, &t[1..])),
            (Some(pc), Some(tc)) if pc == tc => rec(&p[1..], &t[1..]),
            _ => false,
        }
    }
    if pattern == text {
        return true;
    }
    rec(pattern.as_bytes(), text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_empty_matches_empty() {
        assert!(Partition::default().matches(&Partition::default()));
    }

    #[test]
    fn partition_glob_matches() {
        let a = Partition { names: vec!["lab*".into()] };
        let b = Partition { names: vec!["laboratory".into()] };
        assert!(a.matches(&b));
    }

    #[test]
    fn partition_disjoint_does_not_match() {
        let a = Partition { names: vec!["left".into()] };
        let b = Partition { names: vec!["right".into()] };
        assert!(!a.matches(&b));
    }
}
