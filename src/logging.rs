// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thin logging facade.
//!
//! The core never owns a logging backend: it emits records through the
//! standard [`log`] crate facade so a host application wires up whatever
//! sink it wants (`env_logger`, `tracing-log`, a custom [`LogOutput`], ...).
//! An optional in-process sink is provided for hosts (tests, embedded
//! bring-up) that want to capture records without installing a global
//! logger.

use std::sync::{Arc, Mutex};

/// A single captured log record.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: log::Level,
    pub target: &'static str,
    pub message: String,
}

/// A sink that collects [`LogRecord`]s in process instead of going through
/// the global `log` logger. Useful for asserting on drop-path logging in
/// tests without installing a logger implementation.
#[derive(Clone, Default)]
pub struct LogOutput {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl LogOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a line at the given level, also forwarding to the `log` facade
    /// so normal host logging keeps working when a `LogOutput` is attached.
    pub fn emit(&self, level: log::Level, target: &'static str, message: impl Into<String>) {
        let message = message.into();
        log::log!(target: target, level, "{message}");
        self.records.lock().unwrap().push(LogRecord {
            level,
            target,
            message,
        });
    }

    /// Snapshot of everything recorded so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Number of records at or above the given level.
    pub fn count_at_least(&self, level: log::Level) -> usize {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.level <= level)
            .count()
    }
}

/// Log a protocol drop at `trace` level — used for the high-frequency,
/// expected-in-normal-operation drop reasons (`NoDestination`, `Duplicate`).
#[macro_export]
macro_rules! trace_drop {
    ($target:expr, $($arg:tt)+) => {
        log::trace!(target: $target, $($arg)+);
    };
}

/// Log a protocol drop at `debug` level — used for drops that indicate a
/// malformed peer but aren't actionable by an operator.
#[macro_export]
macro_rules! debug_drop {
    ($target:expr, $($arg:tt)+) => {
        log::debug!(target: $target, $($arg)+);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_output_captures_and_counts() {
        let out = LogOutput::new();
        out.emit(log::Level::Warn, "pdp", "lease expired for participant");
        out.emit(log::Level::Trace, "wire", "dropped malformed submessage");

        assert_eq!(out.records().len(), 2);
        assert_eq!(out.count_at_least(log::Level::Warn), 1);
        assert_eq!(out.count_at_least(log::Level::Trace), 2);
    }
}
