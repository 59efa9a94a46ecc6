// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Crate-wide error taxonomy.
//!
//! Kinds, not nested types: every fallible path in this crate returns one of
//! these variants rather than a bespoke per-module error. Wire-level and
//! transport failures are recovered locally (see the dispatch paths in
//! `wire` and `reader`/`writer`); this type exists for the handful of
//! operations that must surface a failure to the application.

use std::fmt;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds returned by the public API.
///
/// # Example
///
/// ```
/// use rtps_core::Error;
///
/// let e = Error::InvalidDomainId(999);
/// assert_eq!(e.to_string(), "invalid domain_id: 999 (must be 0-232)");
/// ```
#[derive(Debug)]
pub enum Error {
    // Configuration
    /// QoS policy is invalid (e.g. negative depth, conflicting policies).
    InvalidQos(String),
    /// Generic configuration error.
    Config(String),

    // Entity / identity
    /// Domain ID out of range (0-232 per the RTPS port formula).
    InvalidDomainId(u32),
    /// Participant ID out of range (0-119).
    InvalidParticipantId(u8),
    /// Requested GUID is already in use locally.
    DuplicateGuid,

    // Protocol drop reasons (§7 error taxonomy) — surfaced for logging/testing,
    // never propagated past the message receiver.
    /// Header/submessage failed to parse; the offending message is dropped.
    MalformedMessage(String),
    /// Message from a GuidPrefix with no known local participant data.
    UnknownSource,
    /// Submessage addressed to an EntityId this participant does not own.
    NoDestination,
    /// Sequence number already at RECEIVED or below the low mark.
    Duplicate,

    // Resource / flow control
    /// HistoryCache cannot admit a new change under its resource limits.
    BufferFull,
    /// A blocking call (`write`, `wait_for_all_acked`) exceeded its deadline.
    Timeout,
    /// Matched-endpoint or proxy-pool limits exhausted.
    ResourceLimitExhausted(String),

    // Matching
    /// QoS policies are incompatible between offered and requested sides.
    QosIncompatible(&'static str),

    // Transport (as seen by the core; concrete transports are external)
    /// The transport reported a send failure.
    TransportError(String),
    /// I/O error bubbled up from a transport or persistence collaborator.
    Io(std::io::Error),

    /// Requested operation is not supported by this build/configuration.
    Unsupported,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidQos(msg) => write!(f, "invalid QoS: {msg}"),
            Error::Config(msg) => write!(f, "configuration error: {msg}"),
            Error::InvalidDomainId(id) => write!(f, "invalid domain_id: {id} (must be 0-232)"),
            Error::InvalidParticipantId(id) => {
                write!(f, "invalid participant_id: {id} (must be 0-119)")
            }
            Error::DuplicateGuid => write!(f, "duplicate GUID"),
            Error::MalformedMessage(why) => write!(f, "malformed RTPS message: {why}"),
            Error::UnknownSource => write!(f, "message from unknown source participant"),
            Error::NoDestination => write!(f, "submessage addressed to unowned entity"),
            Error::Duplicate => write!(f, "duplicate sequence number"),
            Error::BufferFull => write!(f, "history cache buffer full"),
            Error::Timeout => write!(f, "operation timed out"),
            Error::ResourceLimitExhausted(what) => write!(f, "resource limit exhausted: {what}"),
            Error::QosIncompatible(policy) => write!(f, "incompatible QoS policy: {policy}"),
            Error::TransportError(why) => write!(f, "transport error: {why}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Unsupported => write!(f, "operation not supported"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
