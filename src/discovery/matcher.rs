// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Topic/type/QoS matching entry point tying SEDP-discovered endpoints
//! together (RTPS §8.5.5.1, DDS 2.2.4 "Match" semantics).

use crate::discovery::endpoint_data::{ReaderProxyData, WriterProxyData};
use crate::qos::{incompatibilities, Incompatibility};

/// The outcome of attempting to match a reader against a writer.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Topic or type name differs — not a candidate at all.
    TopicMismatch,
    /// Same topic/type but QoS is incompatible; every failing policy named.
    QosIncompatible(Vec<Incompatibility>),
    Matched,
}

/// Decide whether `reader` and `writer` should be matched: same topic name,
/// same type name, and RxO-compatible QoS (RTPS §8.5.5.1 mandates this is
/// evaluated independently for every (writer, reader) pair discovered).
pub fn evaluate_match(reader: &ReaderProxyData, writer: &WriterProxyData) -> MatchOutcome {
    if reader.topic_name != writer.topic_name || reader.type_name != writer.type_name {
        return MatchOutcome::TopicMismatch;
    }
    let failures = incompatibilities(&reader.qos.as_requested(), &writer.qos.as_offered());
    if failures.is_empty() {
        MatchOutcome::Matched
    } else {
        MatchOutcome::QosIncompatible(failures)
    }
}

/// Scan every (reader, writer) pair across two freshly-discovered endpoint
/// sets and report the match outcome for each — used by SEDP's listener
/// when it learns of a new local or remote endpoint.
pub fn match_all<'a>(
    readers: &'a [ReaderProxyData],
    writers: &'a [WriterProxyData],
) -> Vec<(&'a ReaderProxyData, &'a WriterProxyData, MatchOutcome)> {
    let mut out = Vec::with_capacity(readers.len() * writers.len());
    for reader in readers {
        for writer in writers {
            let outcome = evaluate_match(reader, writer);
            if outcome != MatchOutcome::TopicMismatch {
                out.push((reader, writer, outcome));
            }
        }
    }
    out
}
