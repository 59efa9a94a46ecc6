// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reader-side endpoint state machines: `StatelessReader` for unmatched,
//! no-ack reception, `StatefulReader` for per-writer reliable/best-effort
//! tracking and liveliness.

pub mod stateful;
pub mod stateless;
pub mod writer_proxy;

pub use stateful::StatefulReader;
pub use stateless::StatelessReader;
pub use writer_proxy::{ChangeFromWriterStatus, WriterProxy};
