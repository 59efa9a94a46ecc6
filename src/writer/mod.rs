// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Writer-side endpoint state machines: `StatelessWriter` for fire-and-forget
//! delivery, `StatefulWriter` for per-reader reliable/best-effort tracking.

pub mod reader_proxy;
pub mod stateful;
pub mod stateless;

pub use reader_proxy::{ChangeForReaderStatus, ReaderProxy};
pub use stateful::StatefulWriter;
pub use stateless::StatelessWriter;
