//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns.
//!
//! - [`observe`] — logs each exchange as a `curl` reproduction (TRACE) and a
//!   redacted JSON record (INFO), with method, URL, headers, bounded bodies,
//!   status and latency.

pub mod observe;

pub use observe::{ObservedBody, Observer, ReplayBody};
