//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Listener, sessions, relay
//!     → tracing events (structured fields: session, peer, uri, upstream, status)
//!     → logging.rs (fmt subscriber, env filter)
//!     → stdout
//! ```
//!
//! One log line per notable event: request received, response status,
//! upstream failure, timeouts, long transfers, listener lifecycle.

pub mod logging;
