//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream operation (connect / write / read chunk):
//!     → timeouts.rs (enforce fixed deadline)
//!     → caller maps Elapsed to an error (connect, write) or end-of-relay (read)
//! ```
//!
//! # Design Decisions
//! - Every upstream call has a deadline
//! - No retries: a failed upstream is reported once, as a 502

pub mod timeouts;

pub use timeouts::{within, Deadline};
