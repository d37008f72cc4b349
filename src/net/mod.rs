//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, one task per connection)
//!     → connection.rs (session id, state machine)
//!     → Hand off to the proxy session
//!
//! Session States:
//!     Idle → Connecting → Forwarding → Relaying → Closed
//! ```
//!
//! # Design Decisions
//! - Worker-per-connection, no pool and no connection cap
//! - The accept hand-off is the only coupling between listener and session
//! - Shutdown closes the listening socket but leaves sessions running

pub mod connection;
pub mod listener;

pub use connection::{SessionId, SessionState, StateMachine};
pub use listener::{Listener, ListenerError};
