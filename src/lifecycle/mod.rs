//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Parse CLI → Load config → Validate → Init logging → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Let sessions finish (bounded) → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     Second signal → Exit immediately
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::{drain, Shutdown};
pub use signals::wait_for_signal;
