//! Forwarding pipeline.
//!
//! # Data Flow
//! ```text
//! accepted client socket
//!     → session.rs (owns both sockets, drives the pipeline)
//!     → target.rs (absolute-form URI or Host header → host:port)
//!     → rewrite.rs (request line → origin-form)
//!     → relay.rs (connect, forward, stream response back)
//! ```
//!
//! # Design Decisions
//! - One uniform path for every method; the proxy is content-agnostic
//! - Sessions share no mutable state with each other or the listener
//! - Only the request line is ever modified

pub mod relay;
pub mod rewrite;
pub mod session;
pub mod target;

pub use rewrite::{origin_form, rewrite_request};
pub use session::{Session, SessionSettings};
pub use target::Upstream;
