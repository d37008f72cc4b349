//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Client connection
//!     → request.rs (read header block, parse request line, find Host)
//!     → [proxy layer resolves, rewrites, relays]
//!     → response.rs (status sniffing for logs, 502 synthesis on failure)
//!     → Send to client
//! ```
//!
//! Only the subset of HTTP/1.x needed for plain-text forwarding lives
//! here. Bodies and response framing are never interpreted.

pub mod request;
pub mod response;

pub use request::{host_header, read_request_head, RawRequest, RequestLine};
pub use response::{bad_gateway, status_code};
