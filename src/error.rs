//! Session error taxonomy.
//!
//! Every failure a proxy session can hit maps onto one variant here. The
//! variant decides what the client observes: a bare close, or a
//! synthesized `502 Bad Gateway`.

use std::time::Duration;
use thiserror::Error;

/// The I/O phase an upstream timeout occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connect,
    Write,
    Read,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Connect => write!(f, "connect"),
            Phase::Write => write!(f, "write"),
            Phase::Read => write!(f, "read"),
        }
    }
}

/// Errors that end a proxy session.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Peer closed before a complete header block arrived.
    #[error("client disconnected before sending a complete request")]
    ClientDisconnected,

    /// Request line did not parse, or the header block exceeded its cap.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Origin-form target without a usable `Host` header.
    #[error("unable to determine upstream host")]
    NoHost,

    /// TCP connect (or name resolution) to the upstream failed.
    #[error("{source}")]
    UpstreamConnect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Sending to, or reading from, the upstream failed.
    #[error("{source}")]
    UpstreamIo {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// An upstream operation exceeded its deadline.
    #[error("{phase} timed out after {}s", .after.as_secs())]
    UpstreamTimeout { phase: Phase, after: Duration },

    /// Reading from or writing to the client failed.
    #[error("client I/O error: {0}")]
    ClientIo(#[source] std::io::Error),
}

impl ProxyError {
    /// Errors that end the session with a bare close and no response.
    /// A failing client connection cannot carry a response either.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            ProxyError::ClientDisconnected
                | ProxyError::MalformedRequest(_)
                | ProxyError::NoHost
                | ProxyError::ClientIo(_)
        )
    }

    /// Errors reported to the client as `502 Bad Gateway`.
    pub fn is_gateway_failure(&self) -> bool {
        matches!(
            self,
            ProxyError::UpstreamConnect { .. }
                | ProxyError::UpstreamIo { .. }
                | ProxyError::UpstreamTimeout { .. }
        )
    }
}
