//! Configuration validation.
//!
//! Serde handles syntax; this pass checks value ranges and returns every
//! problem found rather than stopping at the first.

use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut check = |ok: bool, field: &'static str, message: String| {
        if !ok {
            errors.push(ValidationError { field, message });
        }
    };

    check(
        config.listener.bind_address.parse::<SocketAddr>().is_ok(),
        "listener.bind_address",
        format!("'{}' is not a socket address", config.listener.bind_address),
    );
    check(config.listener.backlog > 0, "listener.backlog", "must be positive".into());
    check(config.timeouts.connect_secs > 0, "timeouts.connect_secs", "must be positive".into());
    check(config.timeouts.read_secs > 0, "timeouts.read_secs", "must be positive".into());
    check(config.timeouts.write_secs > 0, "timeouts.write_secs", "must be positive".into());
    check(config.relay.chunk_size > 0, "relay.chunk_size", "must be positive".into());
    check(
        config.relay.error_detail_chars > 0,
        "relay.error_detail_chars",
        "must be positive".into(),
    );
    if let Some(cap) = config.relay.max_header_bytes {
        check(
            cap >= 4,
            "relay.max_header_bytes",
            format!("{} cannot hold a header terminator", cap),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
