//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the forward proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, backlog).
    pub listener: ListenerConfig,

    /// Upstream timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Response relay tuning.
    pub relay: RelayConfig,

    /// Shutdown behavior.
    pub lifecycle: LifecycleConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Pending-connection queue length passed to `listen(2)`.
    pub backlog: u32,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            backlog: 100,
        }
    }
}

/// Timeout configuration for upstream operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connect timeout in seconds.
    pub connect_secs: u64,

    /// Per-chunk upstream read timeout in seconds.
    pub read_secs: u64,

    /// Upstream request write timeout in seconds.
    pub write_secs: u64,
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }

    pub fn write(&self) -> Duration {
        Duration::from_secs(self.write_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            read_secs: 5,
            write_secs: 5,
        }
    }
}

/// Relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Read size for both the client header reader and the upstream relay.
    pub chunk_size: usize,

    /// Wall time after which a still-running transfer is reported.
    pub long_transfer_secs: u64,

    /// Maximum characters of error text placed in a 502 body.
    pub error_detail_chars: usize,

    /// Optional cap on buffered request-header bytes. Unbounded when unset.
    pub max_header_bytes: Option<usize>,
}

impl RelayConfig {
    pub fn long_transfer(&self) -> Duration {
        Duration::from_secs(self.long_transfer_secs)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            chunk_size: 8192,
            long_transfer_secs: 60,
            error_detail_chars: 100,
            max_header_bytes: None,
        }
    }
}

/// Lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Upper bound on waiting for in-flight sessions after a shutdown
    /// signal. Unset means they run to their natural end.
    pub shutdown_grace_secs: Option<u64>,
}

impl LifecycleConfig {
    pub fn shutdown_grace(&self) -> Option<Duration> {
        self.shutdown_grace_secs.map(Duration::from_secs)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_secs: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let config = ProxyConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.listener.backlog, 100);
        assert_eq!(config.timeouts.connect(), Duration::from_secs(5));
        assert_eq!(config.relay.chunk_size, 8192);
        assert_eq!(config.relay.long_transfer(), Duration::from_secs(60));
        assert_eq!(config.relay.error_detail_chars, 100);
        assert!(config.relay.max_header_bytes.is_none());
        assert!(config.lifecycle.shutdown_grace().is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:3128"

            [relay]
            max_header_bytes = 65536

            [lifecycle]
            shutdown_grace_secs = 45
            "#,
        )
        .unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:3128");
        assert_eq!(config.listener.backlog, 100);
        assert_eq!(config.relay.max_header_bytes, Some(65536));
        assert_eq!(config.timeouts.read_secs, 5);
        assert_eq!(config.lifecycle.shutdown_grace(), Some(Duration::from_secs(45)));
    }
}
