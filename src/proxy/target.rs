//! Upstream target resolution.
//!
//! Absolute-form targets (`http://host[:port]/...`) name the origin
//! themselves. Anything else is treated as origin-form and addressed via
//! the `Host` header. Port 80 applies when neither names one.

use url::{Host, Url};

use crate::error::ProxyError;
use crate::http::request::host_header;

/// Port used when the target or `Host` header doesn't name one.
pub const DEFAULT_PORT: u16 = 80;

pub const HTTP_SCHEME: &str = "http://";

/// Whether `target` is an absolute-form `http://` URI.
pub fn is_absolute_form(target: &str) -> bool {
    target.starts_with(HTTP_SCHEME)
}

/// Where a session's request is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    /// Hostname or IP literal, without IPv6 brackets.
    pub host: String,
    pub port: u16,
}

impl Upstream {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Resolve the upstream for a request target and its header block.
    pub fn resolve(target: &str, head: &[u8]) -> Result<Self, ProxyError> {
        if is_absolute_form(target) {
            Self::from_absolute(target)
        } else {
            let host = host_header(head).ok_or(ProxyError::NoHost)?;
            Self::from_authority(&host)
        }
    }

    /// Host and port of an absolute `http://` URI.
    pub fn from_absolute(target: &str) -> Result<Self, ProxyError> {
        let url = Url::parse(target).map_err(|_| ProxyError::NoHost)?;
        let host = match url.host().ok_or(ProxyError::NoHost)? {
            Host::Domain(domain) => domain.to_string(),
            Host::Ipv4(addr) => addr.to_string(),
            Host::Ipv6(addr) => addr.to_string(),
        };
        Ok(Self::new(host, url.port().unwrap_or(DEFAULT_PORT)))
    }

    /// Parse a `Host` header value: `host`, `host:port`, `[v6]` or `[v6]:port`.
    pub fn from_authority(authority: &str) -> Result<Self, ProxyError> {
        let (host, port) = if let Some(rest) = authority.strip_prefix('[') {
            let (host, after) = rest.split_once(']').ok_or(ProxyError::NoHost)?;
            match after {
                "" => (host, None),
                _ => (host, Some(after.strip_prefix(':').ok_or(ProxyError::NoHost)?)),
            }
        } else {
            match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            }
        };

        if host.is_empty() {
            return Err(ProxyError::NoHost);
        }
        let port = match port {
            Some(port) => port.parse().map_err(|_| ProxyError::NoHost)?,
            None => DEFAULT_PORT,
        };
        Ok(Self::new(host, port))
    }
}

impl std::fmt::Display for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_HEADERS: &[u8] = b"GET / HTTP/1.1\r\n\r\n";

    #[test]
    fn absolute_form_with_default_port() {
        let upstream = Upstream::resolve(
            "http://example.com/",
            b"GET http://example.com/ HTTP/1.1\r\nHost: example.com\r\n\r\n",
        )
        .unwrap();
        assert_eq!(upstream, Upstream::new("example.com", 80));
    }

    #[test]
    fn absolute_form_with_explicit_port() {
        let upstream = Upstream::resolve("http://live.example:8000/stream?x=1", NO_HEADERS).unwrap();
        assert_eq!(upstream, Upstream::new("live.example", 8000));
        assert_eq!(upstream.to_string(), "live.example:8000");
    }

    #[test]
    fn absolute_form_ignores_host_header() {
        let head = b"GET http://a.example/ HTTP/1.1\r\nHost: b.example:81\r\n\r\n";
        assert_eq!(Upstream::resolve("http://a.example/", head).unwrap().host, "a.example");
    }

    #[test]
    fn absolute_form_ipv6_literal() {
        let upstream = Upstream::resolve("http://[::1]:8080/", NO_HEADERS).unwrap();
        assert_eq!(upstream, Upstream::new("::1", 8080));
        assert_eq!(upstream.to_string(), "[::1]:8080");
    }

    #[test]
    fn origin_form_uses_host_header() {
        let head = b"GET /status HTTP/1.1\r\nHost: internal.local:9000\r\n\r\n";
        let upstream = Upstream::resolve("/status", head).unwrap();
        assert_eq!(upstream, Upstream::new("internal.local", 9000));
    }

    #[test]
    fn origin_form_host_without_port_defaults_to_80() {
        let head = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
        assert_eq!(Upstream::resolve("/", head).unwrap(), Upstream::new("example.com", 80));
    }

    #[test]
    fn origin_form_without_host_fails() {
        let err = Upstream::resolve("/status", NO_HEADERS).unwrap_err();
        assert!(matches!(err, ProxyError::NoHost));
    }

    #[test]
    fn unusable_authorities() {
        for authority in [":80", "example.com:http", "[::1", "[::1]80", "example.com:70000"] {
            assert!(Upstream::from_authority(authority).is_err(), "{}", authority);
        }
        assert_eq!(Upstream::from_authority("[::1]").unwrap(), Upstream::new("::1", 80));
    }

    #[test]
    fn absolute_form_without_host_fails() {
        assert!(matches!(Upstream::resolve("http://", NO_HEADERS), Err(ProxyError::NoHost)));
    }

    #[test]
    fn resolution_is_idempotent() {
        let first = Upstream::resolve("http://h.example:8081/p?q", NO_HEADERS).unwrap();
        let second = Upstream::resolve("http://h.example:8081/p?q", NO_HEADERS).unwrap();
        assert_eq!(first, second);
    }
}
