//! Proxy session: one client connection, start to finish.
//!
//! ```text
//! read header block → parse request line → resolve upstream → rewrite
//!     → connect → forward → relay → close
//! ```
//!
//! The session owns both sockets. They are released when the session is
//! dropped, whichever way it ends.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::Instrument;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::request::{read_request_head, RequestLine};
use crate::http::response::bad_gateway;
use crate::net::connection::{SessionId, SessionState, StateMachine};
use crate::proxy::relay::{self, RelayEnd, RelayOutcome, RelaySettings};
use crate::proxy::rewrite::rewrite_request;
use crate::proxy::target::Upstream;

/// Per-session copy of the configuration values a session needs.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub chunk_size: usize,
    pub max_header_bytes: Option<usize>,
    pub connect_timeout: Duration,
    pub write_timeout: Duration,
    pub read_timeout: Duration,
    pub long_transfer: Duration,
    pub error_detail_chars: usize,
}

impl SessionSettings {
    fn relay(&self) -> RelaySettings {
        RelaySettings {
            chunk_size: self.chunk_size,
            read_timeout: self.read_timeout,
            long_transfer: self.long_transfer,
        }
    }
}

impl From<&ProxyConfig> for SessionSettings {
    fn from(config: &ProxyConfig) -> Self {
        Self {
            chunk_size: config.relay.chunk_size,
            max_header_bytes: config.relay.max_header_bytes,
            connect_timeout: config.timeouts.connect(),
            write_timeout: config.timeouts.write(),
            read_timeout: config.timeouts.read(),
            long_transfer: config.relay.long_transfer(),
            error_detail_chars: config.relay.error_detail_chars,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&ProxyConfig::default())
    }
}

/// A single proxied client connection.
pub struct Session<S> {
    id: SessionId,
    peer: SocketAddr,
    client: S,
    settings: SessionSettings,
    state: StateMachine,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(client: S, peer: SocketAddr, settings: SessionSettings) -> Self {
        Self {
            id: SessionId::new(),
            peer,
            client,
            settings,
            state: StateMachine::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Drive the session to completion. Never fails; errors are logged.
    pub async fn run(mut self) {
        let span = tracing::info_span!(
            "session",
            session = %self.id,
            peer = %self.peer,
            uri = tracing::field::Empty,
        );

        async move {
            match self.proxy().await {
                Ok(()) => {}
                Err(err) if err.is_silent() => match err {
                    ProxyError::ClientDisconnected | ProxyError::ClientIo(_) => {
                        tracing::debug!(error = %err, "Client went away");
                    }
                    _ => tracing::warn!(error = %err, "Dropping request"),
                },
                Err(err) => {
                    tracing::error!(error = %err, "Session ended without a response");
                }
            }

            // Best effort: the peer may already be gone.
            let _ = self.client.shutdown().await;
            self.state.advance(SessionState::Closed);
        }
        .instrument(span)
        .await
    }

    async fn proxy(&mut self) -> Result<(), ProxyError> {
        let raw = read_request_head(
            &mut self.client,
            self.settings.chunk_size,
            self.settings.max_header_bytes,
        )
        .await?;

        let line = RequestLine::parse(raw.head())?;
        tracing::Span::current().record("uri", line.target.as_str());
        tracing::info!(method = %line.method, "Request received");

        let upstream = Upstream::resolve(&line.target, raw.head())?;
        let request = rewrite_request(raw.as_bytes(), &line);

        match self.exchange(&upstream, &request).await {
            Ok(outcome) => {
                tracing::debug!(
                    upstream = %upstream,
                    bytes = outcome.bytes,
                    chunks = outcome.chunks,
                    notices = outcome.notices,
                    "Relay finished"
                );
                Ok(())
            }
            Err(err) if err.is_gateway_failure() => {
                self.state.advance(SessionState::Error);
                tracing::error!(
                    host = %upstream.host,
                    port = upstream.port,
                    error = %err,
                    "Upstream request failed"
                );
                let response = bad_gateway(&err.to_string(), self.settings.error_detail_chars);
                self.client
                    .write_all(&response)
                    .await
                    .map_err(ProxyError::ClientIo)
            }
            Err(err) => Err(err),
        }
    }

    /// Connect, forward and relay. The upstream socket lives only here.
    async fn exchange(
        &mut self,
        upstream: &Upstream,
        request: &[u8],
    ) -> Result<RelayOutcome, ProxyError> {
        self.state.advance(SessionState::Connecting);
        let mut server = relay::connect(upstream, self.settings.connect_timeout).await?;

        self.state.advance(SessionState::Forwarding);
        relay::forward(&mut server, request, upstream, self.settings.write_timeout).await?;

        self.state.advance(SessionState::Relaying);
        let outcome =
            relay::relay_response(&mut server, &mut self.client, upstream, self.settings.relay())
                .await?;

        // A 502 is only possible while the client has seen nothing.
        if outcome.bytes == 0 {
            if let RelayEnd::Aborted(err) = outcome.end {
                return Err(err);
            }
        } else if let RelayEnd::Aborted(err) = &outcome.end {
            tracing::warn!(
                upstream = %upstream,
                bytes = outcome.bytes,
                error = %err,
                "Upstream failed mid-response"
            );
        }
        Ok(outcome)
    }
}
