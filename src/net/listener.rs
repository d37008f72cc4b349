//! TCP listener implementation.
//!
//! # Responsibilities
//! - Bind to the configured address with the configured backlog
//! - Accept incoming TCP connections
//! - Hand each connection to its own session task
//! - Stop accepting when shutdown is signalled

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::broadcast;
use tokio::task::JoinSet;

use crate::config::ListenerConfig;
use crate::proxy::{Session, SessionSettings};

/// Pause after a failed accept so a persistent error (e.g. EMFILE) can't spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Bind address did not parse.
    #[error("Invalid bind address '{0}'")]
    Address(String),
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    Bind(#[source] std::io::Error),
}

/// The proxy's accepting socket.
pub struct Listener {
    /// The underlying TCP listener.
    inner: TcpListener,
}

impl Listener {
    /// Bind to the configured address.
    ///
    /// Must be called within a Tokio runtime.
    pub fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr = config
            .bind_address
            .parse()
            .map_err(|_| ListenerError::Address(config.bind_address.clone()))?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(ListenerError::Bind)?;
        socket.set_reuseaddr(true).map_err(ListenerError::Bind)?;
        socket.bind(addr).map_err(ListenerError::Bind)?;
        let listener = socket.listen(config.backlog).map_err(ListenerError::Bind)?;

        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;
        tracing::info!(
            address = %local_addr,
            backlog = config.backlog,
            "Listener bound"
        );

        Ok(Self { inner: listener })
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    /// Accept connections until `shutdown` fires, one session task each.
    ///
    /// The listening socket is closed on return. Sessions still in flight
    /// are handed back so the caller can let them finish.
    pub async fn run(
        self,
        settings: SessionSettings,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinSet<()> {
        let mut sessions = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!(in_flight = sessions.len(), "Listener stopped accepting");
                    break;
                }
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!(error = %e, "Session task panicked");
                        }
                    }
                }
                accepted = self.inner.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let session = Session::new(stream, peer, settings);
                        tracing::debug!(peer = %peer, session = %session.id(), "Connection accepted");
                        sessions.spawn(session.run());
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
            }
        }

        sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn loopback() -> ListenerConfig {
        ListenerConfig {
            bind_address: "127.0.0.1:0".into(),
            backlog: 100,
        }
    }

    #[tokio::test]
    async fn rejects_bad_address() {
        let config = ListenerConfig {
            bind_address: "localhost".into(),
            backlog: 100,
        };
        assert!(matches!(Listener::bind(&config), Err(ListenerError::Address(_))));
    }

    #[tokio::test]
    async fn stops_accepting_on_shutdown() {
        let listener = Listener::bind(&loopback()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = broadcast::channel(1);

        let handle = tokio::spawn(listener.run(SessionSettings::default(), rx));

        // An idle client: the session is still waiting on headers at shutdown.
        let mut idle = TcpStream::connect(addr).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        tx.send(()).unwrap();
        let mut sessions = handle.await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(TcpStream::connect(addr).await.is_err());

        // In-flight sessions run to their natural end.
        idle.shutdown().await.unwrap();
        sessions.join_next().await.unwrap().unwrap();
        let mut buf = Vec::new();
        idle.read_to_end(&mut buf).await.unwrap();
        assert!(buf.is_empty());
    }
}
