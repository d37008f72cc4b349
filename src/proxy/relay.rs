//! Upstream connector and response relay.
//!
//! # Responsibilities
//! - Open the upstream connection under a connect deadline
//! - Send the rewritten request under a write deadline
//! - Stream the response back chunk by chunk, each read under a deadline
//!
//! # Design Decisions
//! - Each chunk is written to the client as soon as it is read; nothing
//!   is reassembled, so order and boundaries are preserved exactly
//! - A read timeout ends the relay quietly; partial responses stand
//! - Long transfers are reported periodically but never cut off

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;

use crate::error::{Phase, ProxyError};
use crate::http::response::status_code;
use crate::proxy::target::Upstream;
use crate::resilience::{within, Deadline};

/// Open a TCP connection to `upstream` within `timeout`.
pub async fn connect(upstream: &Upstream, timeout: Duration) -> Result<TcpStream, ProxyError> {
    let attempt = TcpStream::connect((upstream.host.as_str(), upstream.port));
    match within(Phase::Connect, timeout, attempt).await {
        Deadline::Completed(Ok(stream)) => {
            tracing::debug!(upstream = %upstream, "Upstream connected");
            Ok(stream)
        }
        Deadline::Completed(Err(source)) => Err(ProxyError::UpstreamConnect {
            host: upstream.host.clone(),
            port: upstream.port,
            source,
        }),
        Deadline::Elapsed { phase, after } => Err(ProxyError::UpstreamTimeout { phase, after }),
    }
}

/// Write the whole request to the upstream within `timeout`.
pub async fn forward<W>(
    writer: &mut W,
    request: &[u8],
    upstream: &Upstream,
    timeout: Duration,
) -> Result<(), ProxyError>
where
    W: AsyncWrite + Unpin,
{
    let send = async {
        writer.write_all(request).await?;
        writer.flush().await
    };
    match within(Phase::Write, timeout, send).await {
        Deadline::Completed(Ok(())) => Ok(()),
        Deadline::Completed(Err(source)) => Err(ProxyError::UpstreamIo {
            host: upstream.host.clone(),
            port: upstream.port,
            source,
        }),
        Deadline::Elapsed { phase, after } => Err(ProxyError::UpstreamTimeout { phase, after }),
    }
}

/// Knobs for [`relay_response`].
#[derive(Debug, Clone, Copy)]
pub struct RelaySettings {
    pub chunk_size: usize,
    pub read_timeout: Duration,
    pub long_transfer: Duration,
}

/// Why the relay stopped.
#[derive(Debug)]
pub enum RelayEnd {
    /// Upstream closed its side.
    Complete,
    /// No chunk arrived within the read timeout.
    TimedOut,
    /// Reading from the upstream failed.
    Aborted(ProxyError),
}

/// Summary of a finished relay.
#[derive(Debug)]
pub struct RelayOutcome {
    /// Bytes written to the client.
    pub bytes: u64,
    /// Chunks written to the client.
    pub chunks: u64,
    /// Status token sniffed from the first chunk.
    pub status: Option<String>,
    /// Long-transfer notices emitted.
    pub notices: u32,
    pub end: RelayEnd,
}

/// Stream everything `upstream` produces into `client`.
///
/// Upstream-side failures end the relay and are reported in
/// [`RelayOutcome::end`]; only a failed client write is returned as `Err`.
pub async fn relay_response<U, C>(
    upstream: &mut U,
    client: &mut C,
    origin: &Upstream,
    settings: RelaySettings,
) -> Result<RelayOutcome, ProxyError>
where
    U: AsyncRead + Unpin,
    C: AsyncWrite + Unpin,
{
    let mut chunk = vec![0u8; settings.chunk_size];
    let mut outcome = RelayOutcome {
        bytes: 0,
        chunks: 0,
        status: None,
        notices: 0,
        end: RelayEnd::Complete,
    };
    let mut window_start = Instant::now();

    loop {
        let n = match within(Phase::Read, settings.read_timeout, upstream.read(&mut chunk)).await {
            Deadline::Completed(Ok(0)) => break,
            Deadline::Completed(Ok(n)) => n,
            Deadline::Completed(Err(source)) => {
                outcome.end = RelayEnd::Aborted(ProxyError::UpstreamIo {
                    host: origin.host.clone(),
                    port: origin.port,
                    source,
                });
                break;
            }
            Deadline::Elapsed { after, .. } => {
                tracing::warn!(
                    upstream = %origin,
                    timeout_secs = after.as_secs(),
                    bytes = outcome.bytes,
                    "Timed out reading upstream response"
                );
                outcome.end = RelayEnd::TimedOut;
                break;
            }
        };

        client
            .write_all(&chunk[..n])
            .await
            .map_err(ProxyError::ClientIo)?;

        if outcome.chunks == 0 {
            let status = status_code(&chunk[..n]).to_string();
            tracing::info!(status = %status, "Response received");
            outcome.status = Some(status);
        }
        outcome.chunks += 1;
        outcome.bytes += n as u64;

        if window_start.elapsed() > settings.long_transfer {
            tracing::info!(
                upstream = %origin,
                active_secs = settings.long_transfer.as_secs(),
                bytes = outcome.bytes,
                "Long-lived transfer still active"
            );
            outcome.notices += 1;
            window_start = Instant::now();
        }
    }

    client.flush().await.map_err(ProxyError::ClientIo)?;
    Ok(outcome)
}
