//! Inbound request handling.
//!
//! # Responsibilities
//! - Accumulate client bytes until the header block is complete
//! - Parse the request line into method, target and version
//! - Extract the `Host` header for origin-form targets
//!
//! # Design Decisions
//! - Nothing is parsed until the blank-line terminator has been seen
//! - Bytes after the terminator are kept verbatim and forwarded untouched
//! - The header buffer is unbounded unless a cap is configured

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::ProxyError;

/// Marks the end of the header block.
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

const LINE_END: &[u8] = b"\r\n";

/// Everything read from the client before forwarding begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    bytes: Vec<u8>,
    head_len: usize,
}

impl RawRequest {
    /// Wrap bytes that contain a complete header block.
    ///
    /// Returns `None` if the terminator is missing.
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        let head_len = find_terminator(&bytes, 0)?;
        Some(Self { bytes, head_len })
    }

    /// Request line and headers, including the terminating blank line.
    pub fn head(&self) -> &[u8] {
        &self.bytes[..self.head_len]
    }

    /// Body bytes that arrived together with the headers.
    pub fn body_prefix(&self) -> &[u8] {
        &self.bytes[self.head_len..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Index just past the first `\r\n\r\n` at or after `from`.
fn find_terminator(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?
        .windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
        .map(|pos| from + pos + HEADER_TERMINATOR.len())
}

/// Read from `reader` in `chunk_size` pieces until the header block is complete.
///
/// A peer that closes first, whether or not it sent anything, yields
/// [`ProxyError::ClientDisconnected`]. When `max_header_bytes` is set, a
/// header block that outgrows it yields [`ProxyError::MalformedRequest`].
pub async fn read_request_head<R>(
    reader: &mut R,
    chunk_size: usize,
    max_header_bytes: Option<usize>,
) -> Result<RawRequest, ProxyError>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::with_capacity(chunk_size);
    let mut chunk = vec![0u8; chunk_size];

    loop {
        let n = reader.read(&mut chunk).await.map_err(ProxyError::ClientIo)?;
        if n == 0 {
            return Err(ProxyError::ClientDisconnected);
        }

        // The terminator may straddle the previous chunk boundary.
        let search_from = bytes.len().saturating_sub(HEADER_TERMINATOR.len() - 1);
        bytes.extend_from_slice(&chunk[..n]);

        let found = find_terminator(&bytes, search_from);
        if let Some(cap) = max_header_bytes {
            if found.map_or(bytes.len() >= cap, |end| end > cap) {
                return Err(ProxyError::MalformedRequest(format!(
                    "header block exceeds {} bytes",
                    cap
                )));
            }
        }
        if let Some(head_len) = found {
            return Ok(RawRequest { bytes, head_len });
        }
    }
}

/// The three tokens of an HTTP request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    pub version: String,
}

impl RequestLine {
    /// Parse the first line of `head`.
    pub fn parse(head: &[u8]) -> Result<Self, ProxyError> {
        let line = std::str::from_utf8(first_line(head))
            .map_err(|_| ProxyError::MalformedRequest("request line is not valid UTF-8".into()))?;

        let mut tokens = line.split(' ');
        match (tokens.next(), tokens.next(), tokens.next(), tokens.next()) {
            (Some(method), Some(target), Some(version), None)
                if !method.is_empty() && !target.is_empty() && !version.is_empty() =>
            {
                Ok(Self {
                    method: method.to_string(),
                    target: target.to_string(),
                    version: version.to_string(),
                })
            }
            _ => Err(ProxyError::MalformedRequest(format!(
                "expected 'METHOD TARGET VERSION', got {:?}",
                line
            ))),
        }
    }
}

impl std::fmt::Display for RequestLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.method, self.target, self.version)
    }
}

/// Bytes of `buf` up to, not including, the first line terminator.
pub fn first_line(buf: &[u8]) -> &[u8] {
    match buf.windows(LINE_END.len()).position(|w| w == LINE_END) {
        Some(end) => &buf[..end],
        None => buf,
    }
}

/// Trimmed value of the first `Host` header in `head`, if non-empty.
///
/// Only header lines are scanned: the request line is skipped and the
/// scan stops at the blank line ending the block.
pub fn host_header(head: &[u8]) -> Option<String> {
    head.split(|&b| b == b'\n')
        .skip(1)
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .take_while(|line| !line.is_empty())
        .find(|line| line.len() >= 5 && line[..5].eq_ignore_ascii_case(b"host:"))
        .map(|line| String::from_utf8_lossy(&line[5..]).trim().to_string())
        .filter(|host| !host.is_empty())
}
