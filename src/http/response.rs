//! Response helpers.
//!
//! The proxy never rewrites upstream responses. It only peeks at the first
//! chunk's status line for logging, and synthesizes a single response of
//! its own: `502 Bad Gateway`.

use crate::http::request::first_line;

/// Placeholder logged when the upstream status line can't be read.
pub const UNKNOWN_STATUS: &str = "???";

/// Status code token from the first line of an upstream response chunk.
pub fn status_code(first_chunk: &[u8]) -> &str {
    std::str::from_utf8(first_line(first_chunk))
        .ok()
        .and_then(|line| line.split(' ').nth(1))
        .filter(|code| !code.is_empty())
        .unwrap_or(UNKNOWN_STATUS)
}

/// Build a `502 Bad Gateway` carrying at most `max_chars` characters of `detail`.
pub fn bad_gateway(detail: &str, max_chars: usize) -> Vec<u8> {
    let truncated: String = detail.chars().take(max_chars).collect();
    let body = format!("Error: {}", truncated);
    format!(
        "HTTP/1.1 502 Bad Gateway\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        body.len(),
        body
    )
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(response: &[u8]) -> (String, Vec<u8>) {
        let text = String::from_utf8(response.to_vec()).unwrap();
        let (head, body) = text.split_once("\r\n\r\n").unwrap();
        (head.to_string(), body.as_bytes().to_vec())
    }

    fn content_length(head: &str) -> usize {
        head.lines()
            .find_map(|l| l.strip_prefix("Content-Length: "))
            .unwrap()
            .parse()
            .unwrap()
    }

    #[test]
    fn status_from_first_chunk() {
        assert_eq!(status_code(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n"), "200");
        assert_eq!(status_code(b"HTTP/1.0 404 Not Found"), "404");
        assert_eq!(status_code(b"garbage"), UNKNOWN_STATUS);
        assert_eq!(status_code(b"\xff\xfe 200"), UNKNOWN_STATUS);
        assert_eq!(status_code(b""), UNKNOWN_STATUS);
    }

    #[test]
    fn bad_gateway_content_length_matches_body() {
        let response = bad_gateway("Connection refused (os error 111)", 100);
        let (head, body) = split(&response);
        assert!(head.starts_with("HTTP/1.1 502 Bad Gateway\r\n"));
        assert_eq!(content_length(&head), body.len());
        assert_eq!(body, b"Error: Connection refused (os error 111)");
    }

    #[test]
    fn bad_gateway_truncates_by_characters() {
        let detail = "é".repeat(150);
        let (head, body) = split(&bad_gateway(&detail, 100));
        let body = String::from_utf8(body).unwrap();
        assert_eq!(body.chars().count(), "Error: ".len() + 100);
        assert_eq!(content_length(&head), body.len());
    }
}
