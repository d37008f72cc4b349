//! Request-line rewriting.
//!
//! Origin servers expect `METHOD /path?query VERSION`. Only the request
//! line is replaced; header lines and any buffered body bytes are copied
//! through untouched.

use url::Url;

use crate::http::request::{first_line, RequestLine};
use crate::proxy::target::{is_absolute_form, HTTP_SCHEME};

/// Origin-form (`/path[?query]`) equivalent of a request target.
///
/// Path and query bytes are taken from `target` as sent; nothing is
/// percent-encoded or normalized. Returns `None` when an absolute-form
/// target fails to parse.
pub fn origin_form(target: &str) -> Option<String> {
    let rest = if is_absolute_form(target) {
        Url::parse(target).ok()?;
        let after_scheme = &target[HTTP_SCHEME.len()..];
        let authority_end = after_scheme
            .find(['/', '?', '#'])
            .unwrap_or(after_scheme.len());
        &after_scheme[authority_end..]
    } else {
        target
    };

    let rest = rest.split_once('#').map_or(rest, |(before, _)| before);
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    let mut origin = if path.is_empty() { "/".to_string() } else { path.to_string() };
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        origin.push('?');
        origin.push_str(query);
    }
    Some(origin)
}

/// Replace the request line of `raw` with its origin-form equivalent.
///
/// Falls back to an unmodified copy when the target can't be rewritten.
pub fn rewrite_request(raw: &[u8], line: &RequestLine) -> Vec<u8> {
    let Some(path) = origin_form(&line.target) else {
        tracing::debug!(uri = %line.target, "Target not rewritable, forwarding as-is");
        return raw.to_vec();
    };

    let rest = &raw[first_line(raw).len()..];
    let new_line = format!("{} {} {}", line.method, path, line.version);

    let mut rewritten = Vec::with_capacity(new_line.len() + rest.len());
    rewritten.extend_from_slice(new_line.as_bytes());
    rewritten.extend_from_slice(rest);
    rewritten
}
