//! HTTP header name constants.
//!
//! This module defines the header names the lifecycle reads or writes itself,
//! plus the request headers calling code is never allowed to set.

/// Content-Type header
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
/// Set-Cookie header (hidden from response header accessors)
pub const HEADER_SET_COOKIE: &str = "Set-Cookie";
/// Set-Cookie2 header (hidden from response header accessors)
pub const HEADER_SET_COOKIE2: &str = "Set-Cookie2";

/// Request headers a real browser refuses to let scripts set.
///
/// Matched case-insensitively. To add/remove headers, modify this array.
pub const UNSAFE_HEADERS: &[&str] = &[
    "Accept-Charset",
    "Accept-Encoding",
    "Connection",
    "Content-Length",
    "Cookie",
    "Cookie2",
    "Content-Transfer-Encoding",
    "Date",
    "Expect",
    "Host",
    "Keep-Alive",
    "Referer",
    "TE",
    "Trailer",
    "Transfer-Encoding",
    "Upgrade",
    "User-Agent",
    "Via",
];

/// Header name prefixes that are always refused (matched case-insensitively).
pub const UNSAFE_HEADER_PREFIXES: &[&str] = &["Sec-", "Proxy-"];

/// Response headers that are never exposed to calling code.
pub const HIDDEN_RESPONSE_HEADERS: &[&str] = &[HEADER_SET_COOKIE, HEADER_SET_COOKIE2];

/// Returns `true` if calling code may not set `name` as a request header.
pub fn is_unsafe_header(name: &str) -> bool {
    if UNSAFE_HEADERS
        .iter()
        .any(|unsafe_name| unsafe_name.eq_ignore_ascii_case(name))
    {
        return true;
    }
    UNSAFE_HEADER_PREFIXES.iter().any(|prefix| {
        name.len() >= prefix.len()
            && name.is_char_boundary(prefix.len())
            && name[..prefix.len()].eq_ignore_ascii_case(prefix)
    })
}

/// Returns `true` if `name` is a response header hidden from calling code.
pub fn is_hidden_response_header(name: &str) -> bool {
    HIDDEN_RESPONSE_HEADERS
        .iter()
        .any(|hidden| hidden.eq_ignore_ascii_case(name))
}
