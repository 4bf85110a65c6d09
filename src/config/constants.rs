//! Configuration constants.
//!
//! This module defines the defaults used by every emulated exchange when the
//! caller does not override them.

/// Number of characters appended to the response text per delivery step.
///
/// Each step is preceded by a `readystatechange` dispatch at `LOADING` for
/// asynchronous exchanges, so this controls how many intermediate progress
/// events a listener observes.
pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// Status code used when a response does not name one.
pub const DEFAULT_STATUS: u16 = 200;

/// Content type given to request bodies that were sent without one.
pub const DEFAULT_REQUEST_CONTENT_TYPE: &str = "text/plain;charset=utf-8";

/// Charset parameter appended to an explicit request content type.
pub const REQUEST_CHARSET_SUFFIX: &str = ";charset=utf-8";

/// Methods that never carry a request body (matched case-insensitively).
pub const BODYLESS_METHODS: &[&str] = &["GET", "HEAD"];

/// Pattern deciding whether a response content type is worth parsing as XML.
///
/// Unanchored: `application/atom+xml; charset=utf-8` matches.
pub const XML_CONTENT_TYPE_PATTERN: &str = r"(text/xml)|(application/xml)|(\+xml)";
