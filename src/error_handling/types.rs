//! Error type definitions.
//!
//! This module defines all error types used throughout the library.

use log::SetLoggerError;
use thiserror::Error;

/// Failures raised directly by lifecycle operations.
#[derive(Error, Debug)]
pub enum XhrError {
    /// `set_request_header` or `send` called outside `OPENED`, or while a
    /// send is already in flight.
    #[error("INVALID_STATE_ERR")]
    InvalidState,

    /// `set_request_header` called with a forbidden header name.
    #[error("Refused to set unsafe header \"{0}\"")]
    UnsafeHeader(String),

    /// A body was delivered to an exchange that already reached `DONE`.
    #[error("Request done")]
    RequestDone,

    /// A body was delivered to an async exchange before its headers.
    #[error("No headers received")]
    NoHeadersReceived,

    /// The response body is not text.
    #[error("Attempted to respond with {0}, which is not a string")]
    InvalidBody(String),

    /// The transport collaborator failed while handling a sent exchange.
    #[error("Transport error: {0}")]
    Transport(#[from] anyhow::Error),
}

impl XhrError {
    /// Returns the stable name of the failure condition.
    pub fn name(&self) -> &'static str {
        match self {
            XhrError::InvalidState => "InvalidStateError",
            XhrError::UnsafeHeader(_) => "UnsafeHeaderError",
            XhrError::RequestDone => "RequestDoneError",
            XhrError::NoHeadersReceived => "NoHeadersReceivedError",
            XhrError::InvalidBody(_) => "InvalidBodyException",
            XhrError::Transport(_) => "TransportError",
        }
    }
}

/// Error returned by a [`crate::DocumentParser`].
///
/// Never escapes `respond`: a failed parse only leaves the document unset.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The text is not well-formed XML.
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// The parser refused the input for another reason.
    #[error("Document rejected: {0}")]
    Rejected(String),
}

/// Error types for initialization failures.
///
/// Invalid exchange configuration is reported by [`crate::XhrFactory::new`]
/// as a [`ConfigValidationError`], not through this type.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// A configuration field that failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid value for {field}: {message}")]
pub struct ConfigValidationError {
    /// Name of the offending field
    pub field: &'static str,
    /// What is wrong and what values are accepted
    pub message: String,
}

impl ConfigValidationError {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}
