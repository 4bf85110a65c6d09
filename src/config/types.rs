//! Configuration types.
//!
//! This module defines the per-instance exchange configuration and the
//! logging options accepted by [`crate::initialization::init_logger_with`].

use strum_macros::{Display, EnumIter, EnumString};

use crate::config::constants::DEFAULT_CHUNK_SIZE;
use crate::error_handling::ConfigValidationError;

/// Logging level for the library.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Per-instance exchange configuration.
///
/// # Examples
///
/// ```
/// use fake_xhr::XhrConfig;
///
/// let config = XhrConfig {
///     chunk_size: 3,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XhrConfig {
    /// Characters delivered per body chunk
    pub chunk_size: usize,

    /// Attempt to parse XML-family response bodies into a document
    pub parse_xml: bool,

    /// Async flag used by `open` when the caller does not pass one
    pub default_async: bool,
}

impl Default for XhrConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            parse_xml: true,
            default_async: true,
        }
    }
}

impl XhrConfig {
    /// Checks the configuration for values no exchange could work with.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigValidationError`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.chunk_size == 0 {
            return Err(ConfigValidationError::new(
                "chunk_size",
                format!(
                    "chunk_size must be greater than 0 (default is {DEFAULT_CHUNK_SIZE})"
                ),
            ));
        }
        Ok(())
    }
}
