//! Logger initialization.
//!
//! This module provides functions to initialize the logger with custom formatting.

use std::io::Write;

use crate::config::{LogFormat, LogLevel};
use crate::error_handling::InitializationError;
use colored::*;
use log::LevelFilter;

/// Initializes the logger from the library's own option types.
///
/// # Errors
///
/// See [`init_logger_with`].
pub fn init_logger(level: LogLevel, format: LogFormat) -> Result<(), InitializationError> {
    init_logger_with(level.into(), format)
}

/// Initializes the logger with the specified level and format.
///
/// Configures `env_logger` with custom formatting. Supports both plain text
/// (with colors) and JSON formats for structured logging.
///
/// The logger reads from the `RUST_LOG` environment variable by default, but
/// the provided `level` overrides it for this crate's own records. Lifecycle
/// transitions and dispatches are logged at `trace`, operation summaries at
/// `debug`, and refused headers at `warn`.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a global logger is already
/// installed.
///
/// # Examples
///
/// ```bash
/// # Per-exchange summaries while running a test suite
/// RUST_LOG=fake_xhr=debug cargo test
///
/// # Every readyState transition and dispatch
/// RUST_LOG=fake_xhr=trace cargo test
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    // Read from RUST_LOG environment variable first, then override for this crate
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_module("fake_xhr", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{{\"ts\":{},\"level\":\"{}\",\"target\":\"{}\",\"msg\":{}}}",
                    chrono::Utc::now().timestamp_millis(),
                    record.level(),
                    record.target(),
                    serde_json::to_string(&record.args().to_string())
                        .unwrap_or_else(|_| "\"\"".into())
                )
            });
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                let level = record.level();
                let colored_level = match level {
                    log::Level::Error => level.to_string().red(),
                    log::Level::Warn => level.to_string().yellow(),
                    log::Level::Info => level.to_string().green(),
                    log::Level::Debug => level.to_string().blue(),
                    log::Level::Trace => level.to_string().purple(),
                };

                writeln!(
                    buf,
                    "{} [{}] {}",
                    record.target().cyan(),
                    colored_level,
                    record.args()
                )
            });
        }
    }

    // try_init: test binaries may initialize more than once
    builder.try_init().map_err(InitializationError::from)?;

    Ok(())
}
