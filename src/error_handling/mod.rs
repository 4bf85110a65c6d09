//! Error types.
//!
//! This module provides:
//! - The synchronous failures raised by lifecycle operations
//! - Document parsing failures (recoverable, never surfaced by `respond`)
//! - Logger and configuration setup failures
//!
//! Lifecycle failures are caller-programming errors: they are returned from
//! the violating call and are never retried or recovered internally.

mod types;

// Re-export public API
pub use types::{ConfigValidationError, DocumentError, InitializationError, XhrError};
