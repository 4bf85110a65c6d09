//! Library configuration and constants.
//!
//! This module provides:
//! - Configuration constants (default chunk size, content types)
//! - HTTP header name constants and the unsafe request-header policy
//! - Configuration and logging option types

mod constants;
mod headers;
mod types;

// Re-export all constants
pub use constants::*;
pub use headers::*;
pub use types::{LogFormat, LogLevel, XhrConfig};
