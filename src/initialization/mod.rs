//! Process-wide setup.
//!
//! Request objects need no global initialization; this module only wires up
//! logging for binaries and test harnesses that want to see the lifecycle
//! trace emitted through the `log` facade.

mod logger;

// Re-export public API
pub use logger::{init_logger, init_logger_with};
