//! Event bus for emulated exchanges.
//!
//! This module provides:
//! - [`Event`] and the lifecycle [`EventType`] names
//! - The [`EventListener`] trait (closures and handler objects)
//! - [`EventRecorder`], a listener that captures dispatch order for assertions
//!
//! Dispatch itself lives on [`crate::FakeXhr`], which owns the registry.

mod event;
mod listener;
mod recorder;

// Re-export public API
pub use event::{Event, EventType};
pub use listener::{listener, EventListener};
pub use recorder::{EventRecorder, RecordedEvent};

pub(crate) use listener::ListenerRegistry;
