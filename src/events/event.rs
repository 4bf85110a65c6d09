//! Event objects.

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::FakeXhr;

/// Lifecycle events fired by an exchange.
///
/// Each of these also triggers the matching `on<event>` callback slot (see
/// [`FakeXhr::set_handler`]). Calling code may dispatch events with other
/// names; those only reach listeners registered under the same name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter, Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// The ready state changed
    ReadyStateChange,
    /// A send started
    LoadStart,
    /// The response finished loading
    Load,
    /// The exchange was aborted
    Abort,
    /// The exchange ended after `load`
    LoadEnd,
}

/// An event passed to listeners.
///
/// Events fired by the lifecycle never bubble, are not cancelable, and carry
/// the originating exchange as their target.
#[derive(Debug, Clone)]
pub struct Event {
    event_type: String,
    bubbles: bool,
    cancelable: bool,
    target: Option<FakeXhr>,
    default_prevented: bool,
}

impl Event {
    /// Creates a non-bubbling, non-cancelable event without a target.
    ///
    /// [`FakeXhr::dispatch_event`] fills in the target when it is missing.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self::with_flags(event_type, false, false)
    }

    /// Creates an event with explicit bubbles/cancelable flags.
    pub fn with_flags(event_type: impl Into<String>, bubbles: bool, cancelable: bool) -> Self {
        Self {
            event_type: event_type.into(),
            bubbles,
            cancelable,
            target: None,
            default_prevented: false,
        }
    }

    pub(crate) fn lifecycle(kind: EventType, target: &FakeXhr) -> Self {
        Self::new(kind.as_ref()).with_target(target.clone())
    }

    /// Sets the exchange this event originates from.
    pub fn with_target(mut self, target: FakeXhr) -> Self {
        self.target = Some(target);
        self
    }

    /// Event name, e.g. `"readystatechange"`.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The lifecycle kind, if the name is one of [`EventType`].
    pub fn kind(&self) -> Option<EventType> {
        self.event_type.parse().ok()
    }

    /// Whether the event bubbles.
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Whether the event is cancelable.
    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    /// The originating exchange.
    pub fn target(&self) -> Option<&FakeXhr> {
        self.target.as_ref()
    }

    /// Whether a listener called [`Event::prevent_default`].
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Marks the event's default action as prevented.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// No-op: there is no tree to propagate through.
    pub fn stop_propagation(&mut self) {}

    pub(crate) fn set_target_if_missing(&mut self, target: &FakeXhr) {
        if self.target.is_none() {
            self.target = Some(target.clone());
        }
    }
}
