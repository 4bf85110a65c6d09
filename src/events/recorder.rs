//! Event recording for ordering assertions.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;
use strum::IntoEnumIterator;

use super::{Event, EventListener, EventType};
use crate::{FakeXhr, ReadyState};

/// One observed dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedEvent {
    /// Event name
    pub event_type: String,
    /// Ready state of the target when the event was dispatched
    pub ready_state: Option<ReadyState>,
}

/// Records every lifecycle event dispatched on an exchange.
///
/// # Examples
///
/// ```
/// use fake_xhr::{EventRecorder, EventType, FakeXhr};
///
/// let xhr = FakeXhr::new();
/// let recorder = EventRecorder::attach(&xhr);
/// xhr.open("GET", "/ping");
/// assert_eq!(recorder.count(EventType::ReadyStateChange), 1);
/// ```
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: RefCell<Vec<RecordedEvent>>,
}

impl EventRecorder {
    /// Creates a recorder and registers it for every [`EventType`] on `xhr`.
    pub fn attach(xhr: &FakeXhr) -> Rc<Self> {
        let recorder = Rc::new(Self::default());
        for kind in EventType::iter() {
            xhr.add_event_listener(kind, recorder.clone());
        }
        recorder
    }

    /// All recorded events in dispatch order.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    /// Recorded event names in dispatch order.
    pub fn event_types(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .map(|event| event.event_type.clone())
            .collect()
    }

    /// Ready states seen by `readystatechange` dispatches, in order.
    pub fn ready_states(&self) -> Vec<ReadyState> {
        let name = EventType::ReadyStateChange.as_ref();
        self.events
            .borrow()
            .iter()
            .filter(|event| event.event_type == name)
            .filter_map(|event| event.ready_state)
            .collect()
    }

    /// Number of recorded events of `kind`.
    pub fn count(&self, kind: EventType) -> usize {
        let name = kind.as_ref();
        self.events
            .borrow()
            .iter()
            .filter(|event| event.event_type == name)
            .count()
    }

    /// Per-kind counts, with every [`EventType`] present.
    pub fn counts(&self) -> HashMap<EventType, usize> {
        EventType::iter()
            .map(|kind| (kind, self.count(kind)))
            .collect()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl EventListener for EventRecorder {
    fn handle_event(&self, event: &mut Event) {
        let ready_state = event.target().map(FakeXhr::ready_state);
        self.events.borrow_mut().push(RecordedEvent {
            event_type: event.event_type().to_string(),
            ready_state,
        });
    }
}
