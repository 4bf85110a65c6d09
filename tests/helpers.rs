// Shared test helpers for building exchanges in a known state.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::cell::RefCell;
use std::rc::Rc;

use fake_xhr::{EventRecorder, EventType, FakeXhr, ReadyState};

/// Opens and sends a body-less async request, then attaches a recorder so
/// only events from `respond`/`abort` onwards are captured.
#[allow(dead_code)] // Used by other test files
pub fn sent_exchange(method: &str, url: &str) -> (FakeXhr, Rc<EventRecorder>) {
    let xhr = FakeXhr::new();
    xhr.open(method, url);
    xhr.send(None).expect("send from OPENED succeeds");
    let recorder = EventRecorder::attach(&xhr);
    (xhr, recorder)
}

/// Records `(event name, readyState)` pairs seen by a plain closure listener.
#[allow(dead_code)] // Used by other test files
pub fn trace_events(xhr: &FakeXhr) -> Rc<RefCell<Vec<(String, ReadyState)>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    for kind in [
        EventType::ReadyStateChange,
        EventType::LoadStart,
        EventType::Load,
        EventType::Abort,
        EventType::LoadEnd,
    ] {
        let seen = Rc::clone(&seen);
        xhr.on(kind, move |event| {
            let state = event
                .target()
                .map(FakeXhr::ready_state)
                .unwrap_or_default();
            seen.borrow_mut().push((event.event_type().to_string(), state));
        });
    }
    seen
}
