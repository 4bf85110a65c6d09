//! fake_xhr library: a controllable stand-in for a browser `XMLHttpRequest`
//!
//! This library emulates the request lifecycle of a browser request object so
//! that code built on top of one can be exercised without a network. Calling
//! code drives the exchange (`open`, `set_request_header`, `send`), and a
//! [`Transport`] or the test itself decides how it ends (`respond`, `abort`).
//! Every transition is observable through the same events a real request
//! object fires.
//!
//! # Example
//!
//! ```
//! use fake_xhr::{EventRecorder, FakeXhr, HeaderList, ReadyState};
//!
//! let xhr = FakeXhr::new();
//! let recorder = EventRecorder::attach(&xhr);
//!
//! xhr.open("GET", "/feed.xml");
//! xhr.send(None)?;
//! xhr.respond(
//!     200,
//!     HeaderList::from([("Content-Type", "application/xml")]),
//!     "<feed><title>News</title></feed>",
//! )?;
//!
//! assert_eq!(xhr.ready_state(), ReadyState::Done);
//! let document = xhr.response_xml().expect("XML body is parsed");
//! assert_eq!(document.find("title").map(|title| title.text()), Some("News".to_string()));
//! assert_eq!(
//!     recorder.event_types().last().map(String::as_str),
//!     Some("loadend")
//! );
//! # Ok::<(), fake_xhr::XhrError>(())
//! ```
//!
//! # Threading
//!
//! Request objects are single-threaded (`!Send`): listeners run synchronously
//! inside the operation that fired them and may call back into the same
//! instance.

#![warn(missing_docs)]

pub mod config;
mod document;
mod error_handling;
mod events;
pub mod initialization;
mod status;
mod transport;
mod xhr;

// Re-export public API
pub use config::{LogFormat, LogLevel, XhrConfig};
pub use document::{DocumentParser, XmlDocument, XmlElement, XmlNode, XmlParser};
pub use error_handling::{ConfigValidationError, DocumentError, InitializationError, XhrError};
pub use events::{listener, Event, EventListener, EventRecorder, EventType, RecordedEvent};
pub use status::status_text;
pub use transport::{PendingExchanges, Transport};
pub use xhr::{
    ExchangeSnapshot, FakeResponse, FakeXhr, HeaderList, OpenOptions, ReadyState, ResponseBody,
    XhrFactory,
};
