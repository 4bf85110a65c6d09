//! The emulated request object.
//!
//! [`FakeXhr`] is a cheap, clonable handle to one request lifecycle. Clones
//! share state, which is how listeners and the transport reach the exchange
//! an event came from. State lives behind `RefCell`s and no borrow is held
//! while a listener or callback runs, so callbacks may call back into any
//! operation (including `abort` in the middle of `respond`).
//!
//! Operations are split by side:
//! - `request.rs`: `open`, `set_request_header`, `send`, `abort`
//! - `response.rs`: `respond`, body delivery, response header accessors

mod factory;
mod headers;
mod request;
mod response;
mod state;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use log::trace;
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::config::{is_hidden_response_header, XhrConfig};
use crate::document::{DocumentParser, XmlDocument, XmlParser};
use crate::events::{Event, EventListener, EventType, ListenerRegistry};
use crate::transport::Transport;

pub use factory::XhrFactory;
pub use headers::HeaderList;
pub use response::{FakeResponse, ResponseBody};
pub use state::{OpenOptions, ReadyState};

use state::ExchangeState;

/// Callback for an `on<event>` slot.
type SlotCallback = Rc<dyn Fn(&mut Event)>;
/// Callback receiving the exchange itself.
type ExchangeCallback = Rc<dyn Fn(&FakeXhr)>;

#[derive(Default)]
struct Callbacks {
    slots: HashMap<EventType, SlotCallback>,
    on_send: Option<ExchangeCallback>,
    on_error: Option<ExchangeCallback>,
    on_complete: Option<ExchangeCallback>,
}

struct XhrInner {
    state: RefCell<ExchangeState>,
    listeners: RefCell<ListenerRegistry>,
    callbacks: RefCell<Callbacks>,
    transport: RefCell<Option<Rc<dyn Transport>>>,
    parser: Rc<dyn DocumentParser>,
    config: XhrConfig,
}

/// A controllable stand-in for a browser `XMLHttpRequest`.
///
/// # Examples
///
/// ```
/// use fake_xhr::{FakeXhr, HeaderList, ReadyState};
///
/// let xhr = FakeXhr::new();
/// xhr.open("GET", "/greeting");
/// xhr.send(None)?;
/// xhr.respond(200, HeaderList::from([("Content-Type", "text/plain")]), "hello")?;
///
/// assert_eq!(xhr.ready_state(), ReadyState::Done);
/// assert_eq!(xhr.status_text(), "OK");
/// assert_eq!(xhr.response_text().as_deref(), Some("hello"));
/// # Ok::<(), fake_xhr::XhrError>(())
/// ```
#[derive(Clone)]
pub struct FakeXhr {
    inner: Rc<XhrInner>,
}

/// Point-in-time copy of an exchange, for logging and assertions.
///
/// Response headers exclude `Set-Cookie`/`Set-Cookie2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeSnapshot {
    /// Current ready state
    pub ready_state: ReadyState,
    /// Request method
    pub method: Option<String>,
    /// Request URL
    pub url: Option<String>,
    /// Async flag
    pub is_async: bool,
    /// Request headers in insertion order
    pub request_headers: Vec<(String, String)>,
    /// Request body
    pub request_body: Option<String>,
    /// Response status (0 until a response arrives)
    pub status: u16,
    /// Response status text
    pub status_text: String,
    /// Exposed response headers
    pub response_headers: Vec<(String, String)>,
    /// Response text
    pub response_text: Option<String>,
    /// Whether the exchange was aborted
    pub aborted: bool,
}

/// Forwards a lifecycle event to the matching `on<event>` slot of the
/// instance that owns it, whatever the event's target.
///
/// Registered first for every [`EventType`], so the slot sees each event
/// before listeners added by calling code. Holds its owner weakly since the
/// owner holds the forwarder.
struct SlotForwarder {
    kind: EventType,
    owner: Weak<XhrInner>,
}

impl EventListener for SlotForwarder {
    fn handle_event(&self, event: &mut Event) {
        if let Some(inner) = self.owner.upgrade() {
            FakeXhr { inner }.invoke_slot(self.kind, event);
        }
    }
}

impl Default for FakeXhr {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeXhr {
    /// Creates an instance with the default configuration and no transport.
    ///
    /// Without a transport, `send` leaves the exchange pending until calling
    /// code invokes `respond` or `abort` itself.
    pub fn new() -> Self {
        Self::from_parts(XhrConfig::default(), None, Rc::new(XmlParser))
    }

    /// Creates an instance bound to `transport`.
    pub fn with_transport<T>(transport: T) -> Self
    where
        T: Transport + 'static,
    {
        Self::from_parts(XhrConfig::default(), Some(Rc::new(transport)), Rc::new(XmlParser))
    }

    pub(crate) fn from_parts(
        config: XhrConfig,
        transport: Option<Rc<dyn Transport>>,
        parser: Rc<dyn DocumentParser>,
    ) -> Self {
        let inner = Rc::new_cyclic(|owner: &Weak<XhrInner>| {
            let mut listeners = ListenerRegistry::default();
            for kind in EventType::iter() {
                let forwarder = SlotForwarder {
                    kind,
                    owner: owner.clone(),
                };
                listeners.add(kind.as_ref(), Rc::new(forwarder));
            }

            XhrInner {
                state: RefCell::new(ExchangeState::new(config.chunk_size, config.default_async)),
                listeners: RefCell::new(listeners),
                callbacks: RefCell::new(Callbacks::default()),
                transport: RefCell::new(transport),
                parser,
                config,
            }
        });

        Self { inner }
    }

    /// Replaces the transport that receives this instance on `send`.
    pub fn set_transport<T>(&self, transport: T)
    where
        T: Transport + 'static,
    {
        *self.inner.transport.borrow_mut() = Some(Rc::new(transport));
    }

    /// Whether `self` and `other` are handles to the same instance.
    pub fn same_instance(&self, other: &FakeXhr) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -- Event bus

    /// Appends `listener` to the list for `event_type`.
    ///
    /// The same listener may be registered several times and is then invoked
    /// once per registration.
    pub fn add_event_listener(&self, event_type: impl AsRef<str>, listener: Rc<dyn EventListener>) {
        self.inner
            .listeners
            .borrow_mut()
            .add(event_type.as_ref(), listener);
    }

    /// Registers a closure and returns its handle for later removal.
    pub fn on<F>(&self, event_type: impl AsRef<str>, f: F) -> Rc<dyn EventListener>
    where
        F: Fn(&mut Event) + 'static,
    {
        let handle: Rc<dyn EventListener> = Rc::new(f);
        self.add_event_listener(event_type, handle.clone());
        handle
    }

    /// Removes the first registration of `listener` for `event_type`.
    ///
    /// Handles are compared by identity; unknown listeners are ignored.
    pub fn remove_event_listener(&self, event_type: impl AsRef<str>, listener: &Rc<dyn EventListener>) {
        self.inner
            .listeners
            .borrow_mut()
            .remove(event_type.as_ref(), listener);
    }

    /// Invokes every listener registered for the event's type, in
    /// registration order, and returns whether any of them prevented the
    /// default action.
    ///
    /// The event's target is set to this instance if it has none. Listener
    /// panics are not caught.
    pub fn dispatch_event(&self, mut event: Event) -> bool {
        event.set_target_if_missing(self);
        self.dispatch(&mut event);
        event.default_prevented()
    }

    fn dispatch(&self, event: &mut Event) {
        let listeners = self.inner.listeners.borrow().snapshot(event.event_type());
        trace!(
            "Dispatching '{}' to {} listener(s)",
            event.event_type(),
            listeners.len()
        );
        for registered in listeners {
            registered.handle_event(event);
        }
    }

    fn fire(&self, kind: EventType) {
        self.dispatch(&mut Event::lifecycle(kind, self));
    }

    // -- Callback slots

    /// Sets the `on<event>` slot for a lifecycle event (`onload`,
    /// `onreadystatechange`, ...). The slot fires alongside bus listeners.
    pub fn set_handler<F>(&self, kind: EventType, f: F)
    where
        F: Fn(&mut Event) + 'static,
    {
        self.inner.callbacks.borrow_mut().slots.insert(kind, Rc::new(f));
    }

    /// Empties the `on<event>` slot for `kind`.
    pub fn clear_handler(&self, kind: EventType) {
        self.inner.callbacks.borrow_mut().slots.remove(&kind);
    }

    /// Hook invoked by `send` before `loadstart` is dispatched.
    pub fn set_on_send<F>(&self, f: F)
    where
        F: Fn(&FakeXhr) + 'static,
    {
        self.inner.callbacks.borrow_mut().on_send = Some(Rc::new(f));
    }

    /// Callback invoked at the end of `abort`.
    pub fn set_on_error<F>(&self, f: F)
    where
        F: Fn(&FakeXhr) + 'static,
    {
        self.inner.callbacks.borrow_mut().on_error = Some(Rc::new(f));
    }

    /// Callback invoked once `respond` has delivered the whole response.
    pub fn set_on_complete<F>(&self, f: F)
    where
        F: Fn(&FakeXhr) + 'static,
    {
        self.inner.callbacks.borrow_mut().on_complete = Some(Rc::new(f));
    }

    fn invoke_slot(&self, kind: EventType, event: &mut Event) {
        let slot = self.inner.callbacks.borrow().slots.get(&kind).cloned();
        if let Some(slot) = slot {
            slot(event);
        }
    }

    fn invoke_on_send(&self) {
        let hook = self.inner.callbacks.borrow().on_send.clone();
        if let Some(hook) = hook {
            hook(self);
        }
    }

    fn invoke_on_error(&self) {
        let callback = self.inner.callbacks.borrow().on_error.clone();
        if let Some(callback) = callback {
            callback(self);
        }
    }

    fn invoke_on_complete(&self) {
        let callback = self.inner.callbacks.borrow().on_complete.clone();
        if let Some(callback) = callback {
            callback(self);
        }
    }

    // -- Ready state transitions

    /// Moves to `state` and dispatches `readystatechange`; reaching `Done`
    /// also dispatches `load` then `loadend`.
    fn ready_state_change(&self, state: ReadyState) {
        let generation = self.generation();
        self.notify_ready_state(state);
        if state != ReadyState::Done {
            return;
        }
        // A listener may have aborted or reopened in the meantime
        if self.is_current(generation) {
            self.fire(EventType::Load);
        }
        if self.is_current(generation) {
            self.fire(EventType::LoadEnd);
        }
    }

    /// Moves to `state` and dispatches `readystatechange` only.
    fn notify_ready_state(&self, state: ReadyState) {
        self.inner.state.borrow_mut().ready_state = state;
        trace!("readyState -> {state}");
        self.fire(EventType::ReadyStateChange);
    }

    fn set_ready_state_silently(&self, state: ReadyState) {
        self.inner.state.borrow_mut().ready_state = state;
        trace!("readyState -> {state} (synchronous)");
    }

    fn generation(&self) -> u64 {
        self.inner.state.borrow().generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    // -- Accessors

    /// Current ready state.
    pub fn ready_state(&self) -> ReadyState {
        self.inner.state.borrow().ready_state
    }

    /// Method passed to the last `open`.
    pub fn method(&self) -> Option<String> {
        self.inner.state.borrow().method.clone()
    }

    /// URL passed to the last `open`.
    pub fn url(&self) -> Option<String> {
        self.inner.state.borrow().url.clone()
    }

    /// Async flag of the current exchange.
    pub fn is_async(&self) -> bool {
        self.inner.state.borrow().is_async
    }

    /// Username passed to the last `open`.
    pub fn username(&self) -> Option<String> {
        self.inner.state.borrow().username.clone()
    }

    /// Password passed to the last `open`.
    pub fn password(&self) -> Option<String> {
        self.inner.state.borrow().password.clone()
    }

    /// Request headers set so far.
    pub fn request_headers(&self) -> HeaderList {
        self.inner.state.borrow().request_headers.clone()
    }

    /// Value of one request header (case-insensitive).
    pub fn request_header(&self, name: &str) -> Option<String> {
        self.inner
            .state
            .borrow()
            .request_headers
            .get(name)
            .map(str::to_string)
    }

    /// Body passed to `send` for methods other than GET/HEAD.
    pub fn request_body(&self) -> Option<String> {
        self.inner.state.borrow().request_body.clone()
    }

    /// Whether an async send is awaiting a terminal state.
    pub fn send_flag(&self) -> bool {
        self.inner.state.borrow().send_flag
    }

    /// Whether the last exchange ended through `abort`.
    pub fn error_flag(&self) -> bool {
        self.inner.state.borrow().error_flag
    }

    /// Whether `abort` was called since the last `open`.
    pub fn aborted(&self) -> bool {
        self.inner.state.borrow().aborted
    }

    /// Response status, 0 until a response arrives.
    pub fn status(&self) -> u16 {
        self.inner.state.borrow().status
    }

    /// Canonical text for the response status; empty if unknown.
    pub fn status_text(&self) -> String {
        self.inner.state.borrow().status_text.clone()
    }

    /// Response text delivered so far. `None` before delivery and after abort.
    pub fn response_text(&self) -> Option<String> {
        self.inner.state.borrow().response_text.clone()
    }

    /// Parsed XML response, if the body was XML and parsed cleanly.
    pub fn response_xml(&self) -> Option<Rc<XmlDocument>> {
        self.inner.state.borrow().response_xml.clone()
    }

    /// Characters delivered per body chunk.
    pub fn chunk_size(&self) -> usize {
        self.inner.state.borrow().effective_chunk_size()
    }

    /// Sets the body chunk size; 0 restores the default.
    pub fn set_chunk_size(&self, chunk_size: usize) {
        self.inner.state.borrow_mut().chunk_size = chunk_size;
    }

    /// Copies the current state of the exchange.
    pub fn snapshot(&self) -> ExchangeSnapshot {
        let state = self.inner.state.borrow();
        let response_headers = state
            .response_headers
            .as_ref()
            .filter(|_| state.ready_state >= ReadyState::HeadersReceived)
            .map(|headers| {
                headers
                    .iter()
                    .filter(|(name, _)| !is_hidden_response_header(name))
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        ExchangeSnapshot {
            ready_state: state.ready_state,
            method: state.method.clone(),
            url: state.url.clone(),
            is_async: state.is_async,
            request_headers: state.request_headers.to_vec(),
            request_body: state.request_body.clone(),
            status: state.status,
            status_text: state.status_text.clone(),
            response_headers,
            response_text: state.response_text.clone(),
            aborted: state.aborted,
        }
    }
}

impl fmt::Debug for FakeXhr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.state.try_borrow() {
            Ok(state) => f
                .debug_struct("FakeXhr")
                .field("ready_state", &state.ready_state)
                .field("method", &state.method)
                .field("url", &state.url)
                .field("status", &state.status)
                .finish(),
            Err(_) => f.debug_struct("FakeXhr").finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_new_instance_is_unsent() {
        let xhr = FakeXhr::new();
        assert_eq!(xhr.ready_state(), ReadyState::Unsent);
        assert_eq!(xhr.status(), 0);
        assert_eq!(xhr.status_text(), "");
        assert!(xhr.request_headers().is_empty());
        assert_eq!(xhr.request_body(), None);
        assert_eq!(xhr.response_text(), None);
        assert!(xhr.is_async());
    }

    #[test]
    fn test_clones_share_state() {
        let xhr = FakeXhr::new();
        let other = xhr.clone();
        xhr.open("GET", "/shared");
        assert_eq!(other.ready_state(), ReadyState::Opened);
        assert!(xhr.same_instance(&other));
        assert!(!xhr.same_instance(&FakeXhr::new()));
    }

    #[test]
    fn test_dispatch_runs_listeners_in_order() {
        let xhr = FakeXhr::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let seen = Rc::clone(&seen);
            xhr.on("custom", move |_| seen.borrow_mut().push(tag));
        }

        assert!(!xhr.dispatch_event(Event::new("custom")));
        assert_eq!(*seen.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_dispatch_reports_prevent_default() {
        let xhr = FakeXhr::new();
        xhr.on("submit", |event| event.prevent_default());
        assert!(xhr.dispatch_event(Event::new("submit")));
        assert!(!xhr.dispatch_event(Event::new("other")));
    }

    #[test]
    fn test_dispatch_sets_missing_target() {
        let xhr = FakeXhr::new();
        let matched = Rc::new(Cell::new(false));
        let matched_in_listener = Rc::clone(&matched);
        let expected = xhr.clone();
        xhr.on("ping", move |event| {
            let same = event.target().is_some_and(|t| t.same_instance(&expected));
            matched_in_listener.set(same);
        });
        xhr.dispatch_event(Event::new("ping"));
        assert!(matched.get());
    }

    #[test]
    fn test_same_listener_fires_once_per_registration() {
        let xhr = FakeXhr::new();
        let calls = Rc::new(Cell::new(0));
        let calls_in_listener = Rc::clone(&calls);
        let handle = crate::events::listener(move |_| calls_in_listener.set(calls_in_listener.get() + 1));
        xhr.add_event_listener("load", handle.clone());
        xhr.add_event_listener("load", handle.clone());

        xhr.dispatch_event(Event::new("load"));
        assert_eq!(calls.get(), 2);

        xhr.remove_event_listener("load", &handle);
        xhr.dispatch_event(Event::new("load"));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_slot_and_listener_both_fire() {
        let xhr = FakeXhr::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let listener_order = Rc::clone(&order);
        xhr.on(EventType::Load, move |_| listener_order.borrow_mut().push("listener"));
        let slot_order = Rc::clone(&order);
        xhr.set_handler(EventType::Load, move |_| slot_order.borrow_mut().push("onload"));

        xhr.dispatch_event(Event::new("load"));
        // Slot forwarder is registered at construction, ahead of the listener
        assert_eq!(*order.borrow(), vec!["onload", "listener"]);

        xhr.clear_handler(EventType::Load);
        order.borrow_mut().clear();
        xhr.dispatch_event(Event::new("load"));
        assert_eq!(*order.borrow(), vec!["listener"]);
    }

    #[test]
    fn test_slot_of_dispatching_instance_fires_for_foreign_target() {
        let dispatcher = FakeXhr::new();
        let target = FakeXhr::new();
        let dispatcher_loads = Rc::new(Cell::new(0));
        let target_loads = Rc::new(Cell::new(0));
        let dispatcher_loads_in_slot = Rc::clone(&dispatcher_loads);
        dispatcher.set_handler(EventType::Load, move |_| {
            dispatcher_loads_in_slot.set(dispatcher_loads_in_slot.get() + 1)
        });
        let target_loads_in_slot = Rc::clone(&target_loads);
        target.set_handler(EventType::Load, move |_| {
            target_loads_in_slot.set(target_loads_in_slot.get() + 1)
        });

        dispatcher.dispatch_event(Event::new("load").with_target(target.clone()));
        assert_eq!(dispatcher_loads.get(), 1);
        assert_eq!(target_loads.get(), 0);
    }

    #[test]
    fn test_dropped_instance_is_freed() {
        let xhr = FakeXhr::new();
        xhr.set_handler(EventType::Load, |_| {});
        let weak = Rc::downgrade(&xhr.inner);
        drop(xhr);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_listener_may_register_during_dispatch() {
        let xhr = FakeXhr::new();
        let late_calls = Rc::new(Cell::new(0));
        let late_calls_outer = Rc::clone(&late_calls);
        let target = xhr.clone();
        xhr.on("tick", move |_| {
            let late_calls = Rc::clone(&late_calls_outer);
            target.on("tick", move |_| late_calls.set(late_calls.get() + 1));
        });

        // Listeners added during a dispatch only see later dispatches
        xhr.dispatch_event(Event::new("tick"));
        assert_eq!(late_calls.get(), 0);
        xhr.dispatch_event(Event::new("tick"));
        assert_eq!(late_calls.get(), 1);
    }

    #[test]
    fn test_chunk_size_accessors() {
        let xhr = FakeXhr::new();
        assert_eq!(xhr.chunk_size(), 10);
        xhr.set_chunk_size(4);
        assert_eq!(xhr.chunk_size(), 4);
        xhr.set_chunk_size(0);
        assert_eq!(xhr.chunk_size(), 10);
    }

    #[test]
    fn test_debug_output() {
        let xhr = FakeXhr::new();
        xhr.open("DELETE", "/items/7");
        let rendered = format!("{xhr:?}");
        assert!(rendered.contains("Opened"));
        assert!(rendered.contains("/items/7"));
    }
}
