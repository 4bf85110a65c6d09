//! Request-side operations: open, header mutation, send, abort.

use log::{debug, warn};

use super::{FakeXhr, OpenOptions, ReadyState};
use crate::config::{
    is_unsafe_header, BODYLESS_METHODS, DEFAULT_REQUEST_CONTENT_TYPE, HEADER_CONTENT_TYPE,
    REQUEST_CHARSET_SUFFIX,
};
use crate::error_handling::XhrError;
use crate::events::EventType;

impl FakeXhr {
    /// Arms the instance for a new asynchronous exchange.
    ///
    /// Equivalent to `open_with(OpenOptions::new(method, url))`.
    pub fn open(&self, method: &str, url: &str) {
        self.open_with(OpenOptions::new(method, url));
    }

    /// Arms the instance for a new exchange.
    ///
    /// Clears the request headers and every response-side field left by a
    /// previous exchange, then moves to `OPENED` and dispatches
    /// `readystatechange`.
    pub fn open_with(&self, options: OpenOptions) {
        let is_async = options.is_async.unwrap_or(self.inner.config.default_async);
        debug!(
            "Opening {} {} (async: {})",
            options.method, options.url, is_async
        );
        self.inner
            .state
            .borrow_mut()
            .reset_for_open(options, is_async);
        self.ready_state_change(ReadyState::Opened);
    }

    /// Adds a request header, comma-joining repeated names.
    ///
    /// # Errors
    ///
    /// - [`XhrError::InvalidState`] unless the exchange is `OPENED` with no
    ///   send in flight.
    /// - [`XhrError::UnsafeHeader`] for names a browser refuses to let
    ///   scripts set (see [`crate::config::UNSAFE_HEADERS`]) and for any
    ///   `Sec-`/`Proxy-` prefixed name.
    pub fn set_request_header(&self, name: &str, value: &str) -> Result<(), XhrError> {
        self.verify_state()?;

        if is_unsafe_header(name) {
            warn!("Refused to set unsafe header \"{name}\"");
            return Err(XhrError::UnsafeHeader(name.to_string()));
        }

        self.inner
            .state
            .borrow_mut()
            .request_headers
            .append_joined(name, value);
        Ok(())
    }

    /// Freezes the request side and hands the exchange to the transport.
    ///
    /// For methods other than GET/HEAD the body is stored and the
    /// `Content-Type` request header gets a `utf-8` charset (defaulting to
    /// `text/plain`). Then `readystatechange` is dispatched again at
    /// `OPENED`, the `on_send` hook runs, `loadstart` is dispatched, and the
    /// transport (if any) takes over.
    ///
    /// # Errors
    ///
    /// - [`XhrError::InvalidState`] under the same conditions as
    ///   [`FakeXhr::set_request_header`].
    /// - Whatever the transport returns, wrapped in [`XhrError::Transport`].
    pub fn send(&self, body: Option<&str>) -> Result<(), XhrError> {
        self.verify_state()?;

        let generation = {
            let mut state = self.inner.state.borrow_mut();
            let carries_body = state.method.as_deref().is_some_and(|method| {
                !BODYLESS_METHODS
                    .iter()
                    .any(|bodyless| bodyless.eq_ignore_ascii_case(method))
            });

            if carries_body {
                let content_type = match state.request_headers.get(HEADER_CONTENT_TYPE) {
                    Some(existing) if !existing.is_empty() => {
                        let media_type = existing.split(';').next().unwrap_or_default();
                        format!("{media_type}{REQUEST_CHARSET_SUFFIX}")
                    }
                    _ => DEFAULT_REQUEST_CONTENT_TYPE.to_string(),
                };
                state.request_headers.set(HEADER_CONTENT_TYPE, content_type);
                state.request_body = body.map(str::to_string);
            }

            state.error_flag = false;
            state.send_flag = state.is_async;
            state.generation
        };

        self.ready_state_change(ReadyState::Opened);
        if !self.is_current(generation) {
            debug!("Exchange superseded during readystatechange; send stops");
            return Ok(());
        }

        self.invoke_on_send();
        if !self.is_current(generation) {
            debug!("Exchange superseded by the send hook; send stops");
            return Ok(());
        }

        self.fire(EventType::LoadStart);
        if !self.is_current(generation) {
            debug!("Exchange superseded during loadstart; send stops");
            return Ok(());
        }

        let transport = self.inner.transport.borrow().clone();
        match transport {
            Some(transport) => {
                debug!(
                    "Handing {} {} to transport",
                    self.method().unwrap_or_default(),
                    self.url().unwrap_or_default()
                );
                transport.handle(self)?;
            }
            None => {
                debug!("No transport registered; exchange waits for respond() or abort()");
            }
        }
        Ok(())
    }

    /// Cancels the exchange.
    ///
    /// Clears the response text and request headers. An async exchange that
    /// was sending is first moved to `DONE` (dispatching `readystatechange`
    /// but not `load`/`loadend`). The instance always ends up `UNSENT`, after
    /// which `abort` is dispatched and the `on_error` callback runs.
    pub fn abort(&self) {
        let was_sending = {
            let mut state = self.inner.state.borrow_mut();
            state.aborted = true;
            state.error_flag = true;
            state.response_text = None;
            state.request_headers.clear();
            state.generation += 1;
            state.ready_state > ReadyState::Unsent && state.send_flag
        };
        debug!(
            "Aborting {} {} (sending: {})",
            self.method().unwrap_or_default(),
            self.url().unwrap_or_default(),
            was_sending
        );

        if was_sending {
            self.notify_ready_state(ReadyState::Done);
            self.inner.state.borrow_mut().send_flag = false;
        }

        self.inner.state.borrow_mut().ready_state = ReadyState::Unsent;

        self.fire(EventType::Abort);
        self.invoke_on_error();
    }

    fn verify_state(&self) -> Result<(), XhrError> {
        let state = self.inner.state.borrow();
        if state.ready_state != ReadyState::Opened || state.send_flag {
            debug!(
                "Invalid state for request mutation (readyState: {}, sending: {})",
                state.ready_state, state.send_flag
            );
            return Err(XhrError::InvalidState);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventRecorder;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_open_records_request_line() {
        let xhr = FakeXhr::new();
        xhr.open_with(OpenOptions::new("PUT", "/docs/1").credentials("ada", "pw"));
        assert_eq!(xhr.method().as_deref(), Some("PUT"));
        assert_eq!(xhr.url().as_deref(), Some("/docs/1"));
        assert_eq!(xhr.username().as_deref(), Some("ada"));
        assert_eq!(xhr.password().as_deref(), Some("pw"));
        assert!(xhr.is_async());
        assert_eq!(xhr.ready_state(), ReadyState::Opened);
    }

    #[test]
    fn test_set_request_header_requires_opened() {
        let xhr = FakeXhr::new();
        assert!(matches!(
            xhr.set_request_header("X-Test", "1"),
            Err(XhrError::InvalidState)
        ));
    }

    #[test]
    fn test_set_request_header_rejected_while_sending() {
        let xhr = FakeXhr::new();
        xhr.open("GET", "/");
        xhr.send(None).unwrap();
        assert!(matches!(
            xhr.set_request_header("X-Test", "1"),
            Err(XhrError::InvalidState)
        ));
        assert!(matches!(xhr.send(None), Err(XhrError::InvalidState)));
    }

    #[test]
    fn test_unsafe_headers_are_rejected() {
        let xhr = FakeXhr::new();
        xhr.open("GET", "/");
        for name in ["Cookie", "user-agent", "Sec-Fetch-Site", "Proxy-Connection"] {
            match xhr.set_request_header(name, "x") {
                Err(XhrError::UnsafeHeader(rejected)) => assert_eq!(rejected, name),
                other => panic!("expected UnsafeHeader for {name}, got {other:?}"),
            }
        }
        assert!(xhr.request_headers().is_empty());
    }

    #[test]
    fn test_repeated_header_is_comma_joined() {
        let xhr = FakeXhr::new();
        xhr.open("GET", "/");
        xhr.set_request_header("Accept", "text/html").unwrap();
        xhr.set_request_header("Accept", "application/json").unwrap();
        assert_eq!(
            xhr.request_header("accept").as_deref(),
            Some("text/html,application/json")
        );
    }

    #[test]
    fn test_send_defaults_content_type_for_post() {
        let xhr = FakeXhr::new();
        xhr.open("POST", "/items");
        xhr.send(Some("name=widget")).unwrap();
        assert_eq!(
            xhr.request_header("Content-Type").as_deref(),
            Some("text/plain;charset=utf-8")
        );
        assert_eq!(xhr.request_body().as_deref(), Some("name=widget"));
        assert!(xhr.send_flag());
    }

    #[test]
    fn test_send_rewrites_charset_of_existing_content_type() {
        let xhr = FakeXhr::new();
        xhr.open("post", "/items");
        xhr.set_request_header("content-type", "application/json; charset=latin1; q=1")
            .unwrap();
        xhr.send(Some("{}")).unwrap();
        assert_eq!(
            xhr.request_header("Content-Type").as_deref(),
            Some("application/json;charset=utf-8")
        );
        assert_eq!(xhr.request_headers().len(), 1);
    }

    #[test]
    fn test_get_and_head_ignore_body() {
        for method in ["GET", "head", "Get"] {
            let xhr = FakeXhr::new();
            xhr.open(method, "/");
            xhr.send(Some("ignored")).unwrap();
            assert_eq!(xhr.request_body(), None, "{method} should not store a body");
            assert_eq!(xhr.request_header("Content-Type"), None);
        }
    }

    #[test]
    fn test_sync_send_leaves_send_flag_clear() {
        let xhr = FakeXhr::new();
        xhr.open_with(OpenOptions::new("GET", "/").asynchronous(false));
        xhr.send(None).unwrap();
        assert!(!xhr.send_flag());
    }

    #[test]
    fn test_send_dispatch_order() {
        let xhr = FakeXhr::new();
        xhr.open("GET", "/");
        let recorder = EventRecorder::attach(&xhr);
        let hook_calls = Rc::new(Cell::new(0));
        let hook_calls_in_hook = Rc::clone(&hook_calls);
        let recorder_in_hook = Rc::clone(&recorder);
        xhr.set_on_send(move |_| {
            // readystatechange has already fired, loadstart has not
            assert_eq!(recorder_in_hook.event_types(), vec!["readystatechange"]);
            hook_calls_in_hook.set(hook_calls_in_hook.get() + 1);
        });

        xhr.send(None).unwrap();
        assert_eq!(hook_calls.get(), 1);
        assert_eq!(recorder.event_types(), vec!["readystatechange", "loadstart"]);
        assert_eq!(recorder.ready_states(), vec![ReadyState::Opened]);
    }

    #[test]
    fn test_abort_before_send_skips_done() {
        let xhr = FakeXhr::new();
        xhr.open("GET", "/");
        let recorder = EventRecorder::attach(&xhr);
        xhr.abort();
        assert_eq!(recorder.event_types(), vec!["abort"]);
        assert_eq!(xhr.ready_state(), ReadyState::Unsent);
        assert!(xhr.aborted());
        assert!(xhr.error_flag());
    }

    #[test]
    fn test_abort_while_sending_passes_through_done() {
        let xhr = FakeXhr::new();
        xhr.open("GET", "/");
        xhr.set_request_header("X-Test", "1").unwrap();
        xhr.send(None).unwrap();
        let recorder = EventRecorder::attach(&xhr);
        let errors = Rc::new(Cell::new(0));
        let errors_in_callback = Rc::clone(&errors);
        xhr.set_on_error(move |_| errors_in_callback.set(errors_in_callback.get() + 1));

        xhr.abort();
        assert_eq!(recorder.event_types(), vec!["readystatechange", "abort"]);
        assert_eq!(recorder.ready_states(), vec![ReadyState::Done]);
        assert_eq!(recorder.count(EventType::Load), 0);
        assert_eq!(recorder.count(EventType::LoadEnd), 0);
        assert_eq!(errors.get(), 1);
        assert_eq!(xhr.ready_state(), ReadyState::Unsent);
        assert!(!xhr.send_flag());
        assert!(xhr.request_headers().is_empty());
        assert_eq!(xhr.response_text(), None);
    }

    #[test]
    fn test_hook_abort_stops_send() {
        let xhr = FakeXhr::new();
        xhr.open("GET", "/");
        let recorder = EventRecorder::attach(&xhr);
        xhr.set_on_send(|target| target.abort());
        xhr.send(None).unwrap();
        assert_eq!(recorder.count(EventType::LoadStart), 0);
        assert_eq!(xhr.ready_state(), ReadyState::Unsent);
    }
}
