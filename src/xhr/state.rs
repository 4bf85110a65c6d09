//! Ready states and per-exchange state.

use std::rc::Rc;

use serde::Serialize;
use strum_macros::{Display, EnumIter};

use super::headers::HeaderList;
use crate::config::DEFAULT_CHUNK_SIZE;
use crate::document::XmlDocument;

/// Progress marker of an exchange.
///
/// Ordered: `Unsent < Opened < HeadersReceived < Loading < Done`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Display,
    EnumIter,
    Serialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum ReadyState {
    /// Created, or aborted
    #[default]
    Unsent = 0,
    /// `open` was called
    Opened = 1,
    /// Response headers were recorded
    HeadersReceived = 2,
    /// The response body is being delivered
    Loading = 3,
    /// The exchange completed
    Done = 4,
}

impl ReadyState {
    /// Numeric value as exposed by a native request object.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<ReadyState> for u8 {
    fn from(state: ReadyState) -> Self {
        state.as_u8()
    }
}

/// Arguments of [`crate::FakeXhr::open_with`].
///
/// # Examples
///
/// ```
/// use fake_xhr::{FakeXhr, OpenOptions};
///
/// let xhr = FakeXhr::new();
/// xhr.open_with(OpenOptions::new("POST", "/login").asynchronous(false).credentials("ada", "secret"));
/// assert!(!xhr.is_async());
/// assert_eq!(xhr.username().as_deref(), Some("ada"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    pub(crate) method: String,
    pub(crate) url: String,
    pub(crate) is_async: Option<bool>,
    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,
}

impl OpenOptions {
    /// Request line only; async flag from the instance configuration.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            is_async: None,
            username: None,
            password: None,
        }
    }

    /// Sets the async flag.
    pub fn asynchronous(mut self, is_async: bool) -> Self {
        self.is_async = Some(is_async);
        self
    }

    /// Sets the credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

/// Mutable state of one instance. Borrowed only between listener calls.
#[derive(Debug)]
pub(crate) struct ExchangeState {
    pub(crate) ready_state: ReadyState,
    pub(crate) method: Option<String>,
    pub(crate) url: Option<String>,
    pub(crate) is_async: bool,
    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) request_headers: HeaderList,
    pub(crate) request_body: Option<String>,
    pub(crate) send_flag: bool,
    pub(crate) error_flag: bool,
    pub(crate) aborted: bool,
    pub(crate) response_headers: Option<HeaderList>,
    pub(crate) status: u16,
    pub(crate) status_text: String,
    pub(crate) response_text: Option<String>,
    pub(crate) response_xml: Option<Rc<XmlDocument>>,
    pub(crate) chunk_size: usize,
    /// Bumped by `open` and `abort`; lets `send`/`respond` notice they were superseded.
    pub(crate) generation: u64,
}

impl ExchangeState {
    pub(crate) fn new(chunk_size: usize, is_async: bool) -> Self {
        Self {
            ready_state: ReadyState::Unsent,
            method: None,
            url: None,
            is_async,
            username: None,
            password: None,
            request_headers: HeaderList::new(),
            request_body: None,
            send_flag: false,
            error_flag: false,
            aborted: false,
            response_headers: None,
            status: 0,
            status_text: String::new(),
            response_text: None,
            response_xml: None,
            chunk_size,
            generation: 0,
        }
    }

    /// Records a new request line and clears everything the previous exchange left.
    pub(crate) fn reset_for_open(&mut self, options: OpenOptions, is_async: bool) {
        self.method = Some(options.method);
        self.url = Some(options.url);
        self.is_async = is_async;
        self.username = options.username;
        self.password = options.password;
        self.request_headers.clear();
        self.request_body = None;
        self.send_flag = false;
        self.error_flag = false;
        self.aborted = false;
        self.response_headers = None;
        self.status = 0;
        self.status_text.clear();
        self.response_text = None;
        self.response_xml = None;
        self.generation += 1;
    }

    /// Chunk size with 0 falling back to the default.
    pub(crate) fn effective_chunk_size(&self) -> usize {
        if self.chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            self.chunk_size
        }
    }
}
