//! Response delivery and response header access.

use std::rc::Rc;
use std::sync::LazyLock;

use log::{debug, trace, warn};
use regex::Regex;

use super::{FakeXhr, HeaderList, ReadyState};
use crate::config::{
    is_hidden_response_header, DEFAULT_STATUS, HEADER_CONTENT_TYPE, XML_CONTENT_TYPE_PATTERN,
};
use crate::document::XmlDocument;
use crate::error_handling::XhrError;
use crate::status::status_text;

static XML_CONTENT_TYPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| match Regex::new(XML_CONTENT_TYPE_PATTERN) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Invalid XML content-type pattern, XML parsing disabled: {e}");
            None
        }
    });

fn is_xml_content_type(content_type: &str) -> bool {
    XML_CONTENT_TYPE
        .as_ref()
        .is_some_and(|re| re.is_match(content_type))
}

/// A response body as supplied by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// Text body
    Text(String),
    /// Raw bytes; accepted only if they are valid UTF-8
    Bytes(Vec<u8>),
}

impl Default for ResponseBody {
    fn default() -> Self {
        ResponseBody::Text(String::new())
    }
}

impl ResponseBody {
    fn into_text(self) -> Result<String, XhrError> {
        match self {
            ResponseBody::Text(text) => Ok(text),
            ResponseBody::Bytes(bytes) => String::from_utf8(bytes).map_err(|e| {
                XhrError::InvalidBody(format!("{} bytes of non-UTF-8 data", e.as_bytes().len()))
            }),
        }
    }
}

impl From<&str> for ResponseBody {
    fn from(text: &str) -> Self {
        ResponseBody::Text(text.to_string())
    }
}

impl From<String> for ResponseBody {
    fn from(text: String) -> Self {
        ResponseBody::Text(text)
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(bytes: Vec<u8>) -> Self {
        ResponseBody::Bytes(bytes)
    }
}

impl From<&[u8]> for ResponseBody {
    fn from(bytes: &[u8]) -> Self {
        ResponseBody::Bytes(bytes.to_vec())
    }
}

/// Everything a transport decides about a response.
///
/// Defaults to status 200, no headers and an empty body.
///
/// # Examples
///
/// ```
/// use fake_xhr::FakeResponse;
///
/// let response = FakeResponse::new()
///     .status(404)
///     .header("Content-Type", "text/plain")
///     .body("Sorry. This object was not found.");
/// assert_eq!(response.status_code(), 404);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeResponse {
    status: u16,
    headers: HeaderList,
    body: ResponseBody,
}

impl Default for FakeResponse {
    fn default() -> Self {
        Self {
            status: DEFAULT_STATUS,
            headers: HeaderList::new(),
            body: ResponseBody::default(),
        }
    }
}

impl FakeResponse {
    /// A `200` response with no headers and an empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status code.
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Adds a header (an identical name replaces the earlier value).
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replaces all headers.
    pub fn headers(mut self, headers: impl Into<HeaderList>) -> Self {
        self.headers = headers.into();
        self
    }

    /// Sets the body.
    pub fn body(mut self, body: impl Into<ResponseBody>) -> Self {
        self.body = body.into();
        self
    }

    /// The status code.
    pub fn status_code(&self) -> u16 {
        self.status
    }
}

/// Splits `body` into pieces of `chunk_size` characters; an empty body is
/// one empty piece.
fn chunk_body(body: &str, chunk_size: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (index, _) in body.char_indices() {
        if count == chunk_size {
            chunks.push(&body[start..index]);
            start = index;
            count = 0;
        }
        count += 1;
    }
    chunks.push(&body[start..]);
    chunks
}

impl FakeXhr {
    /// Completes the exchange with `status`, `headers` and `body`.
    ///
    /// Shorthand for [`FakeXhr::respond_with`].
    ///
    /// # Errors
    ///
    /// See [`FakeXhr::respond_with`].
    pub fn respond(
        &self,
        status: u16,
        headers: impl Into<HeaderList>,
        body: impl Into<ResponseBody>,
    ) -> Result<(), XhrError> {
        self.respond_with(FakeResponse {
            status,
            headers: headers.into(),
            body: body.into(),
        })
    }

    /// Completes the exchange.
    ///
    /// In order: records the headers and moves to `HEADERS_RECEIVED`,
    /// records the status and its text, delivers the body chunk by chunk,
    /// then runs the `on_complete` callback. Intermediate states are
    /// dispatched as `readystatechange` for async exchanges and set silently
    /// for synchronous ones.
    ///
    /// If a listener aborts, reopens or responds to the exchange
    /// mid-delivery, this delivery stops where it is and `Ok(())` is
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`XhrError::RequestDone`] if the exchange is already `DONE`.
    /// - [`XhrError::InvalidBody`] if the body is not text. Checked before
    ///   anything is recorded.
    /// - [`XhrError::NoHeadersReceived`] if an async exchange left
    ///   `HEADERS_RECEIVED` before its body was delivered.
    pub fn respond_with(&self, response: FakeResponse) -> Result<(), XhrError> {
        let FakeResponse {
            status,
            headers,
            body,
        } = response;

        if self.ready_state() == ReadyState::Done {
            return Err(XhrError::RequestDone);
        }
        let body = body.into_text()?;

        // A respond issued from one of our own listeners supersedes this one
        let (is_async, generation) = {
            let mut state = self.inner.state.borrow_mut();
            state.generation += 1;
            (state.is_async, state.generation)
        };

        debug!(
            "Responding to {} {} with {} ({} header(s), {} byte body)",
            self.method().unwrap_or_default(),
            self.url().unwrap_or_default(),
            status,
            headers.len(),
            body.len()
        );

        self.set_response_headers(headers, is_async);
        if !self.is_current(generation) {
            debug!("Exchange superseded after headers; delivery stops");
            return Ok(());
        }

        {
            let mut state = self.inner.state.borrow_mut();
            state.status = status;
            state.status_text = status_text(status).unwrap_or_default().to_string();
        }

        self.set_response_body(&body, generation)?;
        if !self.is_current(generation) {
            return Ok(());
        }

        if log::log_enabled!(log::Level::Trace) {
            trace!(
                "Exchange complete: {}",
                serde_json::to_string(&self.snapshot()).unwrap_or_default()
            );
        }
        self.invoke_on_complete();
        Ok(())
    }

    fn set_response_headers(&self, headers: HeaderList, is_async: bool) {
        self.inner.state.borrow_mut().response_headers = Some(headers);
        if is_async {
            self.ready_state_change(ReadyState::HeadersReceived);
        } else {
            self.set_ready_state_silently(ReadyState::HeadersReceived);
        }
    }

    fn set_response_body(&self, body: &str, generation: u64) -> Result<(), XhrError> {
        let (is_async, chunk_size) = {
            let mut state = self.inner.state.borrow_mut();
            if state.ready_state == ReadyState::Done {
                return Err(XhrError::RequestDone);
            }
            if state.is_async && state.ready_state != ReadyState::HeadersReceived {
                return Err(XhrError::NoHeadersReceived);
            }
            state.response_text = Some(String::new());
            (state.is_async, state.effective_chunk_size())
        };

        for chunk in chunk_body(body, chunk_size) {
            if is_async {
                self.ready_state_change(ReadyState::Loading);
                if !self.is_current(generation) {
                    debug!("Exchange superseded while loading; delivery stops");
                    return Ok(());
                }
            }
            if let Some(text) = self.inner.state.borrow_mut().response_text.as_mut() {
                text.push_str(chunk);
            }
        }

        let document = self.parse_response_document();
        self.inner.state.borrow_mut().response_xml = document;

        if is_async {
            self.ready_state_change(ReadyState::Done);
        } else {
            self.set_ready_state_silently(ReadyState::Done);
        }
        Ok(())
    }

    /// Parses the response text when it is non-empty and the content type is
    /// absent or XML-family. Parse failures yield `None`.
    fn parse_response_document(&self) -> Option<Rc<XmlDocument>> {
        if !self.inner.config.parse_xml {
            return None;
        }
        let text = self.response_text().filter(|text| !text.is_empty())?;
        if let Some(content_type) = self.get_response_header(HEADER_CONTENT_TYPE) {
            if !is_xml_content_type(&content_type) {
                return None;
            }
        }

        match self.inner.parser.parse(&text) {
            Ok(document) => Some(Rc::new(document)),
            Err(e) => {
                debug!("Unable to parse response as XML, leaving document unset: {e}");
                None
            }
        }
    }

    /// Value of a response header, matched case-insensitively.
    ///
    /// `None` before `HEADERS_RECEIVED`, for `Set-Cookie`/`Set-Cookie2`, and
    /// for headers that were not sent.
    pub fn get_response_header(&self, name: &str) -> Option<String> {
        let state = self.inner.state.borrow();
        if state.ready_state < ReadyState::HeadersReceived || is_hidden_response_header(name) {
            return None;
        }
        state
            .response_headers
            .as_ref()
            .and_then(|headers| headers.get(name))
            .map(str::to_string)
    }

    /// All exposed response headers as `Name: Value\r\n` lines.
    ///
    /// Empty before `HEADERS_RECEIVED`. `Set-Cookie`/`Set-Cookie2` are
    /// always left out.
    pub fn get_all_response_headers(&self) -> String {
        let state = self.inner.state.borrow();
        if state.ready_state < ReadyState::HeadersReceived {
            return String::new();
        }
        let Some(headers) = state.response_headers.as_ref() else {
            return String::new();
        };
        headers
            .iter()
            .filter(|(name, _)| !is_hidden_response_header(name))
            .map(|(name, value)| format!("{name}: {value}\r\n"))
            .collect()
    }

    /// Exposed response headers as a list; empty before `HEADERS_RECEIVED`.
    pub fn response_headers(&self) -> HeaderList {
        self.snapshot().response_headers.into_iter().collect()
    }
}
