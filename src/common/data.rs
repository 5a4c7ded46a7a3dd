use crate::common::util::HttpStubBytes;
use bytes::Bytes;
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no request with index {index} has been created yet (ledger length: {len})")]
    RequestIndexOutOfRange { index: usize, len: usize },
    #[error("a response was already delivered to request {index}")]
    ResponseAlreadyDelivered { index: usize },
    #[error("request {index} was created but never dispatched, so no completion handler is registered")]
    ResponseBeforeDispatch { index: usize },
    #[error("the fake transport was restored, request interception is no longer active")]
    Restored,
    #[error("invalid request data: {0}")]
    InvalidRequestData(String),
    #[error("cannot send request: {0}")]
    Upstream(String),
    #[error("JSON conversion error: {0}")]
    JsonConversionError(#[from] serde_json::Error),
}

/// What the code under test asked a transport to send: method, URL, headers,
/// and body. Built with the chaining methods and passed to
/// [`Transport::dispatch`](crate::Transport::dispatch).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransportRequest {
    method: String,
    url: String,
    headers: Vec<(String, String)>,
    body: HttpStubBytes,
}

impl TransportRequest {
    /// Creates a request with the given method and URL, no headers, and an
    /// empty body.
    pub fn new<U: Into<String>>(method: Method, url: U) -> Self {
        Self {
            method: method.to_string(),
            url: url.into(),
            headers: Vec::new(),
            body: HttpStubBytes::default(),
        }
    }

    /// Appends one header.
    pub fn header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the request body.
    pub fn body<B: Into<Bytes>>(mut self, body: B) -> Self {
        self.body = HttpStubBytes::from(body.into());
        self
    }

    pub fn method(&self) -> Method {
        self.method.parse().unwrap()
    }

    pub fn method_str(&self) -> &str {
        self.method.as_ref()
    }

    pub fn url(&self) -> &str {
        self.url.as_ref()
    }

    /// Parses and returns the request URL.
    ///
    /// Transports that actually go out to the network use this to validate
    /// the URL before connecting; the fake transport never parses it.
    pub fn parsed_url(&self) -> Result<Url, Error> {
        Url::parse(&self.url).map_err(|e| Error::InvalidRequestData(e.to_string()))
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Returns the value of the first header with the given name,
    /// case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_bytes(&self) -> Bytes {
        self.body.to_bytes()
    }

    pub fn body_str(&self) -> Cow<str> {
        self.body.to_maybe_lossy_str()
    }
}

/// The status/headers/body triple delivered to a completion handler.
///
/// The same type serves as the synthetic response a test drives into a
/// [`FakeRequest`](crate::FakeRequest) and as the captured completion state
/// readable from the ledger afterwards. Headers and body default to empty, so
/// `TransportResponse::new(500)` on its own is a complete response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransportResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: HttpStubBytes,
}

impl TransportResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: HttpStubBytes::default(),
        }
    }

    /// Appends one header.
    pub fn header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the response body.
    pub fn body<B: Into<Bytes>>(mut self, body: B) -> Self {
        self.body = HttpStubBytes::from(body.into());
        self
    }

    /// Sets the response body to the serialized form of the given JSON value.
    ///
    /// The `content-type` header is not set implicitly; add it with
    /// [`TransportResponse::header`] if the code under test looks at it.
    pub fn json_body(mut self, value: Value) -> Self {
        self.body = HttpStubBytes::from(Bytes::from(value.to_string()));
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Whether the status code is in the 2xx range. Provided for consumers;
    /// the response driver itself never interprets the status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Returns the value of the first header with the given name,
    /// case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_bytes(&self) -> Bytes {
        self.body.to_bytes()
    }

    pub fn body_str(&self) -> Cow<str> {
        self.body.to_maybe_lossy_str()
    }
}
