//! HTTP response plumbing for templated controller actions.

pub mod handler;

pub use handler::TemplateResponseHandler;

use crate::constants::{DEFAULT_ERROR_STATUS, DEFAULT_REDIRECT_STATUS, INTERNAL_ERROR_BODY};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// What a controller action produced.
#[derive(Debug, Clone)]
pub enum ControllerOutcome {
    /// Render the action's template with `data`.
    Template { data: Option<Map<String, Value>>, status: Option<u16> },
    Error(ErrorResponse),
    Redirect { location: String, status: u16 },
}

impl ControllerOutcome {
    /// A templated response with default data and status.
    pub fn template() -> Self {
        ControllerOutcome::Template { data: None, status: None }
    }

    /// A templated response rendered with `data`.
    pub fn with_data(data: Value) -> Self {
        let data = match data {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => Some(Map::from_iter([("data".to_string(), other)])),
        };
        ControllerOutcome::Template { data, status: None }
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        ControllerOutcome::Redirect {
            location: location.into(),
            status: DEFAULT_REDIRECT_STATUS,
        }
    }
}

impl From<ErrorResponse> for ControllerOutcome {
    fn from(error: ErrorResponse) -> Self {
        ControllerOutcome::Error(error)
    }
}

/// An error raised by a controller or the framework.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub status: u16,
    /// Exposed to the error template as `error`.
    pub data: Value,
    headers: IndexMap<String, String>,
}

impl ErrorResponse {
    pub fn new(status: u16) -> Self {
        Self { status, data: Value::Null, headers: IndexMap::new() }
    }

    /// A 500 that carries no detail of the underlying failure.
    pub fn internal() -> Self {
        Self::new(DEFAULT_ERROR_STATUS)
            .with_data(serde_json::json!({ "message": INTERNAL_ERROR_BODY }))
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }
}

impl Default for ErrorResponse {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_STATUS)
    }
}

/// The outgoing response. Header names are stored lowercased.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    status: u16,
    headers: IndexMap<String, String>,
    body: Option<String>,
    headers_sent: bool,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Writes status and body. Returns `false` if the response was already sent.
    pub fn send(&mut self, status: u16, body: impl Into<String>) -> bool {
        if self.headers_sent {
            return false;
        }
        self.status = status;
        let body = body.into();
        self.set_header("content-length", body.len().to_string());
        self.body = Some(body);
        self.headers_sent = true;
        true
    }

    /// Writes a bodiless redirect. Returns `false` if the response was already sent.
    pub fn redirect(&mut self, status: u16, location: &str) -> bool {
        if self.headers_sent {
            return false;
        }
        self.status = status;
        self.set_header("location", location);
        self.headers_sent = true;
        true
    }
}
