//! Error types for the doctype client
//!
//! Every failed call is reported the same way: there is no retry and no
//! distinction between transient and permanent failures. `user_message()`
//! picks the text shown in the notification.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use doctype_form::richtext::strip_tags;
use doctype_form::{FormError, ValidationReport};

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors talking to the doctype backend
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connection, TLS or timeout failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message extracted from the body, or the status reason
        message: String,
        /// Response body, when it was JSON
        body: Option<JsonValue>,
    },

    /// Response body did not have the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Invalid client configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Host or path could not form a URL
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// Stored token is not valid base64 UTF-8
    #[error("invalid auth token: {0}")]
    InvalidToken(String),

    /// Record has no `id` or `name`
    #[error("record has no id")]
    MissingId,

    /// Local file access failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed descriptor fetch shared by every caller that waited on it
    #[error(transparent)]
    Shared(Arc<ClientError>),
}

impl ClientError {
    /// Text for the user-facing notification
    ///
    /// The body's `message`, else the combined `_server_messages` with HTML
    /// tags stripped, else the error's own text.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { body: Some(body), .. } => server_message(body).unwrap_or_else(|| self.to_string()),
            Self::Shared(inner) => inner.user_message(),
            _ => self.to_string(),
        }
    }

    /// HTTP status, when the server answered
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Shared(inner) => inner.status(),
            _ => None,
        }
    }
}

impl From<Arc<ClientError>> for ClientError {
    fn from(shared: Arc<ClientError>) -> Self {
        Arc::try_unwrap(shared).unwrap_or_else(Self::Shared)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Extract the message a backend error body carries
#[must_use]
pub fn server_message(body: &JsonValue) -> Option<String> {
    if let Some(message) = body.get("message").and_then(JsonValue::as_str) {
        if !message.trim().is_empty() {
            return Some(message.to_string());
        }
    }

    let raw = body.get("_server_messages")?;
    // Either a JSON-encoded list or the list itself
    let entries: Vec<JsonValue> = match raw {
        JsonValue::String(encoded) => serde_json::from_str(encoded).ok()?,
        JsonValue::Array(items) => items.clone(),
        _ => return None,
    };
    let combined = entries
        .iter()
        .filter_map(|entry| {
            let parsed = match entry {
                JsonValue::String(encoded) => serde_json::from_str::<JsonValue>(encoded).ok()?,
                other => other.clone(),
            };
            parsed
                .get("message")
                .and_then(JsonValue::as_str)
                .map(strip_tags)
        })
        .collect::<Vec<_>>()
        .join(" ");
    Some(combined).filter(|m| !m.trim().is_empty())
}

/// Errors of a form session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Validation errors block the remote call
    #[error("form has validation errors: {0}")]
    Invalid(ValidationReport),

    /// Remote call failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Local form operation failed
    #[error(transparent)]
    Form(#[from] FormError),

    /// Descriptors or record are not loaded
    #[error("form is not ready: {0}")]
    NotReady(String),

    /// Delete requested on a record that was never saved
    #[error("no saved record")]
    NoRecord,

    /// Field does not offer "create new linked record"
    #[error("cannot create linked record for {0}")]
    CreateNotAllowed(String),
}
