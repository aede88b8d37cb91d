//! Error types for the HTTP client.
//!
//! # Design
//! Every failure surfaces as a single `HttpError` carrying the `name` /
//! `message` / optional `response` triple callers inspect, plus an
//! `ErrorKind` so Rust callers can match on the failure class instead of
//! comparing names. Non-success responses keep the (best-effort) parsed
//! response attached for debugging.

use thiserror::Error;

use crate::http::HttpResponse;

/// Name used for caller-cancelled and timed-out requests.
pub const ABORT_ERROR: &str = "AbortError";

/// Failure class of an `HttpError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// DNS, connection or protocol failure reported by the transport.
    Transport,
    /// The request signal was cancelled, or the internal timeout elapsed.
    Aborted,
    /// The server answered with a non-success status.
    Status,
    /// A successful response body could not be decoded.
    Decode,
    /// The request body could not be serialized to JSON.
    Serialize,
    /// An interceptor rejected the value it was given.
    Interceptor,
}

/// Error returned by every `HttpClient` request.
#[derive(Debug, Clone, Error)]
#[error("{name}: {message}")]
pub struct HttpError {
    pub name: String,
    pub message: String,
    pub response: Option<Box<HttpResponse>>,
    pub kind: ErrorKind,
}

impl HttpError {
    pub fn new(kind: ErrorKind, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            response: None,
            kind,
        }
    }

    /// Error for a non-success response. Name and message are the status text.
    pub fn status(response: HttpResponse) -> Self {
        let text = if response.status_text.is_empty() {
            format!("HTTP {}", response.status)
        } else {
            response.status_text.clone()
        };
        Self {
            name: text.clone(),
            message: text,
            response: Some(Box::new(response)),
            kind: ErrorKind::Status,
        }
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Aborted, ABORT_ERROR, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, "DecodeError", message)
    }

    pub fn serialize(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::Serialize, "SerializeError", err.to_string())
    }

    /// Error for interceptors that refuse a request or response.
    pub fn interceptor(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Interceptor, "InterceptorError", message)
    }

    pub fn is_aborted(&self) -> bool {
        self.kind == ErrorKind::Aborted
    }

    /// Status code of the attached response, if any.
    pub fn status_code(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.status)
    }
}

/// Failure reported by a `Transport` before any response was received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{name}: {message}")]
pub struct TransportError {
    pub name: String,
    pub message: String,
}

impl TransportError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new("NetworkError", message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new("TimeoutError", message)
    }
}

impl From<TransportError> for HttpError {
    fn from(err: TransportError) -> Self {
        HttpError::new(ErrorKind::Transport, err.name, err.message)
    }
}
