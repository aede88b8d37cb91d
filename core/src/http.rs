//! HTTP value types shared by the normalizer, the dispatch loop and the
//! transport.
//!
//! # Design
//! Requests and responses are plain owned data. `HttpRequest` is the canonical
//! descriptor produced by the normalizer and handed to request interceptors
//! and to the `Transport`; `HttpResponse` is what callers and response
//! interceptors see. Header names are stored lowercased so lookups are
//! case-insensitive, mirroring how HTTP treats them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::error::HttpError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// Methods that conventionally carry a request body. They get a more
    /// conservative default retry count.
    pub fn is_payload(&self) -> bool {
        match self {
            HttpMethod::Get => false,
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Delete | HttpMethod::Patch => true,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported HTTP method: {0}")]
pub struct ParseMethodError(pub String);

impl FromStr for HttpMethod {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            _ => Err(ParseMethodError(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// String-to-string header mapping with case-insensitive names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any previous value for the same name.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.as_ref().to_ascii_lowercase(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_lowercase())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(&name.to_ascii_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// A request body as supplied by the caller.
///
/// `Json` values are serialized to text by the normalizer. `Bytes` and `Form`
/// are stream payloads and are passed to the transport untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(serde_json::Value),
    /// Pre-serialized text, sent as is.
    Text(String),
    Bytes(Bytes),
    Form(FormData),
}

impl Body {
    pub fn is_stream(&self) -> bool {
        matches!(self, Body::Bytes(_) | Body::Form(_))
    }
}

/// Multipart form payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    parts: Vec<FormPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File {
        filename: String,
        content_type: Option<String>,
        data: Bytes,
    },
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: FormValue::Text(value.into()),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: Option<&str>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: FormValue::File {
                filename: filename.into(),
                content_type: content_type.map(str::to_string),
                data: data.into(),
            },
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }
}

// ---------------------------------------------------------------------------
// Per-request policies
// ---------------------------------------------------------------------------

/// How the response body should be decoded on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
    #[default]
    Json,
    Text,
    Blob,
}

/// Which credential-bearing headers are sent.
///
/// `SameOrigin` keeps them only when the target shares the configured
/// endpoint's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Credentials {
    Omit,
    #[default]
    SameOrigin,
    Include,
}

/// Canonical request descriptor.
///
/// Built by `normalize_request`, then passed through the request interceptor
/// chain and finally to the transport. A normalized body is never
/// `Body::Json`: JSON values have already been serialized to `Body::Text`.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// The url as supplied by the caller; relative urls are resolved against
    /// the configured endpoint at dispatch.
    pub url: String,
    pub headers: Headers,
    pub body: Option<Body>,
    pub credentials: Credentials,
    pub signal: Option<CancellationToken>,
    /// Zero disables the internal timeout.
    pub timeout: Duration,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    Json(serde_json::Value),
    Text(String),
    Blob(Bytes),
}

impl ResponseData {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseData::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ResponseData::Blob(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Response returned to the caller or passed through the response chain.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// `None` when the body was empty, or when a failed response carried no
    /// decodable JSON.
    pub data: Option<ResponseData>,
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub ok: bool,
}

impl HttpResponse {
    /// Deserialize the response data into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        let decoded = match &self.data {
            Some(ResponseData::Json(value)) => serde_json::from_value(value.clone()),
            Some(ResponseData::Text(text)) => serde_json::from_str(text),
            Some(ResponseData::Blob(bytes)) => serde_json::from_slice(bytes),
            None => return Err(HttpError::decode("response has no body")),
        };
        decoded.map_err(|e| HttpError::decode(e.to_string()))
    }
}

/// Serialize `value` into a JSON request body.
pub(crate) fn json_body<T: Serialize + ?Sized>(value: &T) -> Result<Body, HttpError> {
    serde_json::to_value(value)
        .map(Body::Json)
        .map_err(HttpError::serialize)
}
