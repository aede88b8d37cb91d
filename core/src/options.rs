//! Per-call request options.
//!
//! Every field is optional; the normalizer fills in defaults. The builder
//! methods consume and return `Self` so options read as one expression at the
//! call site.

use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::HttpError;
use crate::http::{json_body, Body, Credentials, FormData, Headers, HttpMethod, ResponseType};

/// Retry setting for a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retry {
    /// Maximum number of additional attempts.
    Count(u32),
    Disabled,
}

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Option<HttpMethod>,
    pub body: Option<Body>,
    pub url: Option<String>,
    pub headers: Option<Headers>,
    pub response_type: Option<ResponseType>,
    pub credentials: Option<Credentials>,
    /// `None` selects the method-dependent default.
    pub retry: Option<Retry>,
    pub signal: Option<CancellationToken>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, HttpError> {
        self.body = Some(json_body(value)?);
        Ok(self)
    }

    /// Pre-serialized body text.
    pub fn text(self, text: impl Into<String>) -> Self {
        self.body(Body::Text(text.into()))
    }

    pub fn bytes(self, bytes: impl Into<Bytes>) -> Self {
        self.body(Body::Bytes(bytes.into()))
    }

    pub fn form(self, form: FormData) -> Self {
        self.body(Body::Form(form))
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.get_or_insert_with(Headers::new).insert(name, value);
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn retry(mut self, count: u32) -> Self {
        self.retry = Some(Retry::Count(count));
        self
    }

    pub fn no_retry(mut self) -> Self {
        self.retry = Some(Retry::Disabled);
        self
    }

    /// Caller-owned cancellation token. Takes precedence over `timeout`.
    pub fn signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
