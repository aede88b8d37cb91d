//! The network seam.
//!
//! # Design
//! The dispatch loop never talks to the network directly: it hands the
//! resolved url and the intercepted `HttpRequest` to a `Transport` and gets a
//! `RawResponse` back. Any status code, including 4xx/5xx, is data; only
//! failures before a response exists are errors. `ReqwestTransport` is the
//! default implementation; tests plug in scripted transports.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;
use crate::http::{Body, FormData, FormValue, Headers, HttpMethod, HttpRequest};

/// Undecoded response as reported by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: Bytes,
}

impl RawResponse {
    /// `true` for 2xx statuses.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Body as text; invalid UTF-8 sequences are replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn blob(&self) -> Bytes {
        self.body.clone()
    }
}

/// Performs the network round-trip for the client.
///
/// Every HTTP status, including 4xx and 5xx, comes back as `Ok(RawResponse)`;
/// `Err` is reserved for failures where no response arrived. Implementations
/// do not need to handle cancellation themselves: the client drops the
/// `send` future when the signal or timeout fires.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one round-trip for `request` against the absolute `url`.
    async fn send(&self, url: &str, request: &HttpRequest) -> Result<RawResponse, TransportError>;
}

// ---------------------------------------------------------------------------
// reqwest
// ---------------------------------------------------------------------------

/// Default transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, url: &str, request: &HttpRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self.client.request(to_reqwest_method(request.method), url);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }

        builder = match &request.body {
            None => builder,
            Some(Body::Json(value)) => builder.body(
                serde_json::to_vec(value)
                    .map_err(|e| TransportError::new("SerializeError", e.to_string()))?,
            ),
            Some(Body::Text(text)) => builder.body(text.clone()),
            Some(Body::Bytes(bytes)) => builder.body(bytes.clone()),
            Some(Body::Form(form)) => builder.multipart(to_multipart(form)?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v.to_string())))
            .collect();
        let body = response.bytes().await?;

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Patch => reqwest::Method::PATCH,
    }
}

fn to_multipart(form: &FormData) -> Result<reqwest::multipart::Form, TransportError> {
    let mut multipart = reqwest::multipart::Form::new();
    for part in form.parts() {
        multipart = match &part.value {
            FormValue::Text(text) => multipart.text(part.name.clone(), text.clone()),
            FormValue::File {
                filename,
                content_type,
                data,
            } => {
                let mut file = reqwest::multipart::Part::bytes(data.to_vec()).file_name(filename.clone());
                if let Some(content_type) = content_type {
                    file = file.mime_str(content_type)?;
                }
                multipart.part(part.name.clone(), file)
            }
        };
    }
    Ok(multipart)
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return TransportError::timeout(err.to_string());
        }
        let name = if err.is_connect() {
            "ConnectError"
        } else if err.is_builder() {
            "RequestError"
        } else {
            "NetworkError"
        };
        TransportError::new(name, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(status: u16) -> RawResponse {
        RawResponse {
            status,
            status_text: String::new(),
            headers: Headers::new(),
            body: Bytes::from_static("héllo".as_bytes()),
        }
    }

    #[test]
    fn ok_covers_exactly_2xx() {
        assert!(raw(200).ok());
        assert!(raw(204).ok());
        assert!(raw(299).ok());
        assert!(!raw(199).ok());
        assert!(!raw(304).ok());
        assert!(!raw(500).ok());
    }

    #[test]
    fn text_and_blob_accessors() {
        let response = raw(200);
        assert_eq!(response.text(), "héllo");
        assert_eq!(response.blob(), response.body);
        assert!(response.json().is_err());
    }

    #[test]
    fn methods_map_to_reqwest() {
        assert_eq!(to_reqwest_method(HttpMethod::Patch), reqwest::Method::PATCH);
        assert_eq!(to_reqwest_method(HttpMethod::Delete), reqwest::Method::DELETE);
    }

    #[test]
    fn multipart_rejects_invalid_mime() {
        let form = FormData::new().file("f", "a.bin", Some("not a mime"), Bytes::from_static(b"x"));
        assert!(to_multipart(&form).is_err());
    }
}
