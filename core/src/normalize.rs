//! Request normalization: caller options to a canonical `HttpRequest`.

use std::time::Duration;

use crate::error::HttpError;
use crate::http::{Body, Headers, HttpRequest};
use crate::options::RequestOptions;

pub const CONTENT_TYPE: &str = "content-type";
pub const APPLICATION_JSON: &str = "application/json";

/// Build the canonical request descriptor for `options`.
///
/// JSON bodies become JSON text and every non-stream request is tagged
/// `content-type: application/json` unless the caller already chose a
/// content type. Stream bodies (bytes, multipart) pass through untouched.
pub fn normalize_request(options: &RequestOptions) -> Result<HttpRequest, HttpError> {
    let mut headers = options.headers.clone().unwrap_or_else(Headers::new);

    let is_stream = options.body.as_ref().is_some_and(Body::is_stream);
    if !is_stream && !headers.contains(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, APPLICATION_JSON);
    }

    let body = match &options.body {
        Some(Body::Json(value)) => {
            Some(Body::Text(serde_json::to_string(value).map_err(HttpError::serialize)?))
        }
        other => other.clone(),
    };

    Ok(HttpRequest {
        method: options.method.unwrap_or_default(),
        url: options.url.clone().unwrap_or_default(),
        headers,
        body,
        credentials: options.credentials.unwrap_or_default(),
        signal: options.signal.clone(),
        timeout: options.timeout.unwrap_or(Duration::ZERO),
    })
}
