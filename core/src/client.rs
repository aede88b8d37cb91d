//! Async HTTP client: interceptor chains, bounded retry and per-attempt
//! timeouts on top of a pluggable `Transport`.
//!
//! # Design
//! `HttpClient` holds its configuration, the two interceptor chains and a
//! shared transport. Every verb funnels into `request`, which runs a bounded
//! loop of attempts. Each attempt normalizes the caller's options, runs the
//! request chain, performs one round-trip and classifies the outcome. Only a
//! non-success status can trigger another attempt; transport failures and
//! aborts surface immediately.
//!
//! A caller-supplied signal always wins over the timeout. Without one, a
//! non-zero timeout installs an internal token that is cancelled when the
//! deadline passes. The deadline lives only as long as the round-trip
//! future, so it can never fire after the attempt has settled, and the next
//! attempt arms a fresh one.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::config::HttpConfig;
use crate::error::HttpError;
use crate::http::{Credentials, Headers, HttpMethod, HttpRequest, HttpResponse};
use crate::interceptor::Interceptors;
use crate::normalize::normalize_request;
use crate::options::RequestOptions;
use crate::parse::parse_response;
use crate::retry;
use crate::transport::{RawResponse, ReqwestTransport, Transport};

/// Headers that carry credentials and are subject to the `Credentials` policy.
const CREDENTIAL_HEADERS: [&str; 3] = ["authorization", "cookie", "proxy-authorization"];

enum Attempt {
    Success(HttpResponse),
    Failure(HttpResponse),
}

/// Async HTTP client bound to one endpoint.
///
/// Relative urls are resolved against `config.endpoint`. The client is
/// `Send + Sync`; wrap it in an `Arc` to share it between tasks, and all of
/// them see the same interceptor chains.
pub struct HttpClient {
    config: HttpConfig,
    interceptors: Interceptors,
    transport: Arc<dyn Transport>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(HttpConfig::default())
    }
}

impl HttpClient {
    /// Client over the default reqwest transport.
    pub fn new(config: HttpConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(config: HttpConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            interceptors: Interceptors::default(),
            transport,
        }
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    pub fn interceptors(&self) -> &Interceptors {
        &self.interceptors
    }

    pub async fn get(&self, url: &str, options: RequestOptions) -> Result<HttpResponse, HttpError> {
        self.request(url, options.method(HttpMethod::Get)).await
    }

    pub async fn post(&self, url: &str, options: RequestOptions) -> Result<HttpResponse, HttpError> {
        self.request(url, options.method(HttpMethod::Post)).await
    }

    pub async fn put(&self, url: &str, options: RequestOptions) -> Result<HttpResponse, HttpError> {
        self.request(url, options.method(HttpMethod::Put)).await
    }

    pub async fn delete(&self, url: &str, options: RequestOptions) -> Result<HttpResponse, HttpError> {
        self.request(url, options.method(HttpMethod::Delete)).await
    }

    pub async fn patch(&self, url: &str, options: RequestOptions) -> Result<HttpResponse, HttpError> {
        self.request(url, options.method(HttpMethod::Patch)).await
    }

    /// Perform a request, retrying retryable statuses as allowed by
    /// `options.retry` and the method's default.
    ///
    /// On final failure the error passes through the response chain's
    /// `rejected` handlers, which may reshape it but never turn it into a
    /// success.
    pub async fn request(&self, url: &str, options: RequestOptions) -> Result<HttpResponse, HttpError> {
        let mut options = options;
        options.url = Some(url.to_string());
        let method = options.method.unwrap_or_default();

        let mut attempt: u32 = 1;
        loop {
            let response = match self.attempt(&options, attempt).await? {
                Attempt::Success(response) => return Ok(response),
                Attempt::Failure(response) => response,
            };

            if let Some(next) = retry::next_retry(method, options.retry, response.status) {
                if self.config.debug {
                    debug!(%method, url, status = response.status, attempt, "retrying request");
                }
                options.retry = Some(next);
                attempt += 1;
                continue;
            }

            warn!(%method, url, status = response.status, attempts = attempt, "request failed");
            let error = HttpError::status(response);
            return Err(self.interceptors.response.run_rejected(error).await);
        }
    }

    async fn attempt(&self, options: &RequestOptions, attempt: u32) -> Result<Attempt, HttpError> {
        let request = normalize_request(options)?;
        let mut request = self.interceptors.request.run_fulfilled(request).await?;

        let url = resolve_url(&self.config.endpoint, &request.url);
        if !sends_credentials(request.credentials, &self.config.endpoint, &url) {
            strip_credentials(&mut request.headers);
        }

        if self.config.debug {
            debug!(method = %request.method, url = %url, attempt, "sending request");
        }
        let raw = self.dispatch(&url, &mut request).await.inspect_err(|err| {
            warn!(method = %request.method, url = %url, error = %err, "request did not complete");
        })?;
        if self.config.debug {
            debug!(url = %url, status = raw.status, attempt, "received response");
        }

        let response_type = options.response_type.unwrap_or_default();
        let data = parse_response(&raw, response_type).inspect_err(|err| {
            warn!(url = %url, status = raw.status, error = %err, "response could not be decoded");
        })?;
        let ok = raw.ok();
        let response = HttpResponse {
            data,
            status: raw.status,
            status_text: raw.status_text,
            headers: raw.headers,
            ok,
        };

        if !ok {
            return Ok(Attempt::Failure(response));
        }
        let response = self.interceptors.response.run_fulfilled(response).await?;
        Ok(Attempt::Success(response))
    }

    /// One round-trip, raced against the request signal and the timeout.
    async fn dispatch(&self, url: &str, request: &mut HttpRequest) -> Result<RawResponse, HttpError> {
        let deadline = if request.signal.is_none() && !request.timeout.is_zero() {
            request.signal = Some(CancellationToken::new());
            Some(request.timeout)
        } else {
            None
        };
        let request = &*request;
        let signal = request.signal.clone();

        let cancelled = async {
            match &signal {
                Some(signal) => signal.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };
        let expired = async {
            match deadline {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(HttpError::aborted("request aborted")),
            _ = expired => {
                if let Some(signal) = &signal {
                    signal.cancel();
                }
                Err(HttpError::aborted(format!(
                    "request timed out after {}ms",
                    request.timeout.as_millis()
                )))
            }
            result = self.transport.send(url, request) => result.map_err(HttpError::from),
        }
    }
}

/// Absolute urls are used verbatim; anything else is appended to `endpoint`.
fn resolve_url(endpoint: &str, url: &str) -> String {
    let url = if url.is_empty() { "/" } else { url };
    if is_absolute(url) {
        url.to_string()
    } else {
        format!("{endpoint}{url}")
    }
}

fn is_absolute(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn sends_credentials(policy: Credentials, endpoint: &str, url: &str) -> bool {
    match policy {
        Credentials::Include => true,
        Credentials::Omit => false,
        Credentials::SameOrigin => same_origin(endpoint, url),
    }
}

/// An endpoint or url without a parseable origin counts as same-origin.
fn same_origin(endpoint: &str, url: &str) -> bool {
    match (Url::parse(endpoint), Url::parse(url)) {
        (Ok(base), Ok(target)) => base.origin() == target.origin(),
        _ => true,
    }
}

fn strip_credentials(headers: &mut Headers) {
    for name in CREDENTIAL_HEADERS {
        headers.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_urls_are_prefixed_with_endpoint() {
        assert_eq!(resolve_url("http://localhost:3000", "/items"), "http://localhost:3000/items");
        assert_eq!(resolve_url("http://localhost:3000/api", "/v1"), "http://localhost:3000/api/v1");
        assert_eq!(resolve_url("", "/items"), "/items");
    }

    #[test]
    fn empty_url_defaults_to_root() {
        assert_eq!(resolve_url("http://localhost:3000", ""), "http://localhost:3000/");
    }

    #[test]
    fn absolute_urls_are_used_verbatim() {
        assert_eq!(resolve_url("http://localhost:3000", "https://other.example/x"), "https://other.example/x");
        assert_eq!(resolve_url("http://localhost:3000", "HTTP://Upper.example"), "HTTP://Upper.example");
        assert_eq!(resolve_url("http://a", "httpbin/x"), "http://ahttpbin/x");
    }

    #[test]
    fn same_origin_compares_scheme_host_and_port() {
        assert!(same_origin("http://localhost:3000", "http://localhost:3000/x"));
        assert!(!same_origin("http://localhost:3000", "http://localhost:4000/x"));
        assert!(!same_origin("http://localhost:3000", "https://localhost:3000/x"));
        assert!(same_origin("", "https://anywhere.example"));
    }

    #[test]
    fn credentials_policy() {
        let endpoint = "https://api.example.com";
        assert!(sends_credentials(Credentials::Include, endpoint, "https://evil.example"));
        assert!(!sends_credentials(Credentials::Omit, endpoint, "https://api.example.com/x"));
        assert!(sends_credentials(Credentials::SameOrigin, endpoint, "https://api.example.com/x"));
        assert!(!sends_credentials(Credentials::SameOrigin, endpoint, "https://evil.example/x"));
    }

    #[test]
    fn strip_credentials_removes_only_credential_headers() {
        let mut headers: Headers = [
            ("Authorization", "Bearer t"),
            ("Cookie", "a=b"),
            ("Accept", "application/json"),
        ]
        .into_iter()
        .collect();
        strip_credentials(&mut headers);
        assert_eq!(headers.len(), 1);
        assert!(headers.contains("accept"));
    }
}
