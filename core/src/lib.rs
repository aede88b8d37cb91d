//! Thin async HTTP client with interceptor chains and bounded retry.
//!
//! # Overview
//! `HttpClient` turns caller options into a canonical request, runs it through
//! the request interceptor chain, performs the round-trip over a `Transport`,
//! decodes the body according to the requested `ResponseType` and runs the
//! result through the response chain. Retryable statuses are retried a bounded
//! number of times; every other failure is returned as an `HttpError`.
//!
//! # Design
//! - Every verb funnels into `HttpClient::request`.
//! - Interceptor chains are append-only lists with holes: `eject` never
//!   renumbers other handlers.
//! - Retry is a loop carrying the remaining count; the default is one retry
//!   for GET and none for payload methods.
//! - Timeouts and cancellation are per attempt and use `CancellationToken`.
//! - I/O goes through the `Transport` trait; `ReqwestTransport` is the default.
//!
//! ```no_run
//! use fetchwrap_core::{HttpClient, HttpConfig, RequestOptions};
//!
//! # async fn run() -> Result<(), fetchwrap_core::HttpError> {
//! let client = HttpClient::new(HttpConfig::new("https://api.example.com"));
//! client.interceptors().request.on_fulfilled(|mut req| async move {
//!     req.headers.insert("authorization", "Bearer token");
//!     Ok(req)
//! });
//!
//! let created = client
//!     .post("/v1/items", RequestOptions::new().json(&serde_json::json!({ "name": "demo" }))?)
//!     .await?;
//! println!("status={}", created.status);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod normalize;
pub mod options;
pub mod parse;
pub mod retry;
pub mod transport;

pub use client::HttpClient;
pub use config::{HttpConfig, HttpConfigOverrides};
pub use error::{ErrorKind, HttpError, TransportError};
pub use http::{
    Body, Credentials, FormData, Headers, HttpMethod, HttpRequest, HttpResponse, ParseMethodError,
    ResponseData, ResponseType,
};
pub use interceptor::{Interceptor, InterceptorManager, Interceptors};
pub use options::{RequestOptions, Retry};
pub use transport::{RawResponse, ReqwestTransport, Transport};

pub use tokio_util::sync::CancellationToken;
