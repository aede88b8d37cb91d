//! Scripted HTTP server used to exercise the client end to end.
//!
//! Routes:
//! - `ANY  /echo`            → 200 with the method, headers and body it received
//! - `ANY  /status/{code}`   → `code` with `{"status": code}`
//! - `ANY  /flaky/{fails}`   → 503 for the first `fails` hits, then 200
//! - `GET  /text`            → `hello` as `text/plain`
//! - `GET  /empty`           → 204 without a body
//! - `GET  /slow/{ms}`       → 200 after sleeping `ms` milliseconds
//! - `GET  /hits`            → number of hits per path
//!
//! Every route except `/hits` counts its hits, keyed by request path.

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

/// What `/echo` saw.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

pub type Hits = Arc<RwLock<HashMap<String, u32>>>;

pub fn app() -> Router {
    let hits: Hits = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/flaky/{fails}", any(flaky))
        .route("/text", get(text))
        .route("/empty", get(empty))
        .route("/slow/{ms}", get(slow))
        .layer(middleware::from_fn_with_state(hits.clone(), count_hits))
        .route("/hits", get(list_hits))
        .with_state(hits)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn count_hits(State(hits): State<Hits>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    *hits.write().await.entry(path).or_insert(0) += 1;
    next.run(request).await
}

async fn list_hits(State(hits): State<Hits>) -> Json<HashMap<String, u32>> {
    Json(hits.read().await.clone())
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
        .collect();
    Json(Echo {
        method: method.to_string(),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn status(Path(code): Path<u16>) -> Response {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, Json(serde_json::json!({ "status": code }))).into_response(),
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn flaky(State(hits): State<Hits>, Path(fails): Path<u32>, uri: Uri) -> Response {
    let seen = hits.read().await.get(uri.path()).copied().unwrap_or(0);
    if seen <= fails {
        (StatusCode::SERVICE_UNAVAILABLE, Json(serde_json::json!({ "attempt": seen }))).into_response()
    } else {
        Json(serde_json::json!({ "attempt": seen })).into_response()
    }
}

async fn text() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "hello")
}

async fn empty() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn slow(Path(ms): Path<u64>) -> Json<serde_json::Value> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(serde_json::json!({ "slept": ms }))
}
