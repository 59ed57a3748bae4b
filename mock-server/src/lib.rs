use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, Mutex,
};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;

pub const ACCOUNT_OPS: &[&str] = &[
    "create",
    "info",
    "riskscore",
    "updateriskscore",
    "qrcode",
    "authcode",
    "logs",
    "lock",
    "unlock",
    "trainml",
    "testml",
    "authwithmetadata",
    "sendauthwithmetadata",
    "verifywithmetadata",
    "verifysession",
];

pub const CUSTOMER_OPS: &[&str] = &["create", "auth", "verify"];

/// What the mock sends back for every accepted call.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub op: String,
    pub uid: String,
    pub email: String,
    pub on_behalf_of: Option<String>,
    pub content_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct OperationRequest {
    uid: String,
    #[serde(default)]
    email: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Default)]
struct Throttle {
    remaining: u32,
    reset_in_secs: Option<u64>,
}

/// Shared server state. Clones see the same counters, so a test can keep a
/// handle while the server runs.
#[derive(Clone)]
pub struct MockState {
    private_key: Arc<str>,
    public_key: Arc<str>,
    throttle: Arc<Mutex<Throttle>>,
    hits: Arc<AtomicU32>,
}

impl MockState {
    pub fn new(private_key: &str, public_key: &str) -> Self {
        Self {
            private_key: Arc::from(private_key),
            public_key: Arc::from(public_key),
            throttle: Arc::default(),
            hits: Arc::default(),
        }
    }

    /// Answer the next `count` authenticated calls with 429. When
    /// `reset_in_secs` is set, each carries `X-RateLimit-Reset` that many
    /// seconds from now.
    pub fn throttle(&self, count: u32, reset_in_secs: Option<u64>) {
        let mut throttle = self.throttle.lock().unwrap_or_else(|e| e.into_inner());
        throttle.remaining = count;
        throttle.reset_in_secs = reset_in_secs;
    }

    /// Requests received on any route, rejected ones included.
    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    /// `Some(reset)` when this call should be rate limited.
    fn take_throttle(&self) -> Option<Option<u64>> {
        let mut throttle = self.throttle.lock().unwrap_or_else(|e| e.into_inner());
        if throttle.remaining == 0 {
            return None;
        }
        throttle.remaining -= 1;
        Some(throttle.reset_in_secs)
    }
}

pub fn app(state: MockState) -> Router {
    Router::new()
        .route("/api/account/{op}", post(account_op))
        .route("/api/customer/{op}", post(customer_op))
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

fn expected_authorization(key: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{key}:"));
    format!("Basic {encoded}")
}

fn header_str(headers: &HeaderMap, name: impl axum::http::header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn account_op(
    State(state): State<MockState>,
    Path(op): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle(&state, "account", ACCOUNT_OPS, &state.private_key, &op, &headers, &body)
}

async fn customer_op(
    State(state): State<MockState>,
    Path(op): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle(&state, "customer", CUSTOMER_OPS, &state.public_key, &op, &headers, &body)
}

fn handle(
    state: &MockState,
    scope: &str,
    known_ops: &[&str],
    key: &str,
    op: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let op_name = format!("{scope}/{op}");

    if !known_ops.contains(&op) {
        return error(StatusCode::NOT_FOUND, "unknown operation");
    }

    if header_str(headers, header::AUTHORIZATION) != Some(expected_authorization(key)) {
        tracing::debug!(op = %op_name, "rejected credentials");
        return error(StatusCode::UNAUTHORIZED, "invalid credentials");
    }

    if let Some(reset_in_secs) = state.take_throttle() {
        tracing::debug!(op = %op_name, "rate limited");
        let mut response = error(StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded");
        if let Some(secs) = reset_in_secs {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            response
                .headers_mut()
                .insert(HeaderName::from_static("x-ratelimit-reset"), HeaderValue::from(now + secs));
        }
        return response;
    }

    let input: OperationRequest = match serde_json::from_slice(body) {
        Ok(input) => input,
        Err(e) => return error(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    Json(Echo {
        op: op_name,
        uid: input.uid,
        email: input.email,
        on_behalf_of: header_str(headers, "on-behalf-of"),
        content_type: header_str(headers, header::CONTENT_TYPE),
        extra: input.extra,
    })
    .into_response()
}
