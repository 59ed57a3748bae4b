use axum::http::{self, Request, StatusCode};
use base64::Engine;
use http_body_util::BodyExt;
use mock_server::{app, Echo, MockState, ACCOUNT_OPS, CUSTOMER_OPS};
use tower::ServiceExt;

const PRIVATE: &str = "test-private";
const PUBLIC: &str = "test-public";

fn state() -> MockState {
    MockState::new(PRIVATE, PUBLIC)
}

fn auth(key: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{key}:"));
    format!("Basic {encoded}")
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn op_request(uri: &str, key: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::AUTHORIZATION, auth(key))
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- accepted calls ---

#[tokio::test]
async fn account_info_echoes_fields() {
    let resp = app(state())
        .oneshot(op_request(
            "/api/account/info",
            PRIVATE,
            r#"{"uid":"A13","email":"a@example.com"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.op, "account/info");
    assert_eq!(echo.uid, "A13");
    assert_eq!(echo.email, "a@example.com");
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    assert!(echo.on_behalf_of.is_none());
    assert!(echo.extra.is_empty());
}

#[tokio::test]
async fn customer_verify_echoes_extra_field() {
    let resp = app(state())
        .oneshot(op_request(
            "/api/customer/verify",
            PUBLIC,
            r#"{"uid":"C1","email":"","code":"654321"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.op, "customer/verify");
    assert_eq!(echo.extra["code"], "654321");
}

#[tokio::test]
async fn on_behalf_of_is_echoed() {
    let mut req = op_request("/api/account/logs", PRIVATE, r#"{"uid":"A1"}"#);
    req.headers_mut()
        .insert("On-Behalf-Of", http::HeaderValue::from_static("team-a"));
    let resp = app(state()).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.on_behalf_of.as_deref(), Some("team-a"));
}

#[tokio::test]
async fn every_known_operation_is_routed() {
    let state = state();
    for op in ACCOUNT_OPS {
        let resp = app(state.clone())
            .oneshot(op_request(&format!("/api/account/{op}"), PRIVATE, r#"{"uid":"A1"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "account/{op}");
    }
    for op in CUSTOMER_OPS {
        let resp = app(state.clone())
            .oneshot(op_request(&format!("/api/customer/{op}"), PUBLIC, r#"{"uid":"A1"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "customer/{op}");
    }
    assert_eq!(state.hits() as usize, ACCOUNT_OPS.len() + CUSTOMER_OPS.len());
}

// --- rejected calls ---

#[tokio::test]
async fn wrong_key_returns_401() {
    let resp = app(state())
        .oneshot(op_request("/api/account/info", "nope", r#"{"uid":"A1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn customer_route_rejects_private_key() {
    let resp = app(state())
        .oneshot(op_request("/api/customer/auth", PRIVATE, r#"{"uid":"A1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_authorization_returns_401() {
    let req = Request::builder()
        .method("POST")
        .uri("/api/account/info")
        .body(r#"{"uid":"A1"}"#.to_string())
        .unwrap();
    let resp = app(state()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_operation_returns_404() {
    let resp = app(state())
        .oneshot(op_request("/api/account/teleport", PRIVATE, r#"{"uid":"A1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_json_returns_400() {
    let resp = app(state())
        .oneshot(op_request("/api/account/info", PRIVATE, r#"{"uid": "#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn get_is_not_allowed() {
    let req = Request::builder()
        .uri("/api/account/info")
        .body(String::new())
        .unwrap();
    let resp = app(state()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// --- rate limiting ---

#[tokio::test]
async fn throttled_calls_return_429_with_reset() {
    let state = state();
    state.throttle(1, Some(5));

    let resp = app(state.clone())
        .oneshot(op_request("/api/account/info", PRIVATE, r#"{"uid":"A1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let reset: u64 = resp.headers()["x-ratelimit-reset"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    assert!(reset >= now && reset <= now + 6);

    let resp = app(state)
        .oneshot(op_request("/api/account/info", PRIVATE, r#"{"uid":"A1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn throttle_without_reset_omits_header() {
    let state = state();
    state.throttle(1, None);
    let resp = app(state)
        .oneshot(op_request("/api/customer/auth", PUBLIC, r#"{"uid":"A1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().get("x-ratelimit-reset").is_none());
    assert!(!body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn throttle_does_not_apply_to_rejected_credentials() {
    let state = state();
    state.throttle(1, None);

    let resp = app(state.clone())
        .oneshot(op_request("/api/account/info", "nope", r#"{"uid":"A1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app(state)
        .oneshot(op_request("/api/account/info", PRIVATE, r#"{"uid":"A1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}
