//! End-to-end tests of the guarded orders service over the demo configuration

use authx_server::{routes, AppState, ResponseBodies, ServerFileConfig};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::IntoResponse,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// ============================================================================
// Fixtures
// ============================================================================

const EXTRA_TOKENS: &str = r#"
[tokens.tok-carol]
principal = "user:carol"
grants = ["me/read"]
"#;

fn state() -> AppState {
    let raw = format!("{}\n{}", authx_server::config::DEMO_CONFIG, EXTRA_TOKENS);
    let config = ServerFileConfig::from_toml_str(&raw).unwrap();
    AppState::from_config(&config).unwrap()
}

fn app() -> Router {
    routes::create_router(state())
}

fn request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_required_without_credentials_is_unauthorized() {
    let (status, body) = send(&app(), request("GET", "/orders/1001", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Unauthorized." }));
}

#[tokio::test]
async fn test_revoked_token_is_unauthorized() {
    let (status, _) = send(&app(), request("GET", "/me", Some("tok-mallory"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_skip_ignores_bad_credentials() {
    let (status, body) = send(&app(), request("GET", "/public/status", Some("tok-bogus"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orders"], 2);
}

#[tokio::test]
async fn test_optional_accepts_anonymous_and_identified() {
    let app = app();

    let (status, body) = send(&app, request("GET", "/me", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identified"], false);
    assert_eq!(body["grants"], json!(["me/read", "session/create"]));

    let (status, body) = send(&app, request("GET", "/me", Some("tok-alice"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identified"], true);
    assert_eq!(body["principal"], "user:alice");
}

#[tokio::test]
async fn test_disallowed_rejects_identified_callers() {
    let login = || {
        Request::builder()
            .method("POST")
            .uri("/session")
            .header(header::CONTENT_TYPE, "application/json")
    };

    let identified = login()
        .header(header::AUTHORIZATION, "Bearer tok-sam")
        .body(Body::from(r#"{"token":"tok-alice"}"#))
        .unwrap();
    let (status, _) = send(&app(), identified).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_cookie_round_trip() {
    let app = app();

    let login = Request::builder()
        .method("POST")
        .uri("/session")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"token":"tok-alice"}"#))
        .unwrap();
    let response = app.clone().oneshot(login).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("session=tok-alice"));
    assert!(set_cookie.contains("HttpOnly"));

    let order = Request::builder()
        .uri("/orders/1001")
        .header(header::COOKIE, "session=tok-alice")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, order).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner"], "user:alice");
}

#[tokio::test]
async fn test_session_rejects_revoked_token() {
    let login = Request::builder()
        .method("POST")
        .uri("/session")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"token":"tok-mallory"}"#))
        .unwrap();

    let (status, _) = send(&app(), login).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Authorization
// ============================================================================

#[tokio::test]
async fn test_owner_reads_own_order() {
    let (status, body) = send(&app(), request("GET", "/orders/1001", Some("tok-alice"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "1001");
    assert_eq!(body["amount_cents"], 4250);
}

#[tokio::test]
async fn test_rights_mismatch_is_forbidden() {
    let (status, body) = send(&app(), request("GET", "/orders/1002", Some("tok-alice"))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "Forbidden." }));
}

#[tokio::test]
async fn test_grant_mismatch_is_forbidden() {
    let (status, _) = send(&app(), request("GET", "/orders/1001", Some("tok-carol"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_order_is_forbidden() {
    let (status, _) = send(&app(), request("GET", "/orders/9999", Some("tok-sam"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reserved_characters_in_order_id_are_forbidden() {
    let app = app();

    for uri in ["/orders/%2A", "/orders/4%3F", "/orders/%7Bx%7D", "/orders/a%2Fb"] {
        let (status, body) = send(&app, request("GET", uri, Some("tok-alice"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(body, json!({ "error": "Forbidden." }));
    }

    let (_, stats) = send(&app, request("GET", "/metrics", None)).await;
    assert_eq!(stats["errors"], 0);
    assert_eq!(stats["forbidden_rights_mismatch"], 4);
}

#[tokio::test]
async fn test_refund_needs_support_role() {
    let (status, _) = send(
        &app(),
        request("POST", "/orders/1001/refund", Some("tok-alice")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_refund_once() {
    let app = app();

    let (status, body) = send(&app, request("POST", "/orders/1001/refund", Some("tok-sam"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refunded"], true);

    // The refund right now denies
    let (status, _) = send(&app, request("POST", "/orders/1001/refund", Some("tok-sam"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_custom_forbidden_body_sees_request_and_scopes() {
    let responses = ResponseBodies::new().with_forbidden(|request, scopes| {
        let scopes: Vec<String> = scopes.iter().map(|s| s.to_string()).collect();
        (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "error": "Not found.", "path": request.path, "scopes": scopes })),
        )
            .into_response()
    });
    let app = routes::create_router_with_responses(state(), responses);

    let (status, body) = send(&app, request("POST", "/orders/1002/refund", Some("tok-alice"))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["path"], "/orders/1002/refund");
    assert_eq!(body["scopes"], json!(["orders/1002/refund", "orders/1002/read"]));
}

// ============================================================================
// Metrics and plumbing
// ============================================================================

#[tokio::test]
async fn test_metrics_count_outcomes() {
    let app = app();

    send(&app, request("GET", "/orders/1001", Some("tok-alice"))).await;
    send(&app, request("GET", "/orders/1002", Some("tok-alice"))).await;
    send(&app, request("GET", "/orders/1001", Some("tok-carol"))).await;
    send(&app, request("GET", "/orders/1001", None)).await;
    send(&app, request("GET", "/public/status", None)).await;

    let (status, stats) = send(&app, request("GET", "/metrics", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_requests"], 5);
    assert_eq!(stats["allowed"], 1);
    assert_eq!(stats["skipped"], 1);
    assert_eq!(stats["unauthorized"], 1);
    assert_eq!(stats["forbidden_grant_mismatch"], 1);
    assert_eq!(stats["forbidden_rights_mismatch"], 1);
    assert_eq!(stats["errors"], 0);
}

#[tokio::test]
async fn test_request_id_echoed_on_denials() {
    let response = app()
        .oneshot(request("GET", "/orders/1001", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_concurrent_requests_share_state() {
    let app = app();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let token = if i % 2 == 0 { "tok-alice" } else { "tok-sam" };
                send(&app, request("GET", "/orders/1001", Some(token))).await.0
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }
}
