//! Cross-cutting HTTP middleware: request ids and CORS

use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// Request ID header name
pub const X_REQUEST_ID: &str = "x-request-id";

/// CORS for browser clients. Credentials travel in the `Authorization`
/// header or the `session` cookie.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static(X_REQUEST_ID),
        ])
        .expose_headers([HeaderName::from_static(X_REQUEST_ID)])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Reuse the caller's `x-request-id` when it is a UUID, otherwise mint one.
///
/// The id is stored in request extensions, echoed in the response and
/// attached to a span so guard and handler logs carry it.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    request.extensions_mut().insert(request_id);

    let span = info_span!("request", request_id = %request_id);
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }

    response
}
