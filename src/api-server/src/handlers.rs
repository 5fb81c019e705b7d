use authx_authz::PipelineStats;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use cookie::{Cookie, SameSite};
use tracing::info;

use crate::{
    error::{ApiError, Result},
    extract::CurrentIdentity,
    models::*,
    resolver::SESSION_COOKIE,
    state::AppState,
};

/// Health check
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Pipeline counters
pub async fn metrics(State(state): State<AppState>) -> Json<PipelineStats> {
    Json(state.metrics.snapshot().await)
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>> {
    let order = state
        .orders
        .get(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("order {} not found", id)))?;

    Ok(Json(order.into()))
}

pub async fn refund_order(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>> {
    let order = state.orders.refund(&id).await?;

    info!(
        order = %order.id,
        principal = identity.principal().map(|p| p.id.as_str()).unwrap_or("-"),
        amount_cents = order.amount_cents,
        "Order refunded"
    );

    Ok(Json(order.into()))
}

/// Unauthenticated status page
pub async fn public_status(State(state): State<AppState>) -> Json<PublicStatusResponse> {
    Json(PublicStatusResponse {
        status: "ok".to_string(),
        orders: state.orders.len().await,
    })
}

/// Exchange a token for a `session` cookie; only reachable without credentials
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Response> {
    let entry = state
        .tokens
        .active(&req.token)
        .ok_or_else(|| ApiError::BadRequest("unknown or revoked token".to_string()))?;

    let cookie = Cookie::build((SESSION_COOKIE, req.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    let body = SessionResponse {
        principal: entry.principal.clone(),
    };

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie.encoded().to_string())],
        Json(body),
    )
        .into_response())
}

/// The caller's identity; anonymous callers see the anonymous grants
pub async fn me(CurrentIdentity(identity): CurrentIdentity) -> Json<MeResponse> {
    Json(MeResponse::from(&identity))
}
