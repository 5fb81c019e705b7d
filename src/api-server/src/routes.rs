//! Route table for the demo orders service
//!
//! Every business route carries an [`AuthxGuard`] layer naming its
//! operation; `/health` and `/metrics` sit outside the guard.

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use authx_authz::OperationId;
use tower_http::trace::TraceLayer;

use crate::{handlers, layer::AuthxGuard, middleware, response::ResponseBodies, state::AppState};

/// Create the application router with the default 401/403 bodies
pub fn create_router(state: AppState) -> Router {
    create_router_with_responses(state, ResponseBodies::default())
}

pub fn create_router_with_responses(state: AppState, responses: ResponseBodies) -> Router {
    let guard = AuthxGuard::with_responses(state.pipeline.clone(), responses);
    let op = |group: &str, name: &str| guard.layer(OperationId::new(group, name));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .route(
            "/orders/:id",
            get(handlers::get_order).route_layer(op("orders", "get")),
        )
        .route(
            "/orders/:id/refund",
            post(handlers::refund_order).route_layer(op("orders", "refund")),
        )
        .route(
            "/public/status",
            get(handlers::public_status).route_layer(op("public", "status")),
        )
        .route(
            "/session",
            post(handlers::create_session).route_layer(op("session", "create")),
        )
        .route("/me", get(handlers::me).route_layer(op("me", "get")))
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(middleware::cors_layer())
        .layer(TraceLayer::new_for_http())
}
