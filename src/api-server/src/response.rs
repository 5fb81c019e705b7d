//! Responses emitted when the guard refuses a request

use std::fmt;
use std::sync::Arc;

use authx_authz::Scope;
use authx_core::RequestContext;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

type UnauthorizedFn = Arc<dyn Fn(&RequestContext) -> Response + Send + Sync>;
type ForbiddenFn = Arc<dyn Fn(&RequestContext, &[Scope]) -> Response + Send + Sync>;

/// Builders for 401 and 403 responses.
///
/// Defaults are `{"error":"Unauthorized."}` and `{"error":"Forbidden."}`.
/// Both builders receive the refused request; the forbidden builder also
/// receives the required scopes computed for it.
#[derive(Clone)]
pub struct ResponseBodies {
    unauthorized: UnauthorizedFn,
    forbidden: ForbiddenFn,
}

impl ResponseBodies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unauthorized<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestContext) -> Response + Send + Sync + 'static,
    {
        self.unauthorized = Arc::new(f);
        self
    }

    pub fn with_forbidden<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestContext, &[Scope]) -> Response + Send + Sync + 'static,
    {
        self.forbidden = Arc::new(f);
        self
    }

    pub fn unauthorized(&self, request: &RequestContext) -> Response {
        (self.unauthorized)(request)
    }

    pub fn forbidden(&self, request: &RequestContext, scopes: &[Scope]) -> Response {
        (self.forbidden)(request, scopes)
    }
}

impl Default for ResponseBodies {
    fn default() -> Self {
        Self {
            unauthorized: Arc::new(|_| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "Unauthorized." })),
                )
                    .into_response()
            }),
            forbidden: Arc::new(|_, _| {
                (StatusCode::FORBIDDEN, Json(json!({ "error": "Forbidden." }))).into_response()
            }),
        }
    }
}

impl fmt::Debug for ResponseBodies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBodies").finish_non_exhaustive()
    }
}
