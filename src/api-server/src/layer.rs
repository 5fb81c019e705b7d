//! Tower middleware running the policy pipeline in front of a route
//!
//! ```ignore
//! let guard = AuthxGuard::new(pipeline);
//! let app = Router::new().route(
//!     "/orders/:id",
//!     get(get_order).route_layer(guard.layer("orders.get".parse()?)),
//! );
//! ```
//!
//! The layer must be applied with `route_layer` (or on the `MethodRouter`)
//! so that path parameters are available to scope templates.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use authx_authz::{OperationId, PipelineOutcome, PolicyPipeline};
use axum::{
    body::Body,
    extract::{FromRequestParts, RawPathParams, Request},
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::request::request_context;
use crate::response::ResponseBodies;

/// Shared state for every guarded route
struct GuardState {
    pipeline: PolicyPipeline,
    responses: ResponseBodies,
}

/// Factory for per-operation [`AuthxLayer`]s sharing one pipeline
#[derive(Clone)]
pub struct AuthxGuard {
    state: Arc<GuardState>,
}

impl AuthxGuard {
    pub fn new(pipeline: PolicyPipeline) -> Self {
        Self::with_responses(pipeline, ResponseBodies::default())
    }

    pub fn with_responses(pipeline: PolicyPipeline, responses: ResponseBodies) -> Self {
        Self {
            state: Arc::new(GuardState {
                pipeline,
                responses,
            }),
        }
    }

    /// Layer guarding one operation
    pub fn layer(&self, operation: OperationId) -> AuthxLayer {
        AuthxLayer {
            state: self.state.clone(),
            operation: Arc::new(operation),
        }
    }
}

/// Layer that runs the policy pipeline for one operation.
#[derive(Clone)]
pub struct AuthxLayer {
    state: Arc<GuardState>,
    operation: Arc<OperationId>,
}

impl<S> Layer<S> for AuthxLayer {
    type Service = AuthxService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthxService {
            inner,
            state: self.state.clone(),
            operation: self.operation.clone(),
        }
    }
}

/// Service that runs the pipeline and attaches the identity on success.
#[derive(Clone)]
pub struct AuthxService<S> {
    inner: S,
    state: Arc<GuardState>,
    operation: Arc<OperationId>,
}

impl<S> Service<Request<Body>> for AuthxService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let state = self.state.clone();
        let operation = self.operation.clone();
        let not_ready_inner = self.inner.clone();
        let mut ready_inner = std::mem::replace(&mut self.inner, not_ready_inner);

        Box::pin(async move {
            let (mut parts, body) = request.into_parts();

            // Absent when the layer sits outside route matching
            let ctx = match RawPathParams::from_request_parts(&mut parts, &()).await {
                Ok(params) => request_context(&parts, params.iter()),
                Err(rejection) => {
                    debug!(operation = %operation, error = %rejection, "No path parameters");
                    request_context(&parts, std::iter::empty())
                }
            };

            let outcome = match state.pipeline.run(&operation, &ctx).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    // already logged by the pipeline
                    return Ok(ApiError::from(e).into_response());
                }
            };

            match outcome {
                PipelineOutcome::Skipped => {}
                PipelineOutcome::Allowed { identity } => {
                    parts.extensions.insert(identity);
                }
                PipelineOutcome::Unauthorized { reason } => {
                    warn!(
                        operation = %operation,
                        path = %ctx.path,
                        reason = ?reason,
                        "Unauthorized"
                    );
                    return Ok(state.responses.unauthorized(&ctx));
                }
                PipelineOutcome::Forbidden { scopes, reason, .. } => {
                    warn!(
                        operation = %operation,
                        path = %ctx.path,
                        reason = %reason,
                        "Forbidden"
                    );
                    return Ok(state.responses.forbidden(&ctx, &scopes));
                }
            }

            ready_inner
                .call(Request::from_parts(parts, body))
                .await
        })
    }
}
