//! Extractors for the identity attached by [`AuthxLayer`](crate::layer::AuthxLayer)

use authx_core::Identity;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// The identity resolved for this request.
///
/// Rejects with a 500 when the handler is not behind the guard or its
/// operation is `SKIP`: no identity exists in either case.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentIdentity)
            .ok_or_else(|| {
                ApiError::Internal(
                    "identity not found - handler is not in the authentication flow".to_owned(),
                )
            })
    }
}
