//! Authorization engine
//!
//! Runs the grant check, then the rights-tree check, over an operation's
//! required scopes.

pub mod decision;

pub use decision::{Decision, DenyReason};

use authx_core::{Identity, RequestContext};
use tracing::debug;

use crate::error::{AuthxError, Result};
use crate::metadata::{OperationId, ScopeDeclaration};
use crate::rights::{RightsContext, RightsEvaluator, RightsTree};
use crate::scope::{Scope, ScopeMatcher};

/// Authorization engine
///
/// # Architecture
///
/// ```text
/// ScopeDeclaration → required scopes → ScopeMatcher (grants) → RightsEvaluator → Decision
///                                         ↓ miss                   ↓ deny
///                                   Deny(grant-mismatch)     Deny(rights-mismatch)
/// ```
#[derive(Debug, Clone)]
pub struct AuthorizationEngine {
    evaluator: RightsEvaluator,
}

impl AuthorizationEngine {
    pub fn new(tree: RightsTree) -> Self {
        Self {
            evaluator: RightsEvaluator::new(tree),
        }
    }

    pub fn evaluator(&self) -> &RightsEvaluator {
        &self.evaluator
    }

    /// Compute the required scopes of an operation for this request.
    ///
    /// An operation with no declaration, or whose declarations flatten to
    /// nothing, is a configuration error.
    pub fn required_scopes(
        &self,
        operation: &OperationId,
        request: &RequestContext,
        declaration: Option<&ScopeDeclaration>,
    ) -> Result<Vec<Scope>> {
        let declaration = declaration
            .ok_or_else(|| AuthxError::MissingScopeDeclaration(operation.to_string()))?;

        let scopes = declaration.resolve(request)?;
        if scopes.is_empty() {
            return Err(AuthxError::MissingScopeDeclaration(operation.to_string()));
        }
        Ok(scopes)
    }

    /// Authorize an operation for an identity
    pub async fn authorize(
        &self,
        operation: &OperationId,
        request: &RequestContext,
        declaration: Option<&ScopeDeclaration>,
        identity: &Identity,
    ) -> Result<Decision> {
        let scopes = self.required_scopes(operation, request, declaration)?;
        self.authorize_scopes(request, &scopes, identity).await
    }

    /// Authorize already-computed required scopes.
    ///
    /// The rights tree is only consulted once every scope is covered by a
    /// grant.
    pub async fn authorize_scopes(
        &self,
        request: &RequestContext,
        scopes: &[Scope],
        identity: &Identity,
    ) -> Result<Decision> {
        let granted = ScopeMatcher::compile(identity.grants());
        let unmatched = ScopeMatcher::unmatched(scopes, &granted);

        if !unmatched.is_empty() {
            debug!(
                required = ?scopes.iter().map(Scope::as_str).collect::<Vec<_>>(),
                grants = ?identity.grants(),
                "Grant check failed"
            );
            return Ok(Decision::grant_mismatch(
                unmatched.iter().map(|s| s.to_string()).collect(),
            ));
        }

        let ctx = RightsContext::new(request, identity);
        let rejected = self.evaluator.rejected(scopes, &ctx).await?;

        if !rejected.is_empty() {
            debug!(
                rejected = ?rejected.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
                "Rights check failed"
            );
            return Ok(Decision::rights_mismatch(
                rejected.iter().map(|s| s.to_string()).collect(),
            ));
        }

        Ok(Decision::Allow)
    }
}
