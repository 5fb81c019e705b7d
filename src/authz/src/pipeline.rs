//! Authentication/authorization policy pipeline
//!
//! ```text
//! START ─ SKIP ──────────────────────────────────────────────→ Skipped
//!   └→ AUTHENTICATING ─ rejected ────────────────────────────→ Unauthorized
//!        └→ Identified | Anonymous → POLICY-CHECK ─ violated ─→ Unauthorized
//!                                      └→ AuthorizationEngine ─→ Allowed | Forbidden
//! ```

use std::sync::Arc;

use authx_core::{AuthenticationResolver, AuthnOutcome, AuthnPolicy, Identity, RequestContext};
use tracing::{debug, error};

use crate::engine::{AuthorizationEngine, Decision, DenyReason};
use crate::error::{AuthxError, Result};
use crate::metadata::{OperationId, OperationMetadata};
use crate::metrics::PipelineMetrics;
use crate::rights::RightsTree;
use crate::scope::Scope;

/// Why a request was refused as unauthenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedReason {
    /// The resolver found credentials and rejected them
    RejectedCredentials,
    /// The attached identity does not satisfy the operation's policy
    PolicyViolation { policy: AuthnPolicy },
}

/// Terminal state of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The operation is `SKIP`; no identity was resolved
    Skipped,
    Allowed {
        identity: Identity,
    },
    Unauthorized {
        reason: UnauthorizedReason,
    },
    Forbidden {
        identity: Identity,
        /// Required scopes computed for the request
        scopes: Vec<Scope>,
        reason: DenyReason,
    },
}

impl PipelineOutcome {
    /// Whether the handler may run
    pub fn is_allowed(&self) -> bool {
        matches!(self, PipelineOutcome::Skipped | PipelineOutcome::Allowed { .. })
    }

    /// Identity to attach to the request, if one was resolved and admitted
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            PipelineOutcome::Allowed { identity } => Some(identity),
            _ => None,
        }
    }

    /// Consume the outcome, returning the identity to attach
    pub fn into_identity(self) -> Option<Identity> {
        match self {
            PipelineOutcome::Allowed { identity } => Some(identity),
            _ => None,
        }
    }
}

/// Composes authentication, the operation's authentication policy and
/// authorization for one request.
///
/// Cloning is cheap; clones share the resolver, metadata, rights tree and
/// metrics.
#[derive(Clone)]
pub struct PolicyPipeline {
    resolver: Arc<dyn AuthenticationResolver>,
    metadata: Arc<dyn OperationMetadata>,
    engine: AuthorizationEngine,
    anonymous_grants: Arc<[String]>,
    metrics: Option<PipelineMetrics>,
}

impl PolicyPipeline {
    pub fn builder() -> PolicyPipelineBuilder {
        PolicyPipelineBuilder::default()
    }

    pub fn engine(&self) -> &AuthorizationEngine {
        &self.engine
    }

    pub fn metrics(&self) -> Option<&PipelineMetrics> {
        self.metrics.as_ref()
    }

    pub fn anonymous_grants(&self) -> &[String] {
        &self.anonymous_grants
    }

    /// Run the pipeline for `operation`.
    ///
    /// Unauthorized and forbidden exits are values. Errors are fatal: a
    /// policy configuration inconsistent with the operation, or a failing
    /// resolver or rights callback.
    pub async fn run(
        &self,
        operation: &OperationId,
        request: &RequestContext,
    ) -> Result<PipelineOutcome> {
        let result = self.evaluate(operation, request).await;

        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(PipelineOutcome::Skipped) => metrics.record_skipped().await,
                Ok(PipelineOutcome::Allowed { .. }) => metrics.record_allowed().await,
                Ok(PipelineOutcome::Unauthorized { .. }) => metrics.record_unauthorized().await,
                Ok(PipelineOutcome::Forbidden { reason, .. }) => {
                    metrics.record_forbidden(reason).await
                }
                Err(_) => metrics.record_error().await,
            }
        }

        if let Err(e) = &result {
            error!(operation = %operation, error = %e, "Policy pipeline failed");
        }
        result
    }

    async fn evaluate(
        &self,
        operation: &OperationId,
        request: &RequestContext,
    ) -> Result<PipelineOutcome> {
        let policy = self.metadata.authn_policy(operation)?;

        if policy == AuthnPolicy::Skip {
            debug!(operation = %operation, "Authentication skipped");
            return Ok(PipelineOutcome::Skipped);
        }

        let outcome = self
            .resolver
            .resolve(request)
            .await
            .map_err(|e| AuthxError::Resolver(e.to_string()))?;

        let identity = match outcome {
            AuthnOutcome::Rejected => {
                debug!(operation = %operation, "Credentials rejected");
                return Ok(PipelineOutcome::Unauthorized {
                    reason: UnauthorizedReason::RejectedCredentials,
                });
            }
            AuthnOutcome::Identified(payload) => Identity::identified(payload),
            AuthnOutcome::Anonymous => Identity::anonymous(self.anonymous_grants.to_vec()),
        };

        if !policy.admits(&identity) {
            debug!(
                operation = %operation,
                policy = %policy,
                identified = identity.is_identified(),
                "Authentication policy not satisfied"
            );
            return Ok(PipelineOutcome::Unauthorized {
                reason: UnauthorizedReason::PolicyViolation { policy },
            });
        }

        let declaration = self.metadata.scopes(operation)?;
        let scopes = self
            .engine
            .required_scopes(operation, request, declaration)?;

        match self
            .engine
            .authorize_scopes(request, &scopes, &identity)
            .await?
        {
            Decision::Allow => {
                debug!(operation = %operation, "Authorized");
                Ok(PipelineOutcome::Allowed { identity })
            }
            Decision::Deny { reason } => {
                debug!(operation = %operation, reason = %reason, "Forbidden");
                Ok(PipelineOutcome::Forbidden {
                    identity,
                    scopes,
                    reason,
                })
            }
        }
    }
}

/// Builder for [`PolicyPipeline`]
#[derive(Default)]
pub struct PolicyPipelineBuilder {
    resolver: Option<Arc<dyn AuthenticationResolver>>,
    metadata: Option<Arc<dyn OperationMetadata>>,
    tree: Option<RightsTree>,
    anonymous_grants: Vec<String>,
    metrics: Option<PipelineMetrics>,
}

impl PolicyPipelineBuilder {
    pub fn resolver<R: AuthenticationResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn shared_resolver(mut self, resolver: Arc<dyn AuthenticationResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn metadata<M: OperationMetadata + 'static>(mut self, metadata: M) -> Self {
        self.metadata = Some(Arc::new(metadata));
        self
    }

    pub fn rights_tree(mut self, tree: impl Into<RightsTree>) -> Self {
        self.tree = Some(tree.into());
        self
    }

    /// Grants given to callers without credentials
    pub fn anonymous_grants<I, S>(mut self, grants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.anonymous_grants = grants.into_iter().map(Into::into).collect();
        self
    }

    pub fn metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> Result<PolicyPipeline> {
        let resolver = self
            .resolver
            .ok_or_else(|| AuthxError::config("policy pipeline requires an authentication resolver"))?;
        let metadata = self
            .metadata
            .ok_or_else(|| AuthxError::config("policy pipeline requires operation metadata"))?;
        let tree = self
            .tree
            .ok_or_else(|| AuthxError::config("policy pipeline requires a rights tree"))?;

        Ok(PolicyPipeline {
            resolver,
            metadata,
            engine: AuthorizationEngine::new(tree),
            anonymous_grants: self.anonymous_grants.into(),
            metrics: self.metrics,
        })
    }
}
