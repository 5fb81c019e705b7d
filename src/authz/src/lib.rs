//! # Authx Authorization
//!
//! Access-control decisions for request handlers.
//!
//! ## Features
//!
//! - **Glob grant matching** over slash-separated scopes (`*`, `?`, `**`)
//! - **Rights tree** re-validating granted scopes against the concrete request
//! - **Policy pipeline** composing authentication outcome, the operation's
//!   `REQUIRED` / `OPTIONAL` / `DISALLOWED` / `SKIP` policy, and authorization
//! - **TOML configuration** for operations, groups and anonymous grants
//!
//! ## Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use authx_authz::{
//!     OperationId, OperationMeta, OperationRegistry, PipelineOutcome, PolicyPipeline,
//!     RightsNode, ScopeSpec,
//! };
//! use authx_core::{
//!     AuthenticationResolver, AuthnOutcome, Credential, IdentityPayload, Principal,
//!     RequestContext,
//! };
//!
//! struct Everyone;
//!
//! #[async_trait]
//! impl AuthenticationResolver for Everyone {
//!     async fn resolve(&self, _: &RequestContext) -> authx_core::Result<AuthnOutcome> {
//!         Ok(AuthnOutcome::Identified(IdentityPayload::new(
//!             Principal::new("user:alice"),
//!             Credential::new("tok-1", "bearer"),
//!             vec!["orders/*/read".to_string()],
//!         )))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let get_order = OperationId::new("orders", "get");
//!
//!     let mut registry = OperationRegistry::new();
//!     registry.register(
//!         get_order.clone(),
//!         OperationMeta::new().scope(ScopeSpec::template("orders/{id}/read")),
//!     )?;
//!
//!     let tree = RightsNode::new().child(
//!         "orders",
//!         RightsNode::new().wildcard(RightsNode::new().child("read", RightsNode::new().allow())),
//!     );
//!
//!     let pipeline = PolicyPipeline::builder()
//!         .resolver(Everyone)
//!         .metadata(registry)
//!         .rights_tree(tree)
//!         .build()?;
//!
//!     let request = RequestContext::new("GET", "/orders/42").with_param("id", "42");
//!     let outcome = pipeline.run(&get_order, &request).await?;
//!
//!     assert!(matches!(outcome, PipelineOutcome::Allowed { .. }));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod metrics;
pub mod pipeline;
pub mod rights;
pub mod scope;

// Re-export commonly used types
pub use config::{AuthxConfig, GroupConfig, OperationConfig};
pub use engine::{AuthorizationEngine, Decision, DenyReason};
pub use error::{AuthxError, Result};
pub use metadata::{
    GroupMeta, OperationId, OperationMeta, OperationMetadata, OperationRegistry,
    ScopeDeclaration, ScopeSpec,
};
pub use metrics::{PipelineMetrics, PipelineStats};
pub use pipeline::{PipelineOutcome, PolicyPipeline, PolicyPipelineBuilder, UnauthorizedReason};
pub use rights::{
    ContextFlow, NodeContext, RightPredicate, RightsContext, RightsEvaluator, RightsNode,
    RightsTree, ROOT_SEGMENT,
};
pub use scope::{escape_segment, GrantPattern, Scope, ScopeError, ScopeMatcher};
