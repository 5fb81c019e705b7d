//! Walks required scopes through the rights tree

use authx_core::Locals;
use futures::future::join_all;
use tracing::{debug, trace};

use super::callback::{ContextFlow, NodeContext, RightsContext};
use super::tree::{RightsNode, RightsTree};
use crate::error::{AuthxError, Result};
use crate::scope::Scope;

/// Segment marker handed to the root node's context function
pub const ROOT_SEGMENT: &str = "[ROOT]";

/// Evaluates scopes against a [`RightsTree`]
#[derive(Debug, Clone)]
pub struct RightsEvaluator {
    tree: RightsTree,
}

impl RightsEvaluator {
    pub fn new(tree: RightsTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &RightsTree {
        &self.tree
    }

    /// Evaluate one scope.
    ///
    /// Returns `Ok(false)` when a context function rejects or the terminal
    /// predicate denies. A segment with no matching node, a terminal node
    /// without a right predicate, and a failing callback are errors.
    pub async fn evaluate(&self, scope: &Scope, ctx: &RightsContext<'_>) -> Result<bool> {
        let mut locals = Locals::new();
        let mut node: &RightsNode = self.tree.root();

        if let Some(context) = node.node_context() {
            trace!(scope = %scope, "Entering rights tree root");
            if enter(context, scope, ROOT_SEGMENT, ctx, &mut locals).await? == ContextFlow::Reject {
                debug!(scope = %scope, "Root context rejected scope");
                return Ok(false);
            }
        }

        for segment in scope.segments() {
            node = node
                .child_for(segment)
                .ok_or_else(|| AuthxError::MissingRightsNode {
                    scope: scope.to_string(),
                    segment: segment.clone(),
                })?;

            if let Some(context) = node.node_context() {
                trace!(scope = %scope, segment = %segment, "Running context function");
                if enter(context, scope, segment, ctx, &mut locals).await? == ContextFlow::Reject {
                    debug!(scope = %scope, segment = %segment, "Context function rejected scope");
                    return Ok(false);
                }
            }
        }

        let segment = scope.last_segment();
        let right = node.right_predicate().ok_or_else(|| AuthxError::MissingRight {
            scope: scope.to_string(),
            segment: segment.to_string(),
        })?;

        let allowed = right
            .check(segment, ctx, &locals)
            .await
            .map_err(|e| callback_error(scope, e))?;

        debug!(scope = %scope, allowed, "Right predicate evaluated");
        Ok(allowed)
    }

    /// Evaluate every scope concurrently and return the ones that were denied.
    ///
    /// Each evaluation gets its own [`Locals`]. If any evaluation fails, the
    /// first error (in scope order) is returned even when other scopes were
    /// denied.
    pub async fn rejected<'s>(
        &self,
        scopes: &'s [Scope],
        ctx: &RightsContext<'_>,
    ) -> Result<Vec<&'s Scope>> {
        let verdicts = join_all(scopes.iter().map(|scope| self.evaluate(scope, ctx))).await;

        let mut rejected = Vec::new();
        for (scope, verdict) in scopes.iter().zip(verdicts) {
            if !verdict? {
                rejected.push(scope);
            }
        }
        Ok(rejected)
    }

    /// Returns true only if every scope is allowed
    pub async fn evaluate_all(&self, scopes: &[Scope], ctx: &RightsContext<'_>) -> Result<bool> {
        Ok(self.rejected(scopes, ctx).await?.is_empty())
    }
}

async fn enter(
    context: &dyn NodeContext,
    scope: &Scope,
    segment: &str,
    ctx: &RightsContext<'_>,
    locals: &mut Locals,
) -> Result<ContextFlow> {
    context
        .enter(segment, ctx, locals)
        .await
        .map_err(|e| callback_error(scope, e))
}

fn callback_error(scope: &Scope, err: anyhow::Error) -> AuthxError {
    AuthxError::Callback {
        scope: scope.to_string(),
        message: format!("{:#}", err),
    }
}
