//! Rights tree structure
//!
//! The tree is keyed by scope segment. It is built once at start-up and
//! only read afterwards, so it is shared behind an `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use authx_core::Locals;

use super::callback::{
    Constant, ContextFlow, ContextFn, NodeContext, RightFn, RightPredicate, RightsContext,
};

/// A node of the rights tree
///
/// # Examples
///
/// ```
/// use authx_authz::rights::{RightsNode, RightsTree};
///
/// let tree = RightsTree::new(
///     RightsNode::new().child(
///         "orders",
///         RightsNode::new().wildcard(RightsNode::new().child("read", RightsNode::new().allow())),
///     ),
/// );
/// assert!(tree.root().child_for("orders").is_some());
/// ```
#[derive(Default)]
pub struct RightsNode {
    context: Option<Arc<dyn NodeContext>>,
    right: Option<Arc<dyn RightPredicate>>,
    children: HashMap<String, RightsNode>,
    wildcard: Option<Box<RightsNode>>,
}

impl RightsNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the context function run when the walk enters this node
    pub fn context<C: NodeContext + 'static>(mut self, context: C) -> Self {
        self.context = Some(Arc::new(context));
        self
    }

    /// Set a synchronous context function
    pub fn context_fn<F, R>(self, f: F) -> Self
    where
        F: Fn(&str, &RightsContext<'_>, &mut Locals) -> anyhow::Result<R>
            + Send
            + Sync
            + 'static,
        R: Into<ContextFlow> + 'static,
    {
        self.context(ContextFn(f))
    }

    /// Set the terminal right predicate
    pub fn right<P: RightPredicate + 'static>(mut self, right: P) -> Self {
        self.right = Some(Arc::new(right));
        self
    }

    /// Set a synchronous right predicate
    pub fn right_fn<F>(self, f: F) -> Self
    where
        F: Fn(&str, &RightsContext<'_>, &Locals) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        self.right(RightFn(f))
    }

    /// Terminal right that always allows
    pub fn allow(self) -> Self {
        self.right(Constant(true))
    }

    /// Terminal right that always denies
    pub fn deny(self) -> Self {
        self.right(Constant(false))
    }

    /// Add an exact-match child, replacing any child with the same name
    pub fn child(mut self, segment: impl Into<String>, node: RightsNode) -> Self {
        self.children.insert(segment.into(), node);
        self
    }

    /// Set the fallback child used when no exact child matches
    pub fn wildcard(mut self, node: RightsNode) -> Self {
        self.wildcard = Some(Box::new(node));
        self
    }

    /// Resolve the next node: exact child first, then the wildcard
    pub fn child_for(&self, segment: &str) -> Option<&RightsNode> {
        self.children
            .get(segment)
            .or_else(|| self.wildcard.as_deref())
    }

    pub fn node_context(&self) -> Option<&dyn NodeContext> {
        self.context.as_deref()
    }

    pub fn right_predicate(&self) -> Option<&dyn RightPredicate> {
        self.right.as_deref()
    }

    pub fn has_right(&self) -> bool {
        self.right.is_some()
    }
}

impl fmt::Debug for RightsNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut children: Vec<&String> = self.children.keys().collect();
        children.sort();

        f.debug_struct("RightsNode")
            .field("context", &self.context.is_some())
            .field("right", &self.right.is_some())
            .field("children", &children)
            .field("wildcard", &self.wildcard)
            .finish()
    }
}

/// Immutable, cheaply clonable handle to a rights tree
#[derive(Debug, Clone)]
pub struct RightsTree {
    root: Arc<RightsNode>,
}

impl RightsTree {
    pub fn new(root: RightsNode) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    pub fn root(&self) -> &RightsNode {
        &self.root
    }
}

impl From<RightsNode> for RightsTree {
    fn from(root: RightsNode) -> Self {
        Self::new(root)
    }
}
