//! Rights tree: contextual re-validation of granted scopes
//!
//! After the grant check passes, each required scope is walked segment by
//! segment through an application-defined tree. Nodes may run a context
//! function (usually a resource lookup) and the node a scope ends on must
//! carry a right predicate that gives the final verdict.

mod callback;
mod evaluator;
mod tree;

#[cfg(test)]
mod tests;

pub use callback::{
    Constant, ContextFlow, ContextFn, NodeContext, RightFn, RightPredicate, RightsContext,
};
pub use evaluator::{RightsEvaluator, ROOT_SEGMENT};
pub use tree::{RightsNode, RightsTree};
