//! Test suite for rights-tree traversal

use super::*;
use crate::error::AuthxError;
use crate::scope::Scope;
use authx_core::{Identity, Locals, RequestContext};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn scope(s: &str) -> Scope {
    Scope::new(s).unwrap()
}

fn request() -> RequestContext {
    RequestContext::new("GET", "/orders/42").with_param("id", "42")
}

fn anonymous() -> Identity {
    Identity::anonymous(vec![])
}

/// root -> orders -> * (loads the order) -> read
fn orders_tree(read_allowed: bool) -> RightsTree {
    RightsTree::new(
        RightsNode::new().child(
            "orders",
            RightsNode::new().wildcard(
                RightsNode::new()
                    .context_fn(|segment: &str, _: &RightsContext<'_>, locals: &mut Locals| {
                        if segment == "404" {
                            return Ok(false);
                        }
                        locals.insert("order", &json!({ "id": segment }))?;
                        Ok(true)
                    })
                    .child(
                        "read",
                        RightsNode::new().right_fn(
                            move |_: &str, _: &RightsContext<'_>, locals: &Locals| {
                                Ok(read_allowed && locals.contains("order"))
                            },
                        ),
                    )
                    .child("archive", RightsNode::new()),
            ),
        ),
    )
}

// ============================================================================
// Traversal Scenarios
// ============================================================================

#[tokio::test]
async fn test_wildcard_context_then_right_allows() {
    let evaluator = RightsEvaluator::new(orders_tree(true));
    let (request, identity) = (request(), anonymous());
    let ctx = RightsContext::new(&request, &identity);

    assert!(evaluator.evaluate(&scope("orders/42/read"), &ctx).await.unwrap());
}

#[tokio::test]
async fn test_right_predicate_false_denies() {
    let evaluator = RightsEvaluator::new(orders_tree(false));
    let (request, identity) = (request(), anonymous());
    let ctx = RightsContext::new(&request, &identity);

    assert!(!evaluator.evaluate(&scope("orders/42/read"), &ctx).await.unwrap());
}

#[tokio::test]
async fn test_context_rejection_stops_before_right() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let tree = RightsTree::new(
        RightsNode::new().child(
            "orders",
            RightsNode::new().wildcard(
                RightsNode::new()
                    .context_fn(|_: &str, _: &RightsContext<'_>, _: &mut Locals| Ok(false))
                    .child(
                        "read",
                        RightsNode::new().right_fn(
                            move |_: &str, _: &RightsContext<'_>, _: &Locals| {
                                counter.fetch_add(1, Ordering::SeqCst);
                                Ok(true)
                            },
                        ),
                    ),
            ),
        ),
    );

    let evaluator = RightsEvaluator::new(tree);
    let (request, identity) = (request(), anonymous());
    let ctx = RightsContext::new(&request, &identity);

    assert!(!evaluator.evaluate(&scope("orders/42/read"), &ctx).await.unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_context_unit_result_continues() {
    let tree = RightsTree::new(
        RightsNode::new().child(
            "me",
            RightsNode::new()
                .context_fn(|_: &str, _: &RightsContext<'_>, _: &mut Locals| Ok(()))
                .allow(),
        ),
    );

    let evaluator = RightsEvaluator::new(tree);
    let (request, identity) = (request(), anonymous());
    let ctx = RightsContext::new(&request, &identity);

    assert!(evaluator.evaluate(&scope("me"), &ctx).await.unwrap());
}

#[tokio::test]
async fn test_exact_child_has_priority_over_wildcard() {
    let tree = RightsTree::new(
        RightsNode::new().child(
            "orders",
            RightsNode::new()
                .child("mine", RightsNode::new().allow())
                .wildcard(RightsNode::new().deny()),
        ),
    );

    let evaluator = RightsEvaluator::new(tree);
    let (request, identity) = (request(), anonymous());
    let ctx = RightsContext::new(&request, &identity);

    assert!(evaluator.evaluate(&scope("orders/mine"), &ctx).await.unwrap());
    assert!(!evaluator.evaluate(&scope("orders/theirs"), &ctx).await.unwrap());
}

#[tokio::test]
async fn test_callbacks_see_identity() {
    let tree = RightsTree::new(RightsNode::new().child(
        "me",
        RightsNode::new().right_fn(|_: &str, ctx: &RightsContext<'_>, _: &Locals| {
            Ok(ctx.identity.is_identified())
        }),
    ));

    let evaluator = RightsEvaluator::new(tree);
    let request = request();
    let identity = anonymous();
    let ctx = RightsContext::new(&request, &identity);

    assert!(!evaluator.evaluate(&scope("me"), &ctx).await.unwrap());
}

// ============================================================================
// Root Context
// ============================================================================

#[tokio::test]
async fn test_root_context_receives_marker() {
    let tree = RightsTree::new(
        RightsNode::new()
            .context_fn(|segment: &str, _: &RightsContext<'_>, locals: &mut Locals| {
                locals.insert("root", &segment.to_string())?;
                Ok(())
            })
            .child(
                "me",
                RightsNode::new().right_fn(|_: &str, _: &RightsContext<'_>, locals: &Locals| {
                    Ok(locals.get_as::<String>("root")?.as_deref() == Some(ROOT_SEGMENT))
                }),
            ),
    );

    let evaluator = RightsEvaluator::new(tree);
    let (request, identity) = (request(), anonymous());
    let ctx = RightsContext::new(&request, &identity);

    assert!(evaluator.evaluate(&scope("me"), &ctx).await.unwrap());
}

#[tokio::test]
async fn test_root_context_rejection_denies() {
    let tree = RightsTree::new(
        RightsNode::new()
            .context_fn(|_: &str, ctx: &RightsContext<'_>, _: &mut Locals| {
                Ok(ctx.request.header("x-maintenance").is_none())
            })
            .child("me", RightsNode::new().allow()),
    );

    let evaluator = RightsEvaluator::new(tree);
    let identity = anonymous();

    let normal = request();
    let ctx = RightsContext::new(&normal, &identity);
    assert!(evaluator.evaluate(&scope("me"), &ctx).await.unwrap());

    let maintenance = request().with_header("x-maintenance", "1");
    let ctx = RightsContext::new(&maintenance, &identity);
    assert!(!evaluator.evaluate(&scope("me"), &ctx).await.unwrap());
}

// ============================================================================
// Configuration Errors
// ============================================================================

#[tokio::test]
async fn test_missing_node_is_fatal() {
    let evaluator = RightsEvaluator::new(orders_tree(true));
    let (request, identity) = (request(), anonymous());
    let ctx = RightsContext::new(&request, &identity);

    let err = evaluator
        .evaluate(&scope("orders/42/delete"), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AuthxError::MissingRightsNode { ref segment, .. } if segment == "delete"
    ));
    assert!(err.is_configuration());

    let err = evaluator.evaluate(&scope("invoices/1"), &ctx).await.unwrap_err();
    assert!(matches!(err, AuthxError::MissingRightsNode { .. }));
}

#[tokio::test]
async fn test_missing_right_is_fatal() {
    let evaluator = RightsEvaluator::new(orders_tree(true));
    let (request, identity) = (request(), anonymous());
    let ctx = RightsContext::new(&request, &identity);

    // "archive" exists but carries no right predicate
    let err = evaluator
        .evaluate(&scope("orders/42/archive"), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AuthxError::MissingRight { ref segment, .. } if segment == "archive"
    ));

    // intermediate node used as terminal
    let err = evaluator.evaluate(&scope("orders/42"), &ctx).await.unwrap_err();
    assert!(matches!(err, AuthxError::MissingRight { .. }));
}

#[tokio::test]
async fn test_context_rejection_wins_over_missing_node_further_down() {
    let evaluator = RightsEvaluator::new(orders_tree(true));
    let (request, identity) = (request(), anonymous());
    let ctx = RightsContext::new(&request, &identity);

    assert!(!evaluator
        .evaluate(&scope("orders/404/delete"), &ctx)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_callback_error_is_fatal_not_deny() {
    let tree = RightsTree::new(RightsNode::new().child(
        "orders",
        RightsNode::new()
            .context_fn(|_: &str, _: &RightsContext<'_>, _: &mut Locals| -> anyhow::Result<()> {
                anyhow::bail!("order store unavailable")
            })
            .allow(),
    ));

    let evaluator = RightsEvaluator::new(tree);
    let (request, identity) = (request(), anonymous());
    let ctx = RightsContext::new(&request, &identity);

    let err = evaluator.evaluate(&scope("orders"), &ctx).await.unwrap_err();
    assert!(matches!(
        err,
        AuthxError::Callback { ref message, .. } if message.contains("order store unavailable")
    ));
    assert!(!err.is_configuration());
}

// ============================================================================
// Multiple Scopes
// ============================================================================

#[tokio::test]
async fn test_locals_are_not_shared_between_scopes() {
    let tree = RightsTree::new(
        RightsNode::new()
            .child(
                "a",
                RightsNode::new()
                    .context_fn(|_: &str, _: &RightsContext<'_>, locals: &mut Locals| {
                        locals.insert("marker", &true)?;
                        Ok(())
                    })
                    .allow(),
            )
            .child(
                "b",
                RightsNode::new().right_fn(|_: &str, _: &RightsContext<'_>, locals: &Locals| {
                    Ok(locals.is_empty())
                }),
            ),
    );

    let evaluator = RightsEvaluator::new(tree);
    let (request, identity) = (request(), anonymous());
    let ctx = RightsContext::new(&request, &identity);

    let scopes = vec![scope("a"), scope("b")];
    assert!(evaluator.evaluate_all(&scopes, &ctx).await.unwrap());
}

#[tokio::test]
async fn test_rejected_lists_denied_scopes() {
    let evaluator = RightsEvaluator::new(orders_tree(true));
    let (request, identity) = (request(), anonymous());
    let ctx = RightsContext::new(&request, &identity);

    let scopes = vec![scope("orders/42/read"), scope("orders/404/read")];
    let rejected = evaluator.rejected(&scopes, &ctx).await.unwrap();

    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].as_str(), "orders/404/read");
    assert!(!evaluator.evaluate_all(&scopes, &ctx).await.unwrap());
}

#[tokio::test]
async fn test_error_wins_over_deny() {
    let evaluator = RightsEvaluator::new(orders_tree(true));
    let (request, identity) = (request(), anonymous());
    let ctx = RightsContext::new(&request, &identity);

    let scopes = vec![scope("orders/404/read"), scope("orders/42/archive")];
    let err = evaluator.evaluate_all(&scopes, &ctx).await.unwrap_err();
    assert!(matches!(err, AuthxError::MissingRight { .. }));
}

#[tokio::test]
async fn test_traversal_is_deterministic() {
    let evaluator = RightsEvaluator::new(orders_tree(true));
    let (request, identity) = (request(), anonymous());
    let ctx = RightsContext::new(&request, &identity);
    let target = scope("orders/42/read");

    let first = evaluator.evaluate(&target, &ctx).await.unwrap();
    let second = evaluator.evaluate(&target, &ctx).await.unwrap();
    assert_eq!(first, second);
}
