//! Rights tree for the demo orders service
//!
//! ```text
//! [ROOT]
//! ├── orders
//! │   └── *            loads the order into locals, rejects unknown ids
//! │       ├── read     owner or support
//! │       └── refund   support, order not yet refunded
//! ├── me
//! │   └── read         anyone
//! └── session
//!     └── create       anyone
//! ```

use async_trait::async_trait;
use authx_authz::{ContextFlow, NodeContext, RightsContext, RightsNode};
use authx_core::Locals;
use tracing::debug;

use crate::state::{Order, OrderStore};

/// Locals key holding the [`Order`] named by the scope
pub const ORDER_LOCAL: &str = "order";

/// Principal attribute carrying the caller's role
pub const ROLE_ATTRIBUTE: &str = "role";

pub const SUPPORT_ROLE: &str = "support";

/// Context function for `orders/<id>`
pub struct OrderContext {
    store: OrderStore,
}

impl OrderContext {
    pub fn new(store: OrderStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl NodeContext for OrderContext {
    async fn enter(
        &self,
        segment: &str,
        _ctx: &RightsContext<'_>,
        locals: &mut Locals,
    ) -> anyhow::Result<ContextFlow> {
        match self.store.get(segment).await {
            Some(order) => {
                locals.insert(ORDER_LOCAL, &order)?;
                Ok(ContextFlow::Continue)
            }
            None => {
                debug!(order = segment, "Unknown order");
                Ok(ContextFlow::Reject)
            }
        }
    }
}

fn is_support(ctx: &RightsContext<'_>) -> bool {
    ctx.identity
        .principal()
        .and_then(|p| p.attribute(ROLE_ATTRIBUTE))
        == Some(SUPPORT_ROLE)
}

fn order(locals: &Locals) -> anyhow::Result<Order> {
    locals
        .get_as::<Order>(ORDER_LOCAL)?
        .ok_or_else(|| anyhow::anyhow!("order context did not run"))
}

/// Build the tree backed by `store`
pub fn orders_tree(store: OrderStore) -> RightsNode {
    let order_node = RightsNode::new()
        .context(OrderContext::new(store))
        .child(
            "read",
            RightsNode::new().right_fn(|_, ctx, locals| {
                let order = order(locals)?;
                let owner = ctx.identity.principal().map(|p| p.id.as_str());
                Ok(owner == Some(order.owner.as_str()) || is_support(ctx))
            }),
        )
        .child(
            "refund",
            RightsNode::new()
                .right_fn(|_, ctx, locals| Ok(is_support(ctx) && !order(locals)?.refunded)),
        );

    RightsNode::new()
        .child("orders", RightsNode::new().wildcard(order_node))
        .child("me", RightsNode::new().child("read", RightsNode::new().allow()))
        .child(
            "session",
            RightsNode::new().child("create", RightsNode::new().allow()),
        )
}
