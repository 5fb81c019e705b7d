//! Context functions and right predicates attached to rights-tree nodes

use async_trait::async_trait;
use authx_core::{Identity, Locals, RequestContext};

/// Read-only view handed to every rights callback
#[derive(Debug, Clone, Copy)]
pub struct RightsContext<'a> {
    pub request: &'a RequestContext,
    /// Identity attached during authentication
    pub identity: &'a Identity,
}

impl<'a> RightsContext<'a> {
    pub fn new(request: &'a RequestContext, identity: &'a Identity) -> Self {
        Self { request, identity }
    }
}

/// Result of a context function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextFlow {
    /// Keep walking the tree
    Continue,
    /// Stop evaluating this scope; it is denied
    Reject,
}

impl From<bool> for ContextFlow {
    fn from(proceed: bool) -> Self {
        if proceed {
            ContextFlow::Continue
        } else {
            ContextFlow::Reject
        }
    }
}

impl From<()> for ContextFlow {
    fn from(_: ()) -> Self {
        ContextFlow::Continue
    }
}

/// Side-effecting check run when the walk enters a node.
///
/// Typically resolves the resource named by `segment` and records it in
/// `locals` for the terminal predicate. Returning [`ContextFlow::Reject`]
/// denies the scope; returning an error aborts the whole request.
#[async_trait]
pub trait NodeContext: Send + Sync {
    async fn enter(
        &self,
        segment: &str,
        ctx: &RightsContext<'_>,
        locals: &mut Locals,
    ) -> anyhow::Result<ContextFlow>;
}

/// Terminal eligibility check for a scope
#[async_trait]
pub trait RightPredicate: Send + Sync {
    async fn check(
        &self,
        segment: &str,
        ctx: &RightsContext<'_>,
        locals: &Locals,
    ) -> anyhow::Result<bool>;
}

/// Adapts a synchronous closure into a [`NodeContext`]
pub struct ContextFn<F>(pub F);

#[async_trait]
impl<F, R> NodeContext for ContextFn<F>
where
    F: Fn(&str, &RightsContext<'_>, &mut Locals) -> anyhow::Result<R> + Send + Sync,
    R: Into<ContextFlow>,
{
    async fn enter(
        &self,
        segment: &str,
        ctx: &RightsContext<'_>,
        locals: &mut Locals,
    ) -> anyhow::Result<ContextFlow> {
        (self.0)(segment, ctx, locals).map(Into::into)
    }
}

/// Adapts a synchronous closure into a [`RightPredicate`]
pub struct RightFn<F>(pub F);

#[async_trait]
impl<F> RightPredicate for RightFn<F>
where
    F: Fn(&str, &RightsContext<'_>, &Locals) -> anyhow::Result<bool> + Send + Sync,
{
    async fn check(
        &self,
        segment: &str,
        ctx: &RightsContext<'_>,
        locals: &Locals,
    ) -> anyhow::Result<bool> {
        (self.0)(segment, ctx, locals)
    }
}

/// A right predicate with a fixed answer
#[derive(Debug, Clone, Copy)]
pub struct Constant(pub bool);

#[async_trait]
impl RightPredicate for Constant {
    async fn check(&self, _: &str, _: &RightsContext<'_>, _: &Locals) -> anyhow::Result<bool> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_flow_conversions() {
        assert_eq!(ContextFlow::from(true), ContextFlow::Continue);
        assert_eq!(ContextFlow::from(false), ContextFlow::Reject);
        assert_eq!(ContextFlow::from(()), ContextFlow::Continue);
    }

    #[tokio::test]
    async fn test_closure_adapters() {
        let request = RequestContext::new("GET", "/orders/42");
        let identity = Identity::anonymous(vec![]);
        let ctx = RightsContext::new(&request, &identity);
        let mut locals = Locals::new();

        let context = ContextFn(
            |segment: &str, _: &RightsContext<'_>, locals: &mut Locals| -> anyhow::Result<()> {
                locals.insert("seen", &segment.to_string())?;
                Ok(())
            },
        );
        assert_eq!(
            context.enter("42", &ctx, &mut locals).await.unwrap(),
            ContextFlow::Continue
        );

        let right = RightFn(
            |_: &str, _: &RightsContext<'_>, locals: &Locals| -> anyhow::Result<bool> {
                Ok(locals.get_as::<String>("seen")?.as_deref() == Some("42"))
            },
        );
        assert!(right.check("read", &ctx, &locals).await.unwrap());
        assert!(!Constant(false).check("read", &ctx, &locals).await.unwrap());
    }
}
