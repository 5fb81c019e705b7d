//! Authentication resolver trait

use crate::error::Result;
use crate::types::{IdentityPayload, RequestContext};
use async_trait::async_trait;

/// What a resolver concluded about the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthnOutcome {
    /// Credentials were present and valid
    Identified(IdentityPayload),
    /// No credentials were presented at all
    Anonymous,
    /// Credentials were presented but are invalid (expired, revoked, forged)
    Rejected,
}

/// Determines who is making a request.
///
/// Implementations typically read a session cookie or a bearer token from
/// the request and look it up. Return [`AuthnOutcome::Rejected`] only when
/// credentials exist but are bad; a request with no credentials is
/// [`AuthnOutcome::Anonymous`].
#[async_trait]
pub trait AuthenticationResolver: Send + Sync {
    async fn resolve(&self, request: &RequestContext) -> Result<AuthnOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::types::{Credential, Principal};

    /// Resolves the `x-user` header, rejecting the literal value "revoked"
    struct HeaderResolver;

    #[async_trait]
    impl AuthenticationResolver for HeaderResolver {
        async fn resolve(&self, request: &RequestContext) -> Result<AuthnOutcome> {
            match request.header("x-user") {
                None => Ok(AuthnOutcome::Anonymous),
                Some("revoked") => Ok(AuthnOutcome::Rejected),
                Some("") => Err(CoreError::authentication("empty x-user header")),
                Some(user) => Ok(AuthnOutcome::Identified(IdentityPayload::new(
                    Principal::new(user),
                    Credential::new(user, "header"),
                    vec!["**".to_string()],
                ))),
            }
        }
    }

    #[test]
    fn test_resolver_outcomes() {
        let resolver = HeaderResolver;

        let anonymous = RequestContext::new("GET", "/");
        assert_eq!(
            tokio_test::block_on(resolver.resolve(&anonymous)).unwrap(),
            AuthnOutcome::Anonymous
        );

        let revoked = RequestContext::new("GET", "/").with_header("x-user", "revoked");
        assert_eq!(
            tokio_test::block_on(resolver.resolve(&revoked)).unwrap(),
            AuthnOutcome::Rejected
        );

        let alice = RequestContext::new("GET", "/").with_header("x-user", "alice");
        let outcome = tokio_test::block_on(resolver.resolve(&alice)).unwrap();
        assert!(matches!(outcome, AuthnOutcome::Identified(ref p) if p.principal.id == "alice"));

        let broken = RequestContext::new("GET", "/").with_header("x-user", "");
        assert!(tokio_test::block_on(resolver.resolve(&broken)).is_err());
    }
}
