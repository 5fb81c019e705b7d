//! Bearer-token / session-cookie authentication over a static token table

use std::collections::HashMap;

use async_trait::async_trait;
use authx_core::{
    AuthenticationResolver, AuthnOutcome, Credential, IdentityPayload, Principal,
    RequestContext, Result,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cookie carrying a token when no `Authorization` header is sent
pub const SESSION_COOKIE: &str = "session";

/// One entry of the token table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Principal id, e.g. `user:alice`
    pub principal: String,
    #[serde(default)]
    pub grants: Vec<String>,
    /// Principal attributes readable by rights callbacks
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    /// Revoked tokens are rejected rather than treated as unknown
    #[serde(default)]
    pub revoked: bool,
}

/// Resolves `Authorization: Bearer <token>` or the `session` cookie.
///
/// No credential at all is anonymous; an unknown, revoked or malformed
/// credential is rejected.
#[derive(Debug, Clone, Default)]
pub struct BearerTokenResolver {
    tokens: HashMap<String, TokenConfig>,
}

impl BearerTokenResolver {
    pub fn new(tokens: impl IntoIterator<Item = (String, TokenConfig)>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    /// A known, non-revoked token entry
    pub fn active(&self, token: &str) -> Option<&TokenConfig> {
        self.tokens.get(token).filter(|entry| !entry.revoked)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

enum Presented<'a> {
    None,
    Token(&'a str, &'static str),
    Malformed,
}

fn presented(request: &RequestContext) -> Presented<'_> {
    if let Some(header) = request.header("authorization") {
        return match header.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
                Presented::Token(token.trim(), "bearer")
            }
            _ => Presented::Malformed,
        };
    }

    match request.cookie(SESSION_COOKIE) {
        Some(token) if !token.is_empty() => Presented::Token(token, "session"),
        Some(_) => Presented::Malformed,
        None => Presented::None,
    }
}

/// Credential reference safe to log: the first four characters only
fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(4).collect();
    format!("{prefix}...")
}

#[async_trait]
impl AuthenticationResolver for BearerTokenResolver {
    async fn resolve(&self, request: &RequestContext) -> Result<AuthnOutcome> {
        let (token, kind) = match presented(request) {
            Presented::None => return Ok(AuthnOutcome::Anonymous),
            Presented::Malformed => {
                debug!("Malformed credentials");
                return Ok(AuthnOutcome::Rejected);
            }
            Presented::Token(token, kind) => (token, kind),
        };

        let Some(entry) = self.tokens.get(token) else {
            debug!(kind, "Unknown token");
            return Ok(AuthnOutcome::Rejected);
        };

        if entry.revoked {
            debug!(kind, principal = %entry.principal, "Revoked token");
            return Ok(AuthnOutcome::Rejected);
        }

        let principal = entry
            .attributes
            .iter()
            .fold(Principal::new(entry.principal.clone()), |p, (k, v)| {
                p.with_attribute(k.clone(), v.clone())
            });

        Ok(AuthnOutcome::Identified(IdentityPayload::new(
            principal,
            Credential::new(redact(token), kind),
            entry.grants.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> BearerTokenResolver {
        BearerTokenResolver::new([
            (
                "tok-alice".to_string(),
                TokenConfig {
                    principal: "user:alice".into(),
                    grants: vec!["orders/*/read".into()],
                    ..TokenConfig::default()
                },
            ),
            (
                "tok-old".to_string(),
                TokenConfig {
                    principal: "user:old".into(),
                    revoked: true,
                    ..TokenConfig::default()
                },
            ),
        ])
    }

    async fn resolve(request: RequestContext) -> AuthnOutcome {
        resolver().resolve(&request).await.unwrap()
    }

    #[tokio::test]
    async fn test_anonymous_without_credentials() {
        assert_eq!(resolve(RequestContext::new("GET", "/")).await, AuthnOutcome::Anonymous);
    }

    #[tokio::test]
    async fn test_bearer_token() {
        let outcome = resolve(
            RequestContext::new("GET", "/").with_header("Authorization", "Bearer tok-alice"),
        )
        .await;

        match outcome {
            AuthnOutcome::Identified(payload) => {
                assert_eq!(payload.principal.id, "user:alice");
                assert_eq!(payload.credential.kind, "bearer");
                assert_eq!(payload.credential.id, "tok-...");
                assert_eq!(payload.grants, vec!["orders/*/read"]);
            }
            other => panic!("expected identified, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_session_cookie() {
        let outcome =
            resolve(RequestContext::new("GET", "/").with_cookie(SESSION_COOKIE, "tok-alice")).await;
        assert!(matches!(outcome, AuthnOutcome::Identified(ref p) if p.credential.kind == "session"));
    }

    #[tokio::test]
    async fn test_rejections() {
        for request in [
            RequestContext::new("GET", "/").with_header("Authorization", "Bearer tok-unknown"),
            RequestContext::new("GET", "/").with_header("Authorization", "Bearer tok-old"),
            RequestContext::new("GET", "/").with_header("Authorization", "Basic abc"),
            RequestContext::new("GET", "/").with_header("Authorization", "Bearer "),
            RequestContext::new("GET", "/").with_cookie(SESSION_COOKIE, ""),
        ] {
            assert_eq!(resolve(request).await, AuthnOutcome::Rejected);
        }
    }

    #[test]
    fn test_active_skips_revoked() {
        let resolver = resolver();
        assert!(resolver.active("tok-alice").is_some());
        assert!(resolver.active("tok-old").is_none());
        assert!(resolver.active("tok-unknown").is_none());
    }
}
