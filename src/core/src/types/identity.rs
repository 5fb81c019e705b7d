//! Identity types attached to a request after authentication

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Principal (user, service account, agent) behind an identified request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Principal identifier (e.g., "user:alice@example.com")
    pub id: String,

    /// Additional attributes (e.g., department, tier)
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Principal {
    /// Create a new principal from an ID string
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: HashMap::new(),
        }
    }

    /// Add an attribute to the principal
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Look up an attribute
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Reference to the credential the principal presented (session, token, key)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Credential identifier, never the secret itself
    pub id: String,

    /// Credential kind (e.g., "session", "bearer")
    pub kind: String,
}

impl Credential {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
        }
    }
}

/// What an authentication resolver hands back for a valid login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPayload {
    pub principal: Principal,
    pub credential: Credential,
    /// Scope patterns granted to this login
    #[serde(default)]
    pub grants: Vec<String>,
}

impl IdentityPayload {
    pub fn new(principal: Principal, credential: Credential, grants: Vec<String>) -> Self {
        Self {
            principal,
            credential,
            grants,
        }
    }
}

/// Identity attached to a request once authentication has run.
///
/// Exactly one variant is ever attached. A rejected login never produces an
/// `Identity` at all; see [`crate::AuthnOutcome::Rejected`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identity {
    /// A caller whose credentials resolved to a principal
    Identified {
        principal: Principal,
        credential: Credential,
        grants: Vec<String>,
    },
    /// A caller without credentials, holding the application's logged-out grants
    Anonymous { grants: Vec<String> },
}

impl Identity {
    /// Build an identified identity from a resolver payload
    pub fn identified(payload: IdentityPayload) -> Self {
        Identity::Identified {
            principal: payload.principal,
            credential: payload.credential,
            grants: payload.grants,
        }
    }

    /// Build an anonymous identity carrying the given grants
    pub fn anonymous(grants: Vec<String>) -> Self {
        Identity::Anonymous { grants }
    }

    /// Scope patterns granted to this identity
    pub fn grants(&self) -> &[String] {
        match self {
            Identity::Identified { grants, .. } | Identity::Anonymous { grants } => grants,
        }
    }

    pub fn is_identified(&self) -> bool {
        matches!(self, Identity::Identified { .. })
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous { .. })
    }

    /// The principal, when identified
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Identity::Identified { principal, .. } => Some(principal),
            Identity::Anonymous { .. } => None,
        }
    }

    /// The credential reference, when identified
    pub fn credential(&self) -> Option<&Credential> {
        match self {
            Identity::Identified { credential, .. } => Some(credential),
            Identity::Anonymous { .. } => None,
        }
    }
}

impl From<IdentityPayload> for Identity {
    fn from(payload: IdentityPayload) -> Self {
        Identity::identified(payload)
    }
}
