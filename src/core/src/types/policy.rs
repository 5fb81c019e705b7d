//! Per-operation authentication policy

use crate::error::CoreError;
use crate::types::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How strongly an operation requires an authenticated caller.
///
/// The effective value for an operation is resolved most-specific first:
/// operation, then its enclosing group, then [`AuthnPolicy::Required`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthnPolicy {
    /// Only identified callers may proceed
    #[default]
    Required,
    /// Identified and anonymous callers may proceed
    Optional,
    /// Only anonymous callers may proceed (e.g. a login endpoint)
    Disallowed,
    /// Authentication and authorization are not run at all
    Skip,
}

impl AuthnPolicy {
    /// Resolve the effective policy from the operation and group declarations
    pub fn resolve(operation: Option<Self>, group: Option<Self>) -> Self {
        operation.or(group).unwrap_or_default()
    }

    /// Whether an attached identity satisfies this policy
    pub fn admits(&self, identity: &Identity) -> bool {
        match self {
            AuthnPolicy::Required => identity.is_identified(),
            AuthnPolicy::Disallowed => identity.is_anonymous(),
            AuthnPolicy::Optional | AuthnPolicy::Skip => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthnPolicy::Required => "REQUIRED",
            AuthnPolicy::Optional => "OPTIONAL",
            AuthnPolicy::Disallowed => "DISALLOWED",
            AuthnPolicy::Skip => "SKIP",
        }
    }
}

impl FromStr for AuthnPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "required" => Ok(AuthnPolicy::Required),
            "optional" => Ok(AuthnPolicy::Optional),
            "disallowed" => Ok(AuthnPolicy::Disallowed),
            "skip" => Ok(AuthnPolicy::Skip),
            _ => Err(CoreError::UnknownAuthnPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for AuthnPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
