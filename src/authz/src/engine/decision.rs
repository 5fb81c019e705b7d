//! Authorization decision types

use serde::Serialize;
use std::fmt;

/// Outcome of the authorization phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny { reason: DenyReason },
}

impl Decision {
    pub fn grant_mismatch(unmatched: Vec<String>) -> Self {
        Decision::Deny {
            reason: DenyReason::GrantMismatch { unmatched },
        }
    }

    pub fn rights_mismatch(rejected: Vec<String>) -> Self {
        Decision::Deny {
            reason: DenyReason::RightsMismatch { rejected },
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn reason(&self) -> Option<&DenyReason> {
        match self {
            Decision::Allow => None,
            Decision::Deny { reason } => Some(reason),
        }
    }
}

/// Which check produced a deny. Diagnostic only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenyReason {
    /// Required scopes not covered by any grant
    GrantMismatch { unmatched: Vec<String> },
    /// Scopes denied by the rights tree
    RightsMismatch { rejected: Vec<String> },
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::GrantMismatch { .. } => "grant-mismatch",
            DenyReason::RightsMismatch { .. } => "rights-mismatch",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::GrantMismatch { unmatched } => {
                write!(f, "grant-mismatch ({})", unmatched.join(", "))
            }
            DenyReason::RightsMismatch { rejected } => {
                write!(f, "rights-mismatch ({})", rejected.join(", "))
            }
        }
    }
}
