//! Error types for scope evaluation and the policy pipeline

use authx_core::CoreError;
use thiserror::Error;

use crate::scope::ScopeError;

/// Fatal pipeline errors
///
/// Denials are not errors; they are reported through
/// [`Decision`](crate::engine::Decision) and
/// [`PipelineOutcome`](crate::pipeline::PipelineOutcome). Everything here
/// aborts the request.
#[derive(Debug, Error)]
pub enum AuthxError {
    /// The operation runs through authorization but declares no scopes
    #[error("Operation '{0}' is in the authorization pipeline but declares no scopes")]
    MissingScopeDeclaration(String),

    /// The operation id is not registered with the metadata store
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// The rights tree has neither an exact child nor a wildcard for a segment
    #[error("Could not find scope part '{segment}' of '{scope}' in the rights tree, and no wildcard exists")]
    MissingRightsNode { scope: String, segment: String },

    /// A scope ends on a node that has no right predicate
    #[error("Scope '{scope}' is using node '{segment}' as a terminal node, but it has no right predicate")]
    MissingRight { scope: String, segment: String },

    /// A scope or grant string failed to parse
    #[error("Invalid scope: {0}")]
    InvalidScope(#[from] ScopeError),

    /// A policy string that names no known authentication policy
    #[error("Unknown authentication policy: {0}")]
    UnknownAuthnPolicy(String),

    /// An operation adopts scopes from an operation that declares none
    #[error("Operation '{operation}' adopts scopes from '{adopted}', which declares none")]
    AdoptedScopesMissing { operation: String, adopted: String },

    /// The authentication resolver failed
    #[error("Authentication resolver failed: {0}")]
    Resolver(String),

    /// A context function or right predicate failed
    #[error("Rights callback failed for scope '{scope}': {message}")]
    Callback { scope: String, message: String },

    /// Configuration loading error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthxError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        AuthxError::Config(msg.into())
    }

    /// Whether the policy configuration is inconsistent with the declared
    /// operations, as opposed to a runtime collaborator failure.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AuthxError::MissingScopeDeclaration(_)
                | AuthxError::UnknownOperation(_)
                | AuthxError::MissingRightsNode { .. }
                | AuthxError::MissingRight { .. }
                | AuthxError::InvalidScope(_)
                | AuthxError::UnknownAuthnPolicy(_)
                | AuthxError::AdoptedScopesMissing { .. }
                | AuthxError::Config(_)
        )
    }
}

impl From<CoreError> for AuthxError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownAuthnPolicy(policy) => AuthxError::UnknownAuthnPolicy(policy),
            CoreError::Authentication(msg) => AuthxError::Resolver(msg),
            other => AuthxError::Config(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for AuthxError {
    fn from(err: toml::de::Error) -> Self {
        AuthxError::Config(err.to_string())
    }
}

impl From<std::io::Error> for AuthxError {
    fn from(err: std::io::Error) -> Self {
        AuthxError::Config(err.to_string())
    }
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthxError>;
