//! Error types shared by the authx crates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type
#[derive(Debug, Error)]
pub enum CoreError {
    /// The authentication resolver could not produce an outcome
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// A policy string that does not name a known authentication policy
    #[error("Unknown authentication policy: {0}")]
    UnknownAuthnPolicy(String),

    /// Serialization/Deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input/state
    #[error("Invalid: {0}")]
    Invalid(String),
}

impl CoreError {
    /// Create an authentication error
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        CoreError::Authentication(msg.into())
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        CoreError::Serialization(msg.into())
    }

    /// Create an invalid error
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        CoreError::Invalid(msg.into())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}
