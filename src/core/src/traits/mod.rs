//! Shared traits for the authx pipeline

pub mod authn;

// Re-export commonly used traits
pub use authn::{AuthenticationResolver, AuthnOutcome};
