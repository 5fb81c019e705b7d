//! # Authx Core
//!
//! Shared vocabulary for the authx authentication + authorization pipeline:
//! the request view handed to policy callbacks, the identity attached after
//! authentication, per-operation authentication policy, and the pluggable
//! "who is this caller" resolver.

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use traits::{AuthenticationResolver, AuthnOutcome};
pub use types::{
    AuthnPolicy, Credential, Identity, IdentityPayload, Locals, Principal, RequestContext,
};
