//! Shared types for the authx pipeline

pub mod identity;
pub mod locals;
pub mod policy;
pub mod request;

// Re-export commonly used types
pub use identity::{Credential, Identity, IdentityPayload, Principal};
pub use locals::Locals;
pub use policy::AuthnPolicy;
pub use request::RequestContext;
