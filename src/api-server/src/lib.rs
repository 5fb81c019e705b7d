//! axum integration for the authx policy pipeline
//!
//! [`AuthxGuard`] hands out one tower layer per operation. The layer
//! builds a [`RequestContext`](authx_core::RequestContext) from the HTTP
//! request, runs the [`PolicyPipeline`](authx_authz::PolicyPipeline), and
//! either answers 401/403 or forwards the request with the caller's
//! [`Identity`](authx_core::Identity) in its extensions, where
//! [`CurrentIdentity`] picks it up.
//!
//! The rest of the crate is a small orders service wired through the guard.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod layer;
pub mod middleware;
pub mod models;
pub mod request;
pub mod resolver;
pub mod response;
pub mod rights;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerFileConfig;
pub use error::{ApiError, Result};
pub use extract::CurrentIdentity;
pub use layer::{AuthxGuard, AuthxLayer, AuthxService};
pub use resolver::{BearerTokenResolver, TokenConfig};
pub use response::ResponseBodies;
pub use server::Server;
pub use state::AppState;
