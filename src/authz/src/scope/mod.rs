//! Scope parsing and grant matching
//!
//! Required scopes are concrete slash-separated paths; grants are patterns
//! that may contain glob wildcards. A request passes the grant check only
//! when every required scope is covered by at least one grant.
//!
//! # Examples
//!
//! ```
//! use authx_authz::scope::{Scope, ScopeMatcher};
//!
//! let granted = ScopeMatcher::compile(&["orders/*/read".to_string()]);
//! let required = vec![Scope::new("orders/42/read").unwrap()];
//!
//! assert!(ScopeMatcher::matches_all(&required, &granted));
//! ```

mod matcher;
mod types;


pub use matcher::ScopeMatcher;
pub use types::{escape_segment, GrantPattern, Scope, ScopeError, ScopeResult};
