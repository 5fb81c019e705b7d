//! Grant check: every required scope must be covered by some grant

use tracing::warn;

use super::types::{GrantPattern, Scope};

/// Stateless matcher over compiled grant patterns
pub struct ScopeMatcher;

impl ScopeMatcher {
    /// Compiles an identity's grant strings. Malformed grants are skipped.
    pub fn compile(grants: &[String]) -> Vec<GrantPattern> {
        grants
            .iter()
            .filter_map(|grant| match GrantPattern::new(grant) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!(grant = %grant, error = %e, "Ignoring malformed grant");
                    None
                }
            })
            .collect()
    }

    /// Returns true when every required scope matches at least one grant.
    ///
    /// The list of required scopes is always a conjunction. An empty
    /// required list is vacuously covered.
    pub fn matches_all(required: &[Scope], granted: &[GrantPattern]) -> bool {
        required
            .iter()
            .all(|scope| granted.iter().any(|pattern| pattern.matches(scope)))
    }

    /// Returns the required scopes no grant covers, in order
    pub fn unmatched<'a>(required: &'a [Scope], granted: &[GrantPattern]) -> Vec<&'a Scope> {
        required
            .iter()
            .filter(|scope| !granted.iter().any(|pattern| pattern.matches(scope)))
            .collect()
    }
}
