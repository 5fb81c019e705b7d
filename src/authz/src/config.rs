//! TOML policy configuration
//!
//! ```toml
//! anonymous_grants = ["public/**"]
//!
//! [groups.orders]
//! authn = "required"
//!
//! [operations."orders.get"]
//! scopes = ["orders/{id}/read"]
//!
//! [operations."orders.refund"]
//! scopes = ["orders/{id}/refund"]
//! adopt = ["orders.get"]
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use authx_core::AuthnPolicy;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AuthxError, Result};
use crate::metadata::{OperationId, OperationMeta, OperationRegistry, ScopeSpec};
use crate::scope::Scope;

/// Policy configuration for a set of operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthxConfig {
    /// Grants given to callers without credentials
    pub anonymous_grants: Vec<String>,

    /// Group-level defaults keyed by group name
    pub groups: BTreeMap<String, GroupConfig>,

    /// Operations keyed by `group.operation`
    pub operations: BTreeMap<String, OperationConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    pub authn: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationConfig {
    pub authn: Option<String>,
    /// Scopes, optionally with `{param}` placeholders
    pub scopes: Vec<String>,
    /// Operations whose scopes are appended to this one's
    pub adopt: Vec<String>,
}

impl AuthxConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AuthxError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&raw)
    }

    /// Build the operation registry.
    ///
    /// Policy strings, static scopes and adoption references are all
    /// checked here, so a bad configuration fails at start-up.
    pub fn to_registry(&self) -> Result<OperationRegistry> {
        let mut registry = OperationRegistry::new();

        for (group, config) in &self.groups {
            if let Some(policy) = parse_policy(config.authn.as_deref())? {
                registry.set_group_policy(group.clone(), policy);
            }
        }

        let mut pending: BTreeMap<OperationId, (OperationMeta, Vec<OperationId>)> = BTreeMap::new();
        for (id, config) in &self.operations {
            let operation: OperationId = id.parse()?;
            let adopt = config
                .adopt
                .iter()
                .map(|a| a.parse::<OperationId>())
                .collect::<Result<Vec<_>>>()?;
            pending.insert(operation, (build_meta(config)?, adopt));
        }

        // Register adopted operations before the operations adopting them
        let mut registered: BTreeSet<OperationId> = BTreeSet::new();
        while !pending.is_empty() {
            let ready: Vec<OperationId> = pending
                .iter()
                .filter(|(_, (_, adopt))| adopt.iter().all(|a| registered.contains(a)))
                .map(|(id, _)| id.clone())
                .collect();

            if ready.is_empty() {
                return Err(stuck_error(&pending, &registered));
            }

            for id in ready {
                if let Some((meta, adopt)) = pending.remove(&id) {
                    let meta = adopt.into_iter().fold(meta, OperationMeta::adopt_from);
                    registry.register(id.clone(), meta)?;
                    registered.insert(id);
                }
            }
        }

        info!(
            operations = registry.len(),
            groups = self.groups.len(),
            "Loaded authx configuration"
        );
        Ok(registry)
    }
}

fn parse_policy(raw: Option<&str>) -> Result<Option<AuthnPolicy>> {
    raw.map(|p| p.parse::<AuthnPolicy>().map_err(AuthxError::from))
        .transpose()
}

fn build_meta(config: &OperationConfig) -> Result<OperationMeta> {
    let mut meta = OperationMeta::new();
    if let Some(policy) = parse_policy(config.authn.as_deref())? {
        meta = meta.authn(policy);
    }

    for scope in &config.scopes {
        if !scope.contains('{') {
            Scope::new(scope)?;
        }
        meta = meta.scope(ScopeSpec::template(scope.clone()));
    }
    Ok(meta)
}

fn stuck_error(
    pending: &BTreeMap<OperationId, (OperationMeta, Vec<OperationId>)>,
    registered: &BTreeSet<OperationId>,
) -> AuthxError {
    for (id, (_, adopt)) in pending {
        if let Some(missing) = adopt
            .iter()
            .find(|a| !pending.contains_key(*a) && !registered.contains(*a))
        {
            return AuthxError::UnknownOperation(format!("{} (adopted by {})", missing, id));
        }
    }

    let cycle: Vec<String> = pending.keys().map(|id| id.to_string()).collect();
    AuthxError::config(format!("scope adoption cycle between {}", cycle.join(", ")))
}
