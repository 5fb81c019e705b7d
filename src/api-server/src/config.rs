//! Server configuration file: authx policy, token table and seed orders

use std::collections::BTreeMap;
use std::path::Path;

use authx_authz::{AuthxConfig, AuthxError, Result};
use serde::{Deserialize, Serialize};

use crate::resolver::TokenConfig;
use crate::state::OrderSeed;

/// Configuration used when no file is given on the command line
pub const DEMO_CONFIG: &str = include_str!("../config/authx.toml");

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFileConfig {
    #[serde(flatten)]
    pub authx: AuthxConfig,

    /// Bearer/session tokens keyed by token value
    #[serde(default)]
    pub tokens: BTreeMap<String, TokenConfig>,

    /// Orders loaded into the in-memory store at start-up
    #[serde(default)]
    pub orders: BTreeMap<String, OrderSeed>,
}

impl ServerFileConfig {
    pub fn demo() -> Result<Self> {
        Self::from_toml_str(DEMO_CONFIG)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AuthxError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&raw)
    }
}
