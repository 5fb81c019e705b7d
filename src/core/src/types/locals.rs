//! Per-evaluation side channel between rights-tree callbacks

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Values recorded by context functions during one rights-tree walk and
/// read by the terminal right predicate.
///
/// A fresh `Locals` is created for every scope evaluation; nothing written
/// here survives into the evaluation of a sibling scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Locals {
    values: HashMap<String, Value>,
}

impl Locals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a serializable value under `key`, replacing any previous value
    pub fn insert<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.values.insert(key.into(), value);
        Ok(())
    }

    /// Store a raw JSON value under `key`
    pub fn insert_value(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Deserialize the value under `key`, if present
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.values.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
