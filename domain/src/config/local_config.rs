//! Agent-owned configuration store.
//!
//! [`LocalConfig`] holds both operator options (delivered by config-changed
//! events) and values the agent promoted from relation facts. It is the only
//! mutable configuration state and is persisted between passes.

use crate::core::error::ConvergeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalConfig {
    values: BTreeMap<String, Value>,
}

impl LocalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !v.is_null())
    }

    /// String value of a key. Non-string scalars are not coerced.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => crate::relation::fact::parse_flag(s),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set a key. Returns `true` if the stored value changed.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> bool {
        let key = key.into();
        if self.values.get(&key) == Some(&value) {
            return false;
        }
        self.values.insert(key, value);
        true
    }

    /// Delete a key. Returns `true` if it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// Delete several keys, returning the ones that were present.
    pub fn clear_keys(&mut self, keys: &[&str]) -> Vec<String> {
        keys.iter()
            .filter(|key| self.remove(key))
            .map(|key| key.to_string())
            .collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Apply operator options from a config-changed notification.
    ///
    /// A `null` option resets it to its default (the key is deleted). Options
    /// listed in `immutable` may be set once; any later change is rejected
    /// and nothing is applied.
    ///
    /// Returns the names of the options whose value changed.
    pub fn apply_options(
        &mut self,
        options: &BTreeMap<String, Value>,
        immutable: &[&str],
    ) -> Result<Vec<String>, ConvergeError> {
        for (key, value) in options {
            if !immutable.contains(&key.as_str()) {
                continue;
            }
            if let Some(current) = self.get(key)
                && current != value
            {
                return Err(ConvergeError::ImmutableConfigViolation {
                    option: key.clone(),
                });
            }
        }

        let mut changed = Vec::new();
        for (key, value) in options {
            let did_change = if value.is_null() {
                self.remove(key)
            } else {
                self.set(key.clone(), value.clone())
            };
            if did_change {
                changed.push(key.clone());
            }
        }
        Ok(changed)
    }
}
