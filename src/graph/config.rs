//! Assembly Configuration
//!
//! A flat, read-only key/value snapshot consulted by configuration resolvers
//! and by model wrapping. Configurations are usually built in code, but can
//! also be loaded from YAML (or JSON, which YAML parses as well).
//!
//! # Example YAML Format
//!
//! ```yaml
//! region: us
//! mode: backfill
//! my_column_model_params:
//!   col_1: 0.5
//!   col_2: 0.5
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::error::{Error, Result};

use super::value::Value;

/// Configuration snapshot used during assembly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    values: BTreeMap<String, Value>,
}

impl Config {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parses a YAML document whose top level is a mapping.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::new());
        }

        let raw: BTreeMap<String, serde_json::Value> = serde_yaml::from_str(yaml)?;
        let values: BTreeMap<String, Value> =
            raw.into_iter().map(|(k, v)| (k, Value::from(v))).collect();

        debug!("Parsed configuration with {} keys", values.len());
        Ok(Self { values })
    }

    /// Loads configuration from a YAML or JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Builds a configuration from a JSON object.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        match Value::from(value) {
            Value::Map(values) => Ok(Self { values }),
            other => Err(Error::invalid(format!(
                "configuration must be a mapping, got {}",
                other.type_name()
            ))),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Config {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
