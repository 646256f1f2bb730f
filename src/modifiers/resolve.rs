//! Configuration-Driven Variants
//!
//! [`ConfigWhen`] decides whether a function variant exists for a given
//! configuration. Variants share a logical name and differ by a suffix after
//! the `__` marker; the resolved function is renamed to the logical name (or
//! to an explicit override).
//!
//! # Example
//!
//! ```
//! use dagwright::graph::{Config, DataType, FunctionDef};
//! use dagwright::modifiers::{ConfigWhen, NodeResolver};
//!
//! let variant = FunctionDef::new("signal__fast", DataType::Int);
//! let when = ConfigWhen::when("mode", "fast");
//!
//! let resolved = when.resolve(&variant, &Config::new().with("mode", "fast")).unwrap();
//! assert_eq!(resolved.name(), "signal");
//! assert!(when.resolve(&variant, &Config::new().with("mode", "slow")).is_none());
//! ```

use log::debug;

use crate::error::{Error, Result};
use crate::graph::{Config, FunctionDef, Value};

use super::base::{sanitize_function_name, NodeResolver, VARIANT_MARKER};

/// A predicate on one configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(Value),
    NotEquals(Value),
    OneOf(Vec<Value>),
    NotOneOf(Vec<Value>),
}

impl Condition {
    pub fn holds(&self, value: &Value) -> bool {
        match self {
            Self::Equals(expected) => value == expected,
            Self::NotEquals(rejected) => value != rejected,
            Self::OneOf(allowed) => allowed.contains(value),
            Self::NotOneOf(rejected) => !rejected.contains(value),
        }
    }
}

/// Includes a function only when every keyed condition holds.
///
/// A key absent from the configuration never matches, whatever the
/// condition.
#[derive(Debug, Clone, Default)]
pub struct ConfigWhen {
    conditions: Vec<(String, Condition)>,
    name: Option<String>,
}

impl ConfigWhen {
    /// Matches when `config[key] == value`.
    pub fn when(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::default().and(key, Condition::Equals(value.into()))
    }

    /// Matches when `config[key] != value`.
    pub fn when_not(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::default().and(key, Condition::NotEquals(value.into()))
    }

    /// Matches when `config[key]` is one of `values`.
    pub fn when_in<V: Into<Value>>(
        key: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        Self::default().and(key, Condition::OneOf(values))
    }

    /// Matches when `config[key]` is none of `values`.
    pub fn when_not_in<V: Into<Value>>(
        key: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        Self::default().and(key, Condition::NotOneOf(values))
    }

    /// Adds another condition; all of them must hold.
    pub fn and(mut self, key: impl Into<String>, condition: Condition) -> Self {
        self.conditions.push((key.into(), condition));
        self
    }

    /// Overrides the name the resolved function receives.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn conditions(&self) -> &[(String, Condition)] {
        &self.conditions
    }

    pub fn matches(&self, config: &Config) -> bool {
        self.conditions.iter().all(|(key, condition)| {
            config
                .get(key)
                .map(|value| condition.holds(value))
                .unwrap_or(false)
        })
    }
}

impl NodeResolver for ConfigWhen {
    fn validate(&self, function: &FunctionDef) -> Result<()> {
        let name = function.name();
        if name.ends_with(VARIANT_MARKER) {
            return Err(Error::invalid(format!(
                "'{}' ends with '{}'; a variant suffix must follow the marker",
                name, VARIANT_MARKER
            )));
        }
        if sanitize_function_name(name).is_empty() {
            return Err(Error::invalid(format!(
                "'{}' has no logical name before the '{}' marker",
                name, VARIANT_MARKER
            )));
        }
        Ok(())
    }

    fn resolve(&self, function: &FunctionDef, config: &Config) -> Option<FunctionDef> {
        if !self.matches(config) {
            debug!("Variant '{}' does not match the configuration", function.name());
            return None;
        }
        Some(function.renamed(self.logical_name(function)))
    }

    fn logical_name(&self, function: &FunctionDef) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => sanitize_function_name(function.name()).to_string(),
        }
    }
}
