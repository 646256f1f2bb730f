//! Node Tags
//!
//! [`Tag`] attaches string-keyed metadata to every node a declaration
//! produces. Keys are dotted identifiers (`owner`, `data.source`); the
//! top-level namespace [`RESERVED_TAG_NAMESPACE`] belongs to the library.

use std::collections::BTreeMap;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::graph::{FunctionDef, Node, Tags, Value};

use super::base::NodeDecorator;

/// First key segment reserved for tags set by the library itself.
pub const RESERVED_TAG_NAMESPACE: &str = "dagwright";

static TAG_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("tag key pattern is valid")
});

/// Decorator merging a fixed set of tags into each node.
///
/// # Example
/// ```
/// use dagwright::graph::{DataType, FunctionDef, Node};
/// use dagwright::modifiers::{NodeDecorator, Tag};
///
/// let tag = Tag::new([("owner", "risk-team"), ("data.source", "prices")]);
/// let f = FunctionDef::new("signal", DataType::Int);
/// tag.validate(&f).unwrap();
///
/// let node = tag.decorate_node(Node::from_fn(&f));
/// assert!(node.tags().contains_key("data.source"));
/// ```
#[derive(Debug, Clone)]
pub struct Tag {
    tags: Tags,
}

impl Tag {
    pub fn new<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let tags: BTreeMap<String, Value> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { tags }
    }

    /// True if `key` is a dotted identifier outside the reserved namespace.
    pub fn key_allowed(key: &str) -> bool {
        if !TAG_KEY.is_match(key) {
            return false;
        }
        key.split('.').next() != Some(RESERVED_TAG_NAMESPACE)
    }

    /// True if `value` is a non-empty scalar.
    pub fn value_allowed(value: &Value) -> bool {
        match value {
            Value::Null | Value::Bool(false) => false,
            Value::Str(s) => !s.is_empty(),
            Value::Bool(true) | Value::Int(_) | Value::Float(_) => true,
            Value::List(_) | Value::Map(_) | Value::Series(_) | Value::Table(_) => false,
        }
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }
}

impl NodeDecorator for Tag {
    fn validate(&self, function: &FunctionDef) -> Result<()> {
        // Check keys
        let bad_keys: Vec<&str> = self
            .tags
            .keys()
            .filter(|k| !Self::key_allowed(k))
            .map(String::as_str)
            .collect();
        if !bad_keys.is_empty() {
            return Err(Error::invalid(format!(
                "tag keys {:?} on '{}' must be dotted identifiers outside the '{}' namespace",
                bad_keys,
                function.name(),
                RESERVED_TAG_NAMESPACE
            )));
        }

        // Check values
        let bad_values: Vec<String> = self
            .tags
            .iter()
            .filter(|(_, v)| !Self::value_allowed(v))
            .map(|(k, v)| format!("{}={:?}", k, v))
            .collect();
        if !bad_values.is_empty() {
            return Err(Error::invalid(format!(
                "tag values on '{}' must be non-empty scalars: {}",
                function.name(),
                bad_values.join(", ")
            )));
        }
        Ok(())
    }

    fn decorate_node(&self, node: Node) -> Node {
        debug!("Tagging '{}' with {} tag(s)", node.name(), self.tags.len());
        let mut tags = node.tags().clone();
        tags.extend(self.tags.clone());
        node.with_tags(tags)
    }
}
