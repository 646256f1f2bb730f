//! Graph Nodes
//!
//! The [`Node`] is the record every modifier produces and the only thing
//! handed to the execution engine.
//!
//! # Example
//!
//! ```
//! use dagwright::graph::{DataType, FunctionDef, Kwargs, Node, Value};
//!
//! let double = FunctionDef::new("doubled", DataType::Int)
//!     .doc("Twice the input.")
//!     .param("base", DataType::Int)
//!     .implemented_by(|kwargs| Ok(Value::Int(kwargs["base"].as_f64().unwrap_or(0.0) as i64 * 2)));
//!
//! let node = Node::from_fn(&double);
//! assert_eq!(node.name(), "doubled");
//! assert_eq!(node.dependencies(), vec!["base"]);
//!
//! let mut kwargs = Kwargs::new();
//! kwargs.insert("base".to_string(), Value::Int(4));
//! assert_eq!(node.invoke(&kwargs).unwrap(), Value::Int(8));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

use super::signature::FunctionDef;
use super::types::{DataType, DependencyType};
use super::value::{Kwargs, Value};

/// Tag recording the module a node's function was declared in.
pub const MODULE_TAG: &str = "module";

/// Dependency name -> declared type and requiredness.
pub type InputTypes = BTreeMap<String, (DataType, DependencyType)>;

/// Tag key -> scalar value.
pub type Tags = BTreeMap<String, Value>;

/// The callable stored on a node.
pub type Callable = Arc<dyn Fn(&Kwargs) -> Result<NodeOutput> + Send + Sync>;

/// What a node callable returns.
///
/// Besides its own value, a callable may hand back updated copies of
/// upstream results (keyed by dependency name). Extractors with a fill value
/// use this to backfill a synthesized column or field; the engine decides
/// whether to replace its stored upstream result with the copy.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeOutput {
    pub value: Value,
    pub updated_inputs: Kwargs,
}

impl NodeOutput {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            updated_inputs: Kwargs::new(),
        }
    }

    /// Records an updated copy of the upstream result `name`.
    pub fn with_updated_input(mut self, name: impl Into<String>, value: Value) -> Self {
        self.updated_inputs.insert(name.into(), value);
        self
    }
}

impl From<Value> for NodeOutput {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// A vertex of the dataflow graph.
///
/// Nodes are immutable once built; the `with_*` methods consume the node and
/// return a modified copy.
#[derive(Clone)]
pub struct Node {
    name: String,
    node_type: DataType,
    documentation: String,
    callable: Callable,
    input_types: InputTypes,
    tags: Tags,
}

impl Node {
    /// Creates a node with no dependencies and no tags.
    pub fn new(
        name: impl Into<String>,
        node_type: DataType,
        documentation: impl Into<String>,
        callable: Callable,
    ) -> Self {
        Self {
            name: name.into(),
            node_type,
            documentation: documentation.into(),
            callable,
            input_types: InputTypes::new(),
            tags: Tags::new(),
        }
    }

    /// Builds the default node for a function: same name, return type and
    /// docstring, one dependency per wired parameter, and a `module` tag when
    /// the declaring module is known.
    pub fn from_fn(function: &FunctionDef) -> Self {
        let body = function.clone();
        let callable: Callable = Arc::new(move |kwargs: &Kwargs| body.call(kwargs).map(NodeOutput::new));

        let mut node = Self::new(
            function.name(),
            function.return_type().clone(),
            function.docstring(),
            callable,
        )
        .with_input_types(function.signature.input_types());

        if let Some(module) = &function.module {
            node = node.with_tag(MODULE_TAG, Value::Str(module.clone()));
        }
        node
    }

    /// Swaps in a new callable, keeping name, type, inputs and tags.
    pub fn with_callable(mut self, callable: Callable) -> Self {
        self.callable = callable;
        self
    }

    pub fn with_input_types(mut self, input_types: InputTypes) -> Self {
        self.input_types = input_types;
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: Value) -> Self {
        self.tags.insert(key.into(), value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_type(&self) -> &DataType {
        &self.node_type
    }

    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    pub fn input_types(&self) -> &InputTypes {
        &self.input_types
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    /// Names of every declared dependency.
    pub fn dependencies(&self) -> Vec<&str> {
        self.input_types.keys().map(|k| k.as_str()).collect()
    }

    /// Names of dependencies the engine must supply.
    pub fn required_dependencies(&self) -> Vec<&str> {
        self.input_types
            .iter()
            .filter(|(_, (_, dep))| *dep == DependencyType::Required)
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Invokes the callable.
    pub fn call(&self, kwargs: &Kwargs) -> Result<NodeOutput> {
        (self.callable)(kwargs)
    }

    /// Invokes the callable, discarding any updated upstream copies.
    pub fn invoke(&self, kwargs: &Kwargs) -> Result<Value> {
        self.call(kwargs).map(|output| output.value)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("node_type", &self.node_type)
            .field("documentation", &self.documentation)
            .field("input_types", &self.input_types)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum_fn() -> FunctionDef {
        FunctionDef::new("total", DataType::Int)
            .doc("Adds a and b.")
            .module("pipelines.math")
            .param("a", DataType::Int)
            .optional_param("b", DataType::Int, 1)
            .implemented_by(|kwargs| {
                let a = kwargs["a"].as_f64().unwrap_or(0.0);
                let b = kwargs["b"].as_f64().unwrap_or(0.0);
                Ok(Value::Int((a + b) as i64))
            })
    }

    #[test]
    fn test_from_fn_copies_signature() {
        let node = Node::from_fn(&sum_fn());

        assert_eq!(node.name(), "total");
        assert_eq!(node.node_type(), &DataType::Int);
        assert_eq!(node.documentation(), "Adds a and b.");
        assert_eq!(
            node.input_types()["a"],
            (DataType::Int, DependencyType::Required)
        );
        assert_eq!(
            node.input_types()["b"],
            (DataType::Int, DependencyType::Optional)
        );
    }

    #[test]
    fn test_from_fn_adds_module_tag() {
        let node = Node::from_fn(&sum_fn());
        assert_eq!(
            node.tags().get(MODULE_TAG),
            Some(&Value::Str("pipelines.math".to_string()))
        );

        let untagged = Node::from_fn(&FunctionDef::new("x", DataType::Int));
        assert!(untagged.tags().is_empty());
    }

    #[test]
    fn test_invoke_uses_defaults() {
        let node = Node::from_fn(&sum_fn());
        let mut kwargs = Kwargs::new();
        kwargs.insert("a".to_string(), Value::Int(2));

        assert_eq!(node.invoke(&kwargs).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_required_dependencies() {
        let node = Node::from_fn(&sum_fn());
        assert_eq!(node.dependencies(), vec!["a", "b"]);
        assert_eq!(node.required_dependencies(), vec!["a"]);
    }

    #[test]
    fn test_with_tag_returns_copy() {
        let node = Node::from_fn(&sum_fn());
        let tagged = node.clone().with_tag("owner", Value::from("team"));

        assert!(!node.tags().contains_key("owner"));
        assert!(tagged.tags().contains_key("owner"));
    }

    #[test]
    fn test_node_output_updates() {
        let output = NodeOutput::new(Value::Int(1)).with_updated_input("src", Value::Null);
        assert_eq!(output.updated_inputs.len(), 1);
        assert_eq!(NodeOutput::from(Value::Int(1)).updated_inputs.len(), 0);
    }

    #[test]
    fn test_debug_omits_callable() {
        let node = Node::from_fn(&sum_fn());
        let debug = format!("{:?}", node);
        assert!(debug.contains("total"));
        assert!(!debug.contains("callable"));
    }
}
