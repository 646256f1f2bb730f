//! Modifier Lifecycle
//!
//! Every modifier plugs into one stage of the per-declaration pipeline:
//!
//! 1. [`NodeResolver`]: decide whether this variant exists for a configuration
//! 2. [`NodeCreator`]: build the base node
//! 3. [`NodeExpander`]: turn one node into many
//! 4. [`NodeDecorator`]: attach metadata to every resulting node
//!
//! Each stage first validates its preconditions against the function
//! description, so a malformed declaration fails before any node exists.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;
use crate::graph::{Config, FunctionDef, Node};

/// Marker separating a function's logical name from its variant suffix.
pub const VARIANT_MARKER: &str = "__";

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

/// True if `name` is a plain identifier: letters, digits and underscores,
/// not starting with a digit.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Strips the variant suffix from a function name.
///
/// Everything from the first occurrence of [`VARIANT_MARKER`] onward is
/// removed, so `signal__v2` and `signal__legacy` both resolve to `signal`.
///
/// # Example
/// ```
/// use dagwright::modifiers::sanitize_function_name;
///
/// assert_eq!(sanitize_function_name("fn_name__v2"), "fn_name");
/// assert_eq!(sanitize_function_name("fn_name"), "fn_name");
/// ```
pub fn sanitize_function_name(name: &str) -> &str {
    match name.find(VARIANT_MARKER) {
        Some(index) => &name[..index],
        None => name,
    }
}

/// Names (and optionally documents) one output of an expander.
///
/// A [`OutputSpec::Collection`] is what a caller produces by passing a whole
/// list where individual outputs were expected; expanders reject it as
/// ambiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSpec {
    Name(String),
    Documented { name: String, doc: String },
    Collection(Vec<String>),
}

impl OutputSpec {
    /// The output name, unless this is a collection.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Name(name) | Self::Documented { name, .. } => Some(name),
            Self::Collection(_) => None,
        }
    }

    pub fn doc(&self) -> Option<&str> {
        match self {
            Self::Documented { doc, .. } => Some(doc),
            _ => None,
        }
    }
}

impl From<&str> for OutputSpec {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for OutputSpec {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<(&str, &str)> for OutputSpec {
    fn from((name, doc): (&str, &str)) -> Self {
        Self::Documented {
            name: name.to_string(),
            doc: doc.to_string(),
        }
    }
}

impl From<(String, String)> for OutputSpec {
    fn from((name, doc): (String, String)) -> Self {
        Self::Documented { name, doc }
    }
}

impl From<Vec<&str>> for OutputSpec {
    fn from(names: Vec<&str>) -> Self {
        Self::Collection(names.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for OutputSpec {
    fn from(names: Vec<String>) -> Self {
        Self::Collection(names)
    }
}

/// Selects whether a function variant contributes to the graph.
pub trait NodeResolver: Send + Sync {
    fn validate(&self, function: &FunctionDef) -> Result<()>;

    /// Returns the (possibly renamed) function if it applies to `config`.
    fn resolve(&self, function: &FunctionDef, config: &Config) -> Option<FunctionDef>;

    /// Name the function takes whenever it resolves, whatever the
    /// configuration.
    fn logical_name(&self, function: &FunctionDef) -> String {
        sanitize_function_name(function.name()).to_string()
    }
}

/// Builds the base node for a function.
pub trait NodeCreator: Send + Sync {
    fn validate(&self, function: &FunctionDef) -> Result<()>;

    fn generate_node(&self, function: &FunctionDef, config: &Config) -> Result<Node>;
}

/// Multiplies one node into an ordered sequence of nodes.
pub trait NodeExpander: Send + Sync {
    fn validate(&self, function: &FunctionDef) -> Result<()>;

    fn expand_node(&self, node: &Node, config: &Config, function: &FunctionDef)
        -> Result<Vec<Node>>;
}

/// Transforms a single node, typically by attaching metadata.
pub trait NodeDecorator: Send + Sync {
    fn validate(&self, function: &FunctionDef) -> Result<()>;

    fn decorate_node(&self, node: Node) -> Node;
}

/// Creator used when a declaration has none attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNodeCreator;

impl NodeCreator for DefaultNodeCreator {
    fn validate(&self, _function: &FunctionDef) -> Result<()> {
        Ok(())
    }

    fn generate_node(&self, function: &FunctionDef, _config: &Config) -> Result<Node> {
        Ok(Node::from_fn(function))
    }
}
