//! Function Declarations
//!
//! A [`FunctionDef`] is the explicit description of an authored function:
//! its [`Signature`] (name, ordered parameters, return type, docstring), its
//! [`Body`] and the module it was declared in. Every modifier validates and
//! expands against this description; nothing is discovered by reflection.
//!
//! # Example
//!
//! ```
//! use dagwright::graph::{DataType, FunctionDef, Value};
//!
//! let add = FunctionDef::new("total", DataType::Int)
//!     .doc("Sums both inputs.")
//!     .param("a", DataType::Int)
//!     .optional_param("b", DataType::Int, 10)
//!     .implemented_by(|kwargs| {
//!         let a = kwargs["a"].as_f64().unwrap_or_default() as i64;
//!         let b = kwargs["b"].as_f64().unwrap_or_default() as i64;
//!         Ok(Value::Int(a + b))
//!     });
//!
//! let mut kwargs = dagwright::graph::Kwargs::new();
//! kwargs.insert("a".to_string(), Value::Int(1));
//! assert_eq!(add.call(&kwargs).unwrap(), Value::Int(11));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

use super::node::Node;
use super::types::{DataType, DependencyType};
use super::value::{Kwargs, Value};

/// A user-supplied function body.
pub type Implementation = Arc<dyn Fn(&Kwargs) -> Result<Value> + Send + Sync>;

/// How a parameter may be passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Can only be passed by position; never wired by name.
    PositionalOnly,
    PositionalOrKeyword,
    KeywordOnly,
    /// Collects extra positional arguments.
    VarPositional,
    /// Collects arbitrary keyword arguments.
    VarKeyword,
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: DataType,
    pub kind: ParamKind,
    /// Value used when the caller omits the argument.
    pub default: Option<Value>,
    /// Optional parameters may be omitted even without a known default.
    pub dependency: DependencyType,
}

impl Parameter {
    pub fn dependency_type(&self) -> DependencyType {
        self.dependency
    }

    /// True if the execution engine can supply this parameter by name.
    pub fn is_wired(&self) -> bool {
        matches!(self.kind, ParamKind::PositionalOrKeyword | ParamKind::KeywordOnly)
    }
}

/// Name, parameters, return type and documentation of a function.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: DataType,
    pub doc: String,
}

impl Signature {
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }

    /// Dependencies the engine must wire for this signature.
    pub fn input_types(&self) -> BTreeMap<String, (DataType, DependencyType)> {
        self.params
            .iter()
            .filter(|p| p.is_wired())
            .map(|p| (p.name.clone(), (p.ty.clone(), p.dependency_type())))
            .collect()
    }

    /// Copies `kwargs`, filling in defaults for omitted parameters.
    pub fn bind_defaults(&self, kwargs: &Kwargs) -> Kwargs {
        let mut bound = kwargs.clone();
        for param in &self.params {
            if let Some(default) = &param.default {
                bound
                    .entry(param.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
        bound
    }
}

/// The body of a declared function.
#[derive(Clone)]
pub enum Body {
    /// Docstring-only placeholder; the function is a pure specification.
    Empty,
    Code(Implementation),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Body::Empty"),
            Self::Code(_) => write!(f, "Body::Code(..)"),
        }
    }
}

/// An authored function definition.
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub signature: Signature,
    pub body: Body,
    /// Module path the function was declared in, if known.
    pub module: Option<String>,
}

impl FunctionDef {
    /// Creates a placeholder function with no parameters.
    pub fn new(name: impl Into<String>, return_type: DataType) -> Self {
        Self {
            signature: Signature {
                name: name.into().trim().to_string(),
                params: Vec::new(),
                return_type,
                doc: String::new(),
            },
            body: Body::Empty,
            module: None,
        }
    }

    /// Sets the docstring.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.signature.doc = doc.into();
        self
    }

    /// Sets the declaring module.
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Adds a required positional-or-keyword parameter.
    pub fn param(self, name: impl Into<String>, ty: DataType) -> Self {
        self.push_param(name, ty, ParamKind::PositionalOrKeyword, None)
    }

    /// Adds a parameter with a default value.
    pub fn optional_param(
        self,
        name: impl Into<String>,
        ty: DataType,
        default: impl Into<Value>,
    ) -> Self {
        self.push_param(name, ty, ParamKind::PositionalOrKeyword, Some(default.into()))
    }

    pub fn keyword_only(self, name: impl Into<String>, ty: DataType) -> Self {
        self.push_param(name, ty, ParamKind::KeywordOnly, None)
    }

    pub fn positional_only(self, name: impl Into<String>, ty: DataType) -> Self {
        self.push_param(name, ty, ParamKind::PositionalOnly, None)
    }

    pub fn var_positional(self, name: impl Into<String>) -> Self {
        self.push_param(name, DataType::Any, ParamKind::VarPositional, None)
    }

    pub fn var_keyword(self, name: impl Into<String>, ty: DataType) -> Self {
        self.push_param(name, ty, ParamKind::VarKeyword, None)
    }

    fn push_param(
        mut self,
        name: impl Into<String>,
        ty: DataType,
        kind: ParamKind,
        default: Option<Value>,
    ) -> Self {
        let dependency = match default {
            Some(_) => DependencyType::Optional,
            None => DependencyType::Required,
        };
        self.signature.params.push(Parameter {
            name: name.into(),
            ty,
            kind,
            default,
            dependency,
        });
        self
    }

    /// Gives the function a real body.
    pub fn implemented_by<F>(mut self, f: F) -> Self
    where
        F: Fn(&Kwargs) -> Result<Value> + Send + Sync + 'static,
    {
        self.body = Body::Code(Arc::new(f));
        self
    }

    /// Describes an already-built node as a function, so later expanders can
    /// validate against the node's rewired dependencies.
    ///
    /// Optional inputs carry no default here; the node's own callable
    /// applies its defaults, so calling the view matches invoking the node.
    pub fn from_node(node: &Node) -> Self {
        let params = node
            .input_types()
            .iter()
            .map(|(name, (ty, dep))| Parameter {
                name: name.clone(),
                ty: ty.clone(),
                kind: ParamKind::PositionalOrKeyword,
                default: None,
                dependency: *dep,
            })
            .collect();

        let callable = node.clone();
        Self {
            signature: Signature {
                name: node.name().to_string(),
                params,
                return_type: node.node_type().clone(),
                doc: node.documentation().to_string(),
            },
            body: Body::Code(Arc::new(move |kwargs: &Kwargs| callable.invoke(kwargs))),
            module: None,
        }
    }

    /// Returns a copy with a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        let mut renamed = self.clone();
        renamed.signature.name = name.into();
        renamed
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn return_type(&self) -> &DataType {
        &self.signature.return_type
    }

    pub fn docstring(&self) -> &str {
        &self.signature.doc
    }

    pub fn params(&self) -> &[Parameter] {
        &self.signature.params
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.signature.has_parameter(name)
    }

    /// True if the function has no body.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.body, Body::Empty)
    }

    /// Invokes the body with defaults bound for omitted optional parameters.
    pub fn call(&self, kwargs: &Kwargs) -> Result<Value> {
        match &self.body {
            Body::Empty => Err(Error::PlaceholderCalled(self.name().to_string())),
            Body::Code(f) => f(&self.signature.bind_defaults(kwargs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_records_parameters_in_order() {
        let f = FunctionDef::new("f", DataType::Int)
            .param("a", DataType::Int)
            .keyword_only("b", DataType::Str)
            .var_keyword("rest", DataType::Any);

        let names: Vec<_> = f.params().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "rest"]);
        assert_eq!(f.params()[1].kind, ParamKind::KeywordOnly);
    }

    #[test]
    fn test_input_types_skip_variadic_and_positional_only() {
        let f = FunctionDef::new("f", DataType::Int)
            .positional_only("p", DataType::Int)
            .param("a", DataType::Int)
            .optional_param("b", DataType::Float, 1.0)
            .var_positional("args")
            .var_keyword("kwargs", DataType::Any);

        let inputs = f.signature.input_types();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs["a"], (DataType::Int, DependencyType::Required));
        assert_eq!(inputs["b"], (DataType::Float, DependencyType::Optional));
    }

    #[test]
    fn test_call_placeholder_fails() {
        let f = FunctionDef::new("spec", DataType::Int);
        assert!(f.is_placeholder());
        assert!(matches!(
            f.call(&Kwargs::new()),
            Err(Error::PlaceholderCalled(name)) if name == "spec"
        ));
    }

    #[test]
    fn test_call_binds_defaults() {
        let f = FunctionDef::new("f", DataType::Int)
            .optional_param("b", DataType::Int, 7)
            .implemented_by(|kwargs| Ok(kwargs["b"].clone()));

        assert_eq!(f.call(&Kwargs::new()).unwrap(), Value::Int(7));

        let mut kwargs = Kwargs::new();
        kwargs.insert("b".to_string(), Value::Int(2));
        assert_eq!(f.call(&kwargs).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_renamed_keeps_signature() {
        let f = FunctionDef::new("fn__v2", DataType::Int).param("a", DataType::Int);
        let renamed = f.renamed("fn");
        assert_eq!(renamed.name(), "fn");
        assert!(renamed.has_parameter("a"));
        assert_eq!(f.name(), "fn__v2");
    }

    #[test]
    fn test_from_node_call_matches_invoke() {
        let total = FunctionDef::new("total", DataType::Int)
            .param("a", DataType::Int)
            .optional_param("b", DataType::Int, 1)
            .implemented_by(|kwargs| {
                let a = kwargs["a"].as_f64().unwrap_or(-100.0);
                let b = kwargs["b"].as_f64().unwrap_or(-100.0);
                Ok(Value::Int((a + b) as i64))
            });
        let node = Node::from_fn(&total);
        let view = FunctionDef::from_node(&node);

        let mut kwargs = Kwargs::new();
        kwargs.insert("a".to_string(), Value::Int(2));
        assert_eq!(view.call(&kwargs).unwrap(), node.invoke(&kwargs).unwrap());
        assert_eq!(view.call(&kwargs).unwrap(), Value::Int(3));

        let b = view.signature.parameter("b").unwrap();
        assert_eq!(b.dependency_type(), DependencyType::Optional);
        assert!(b.default.is_none());
        assert_eq!(view.signature.input_types(), node.input_types().clone());
    }

    #[test]
    fn test_name_is_trimmed() {
        let f = FunctionDef::new("  spaced ", DataType::Int);
        assert_eq!(f.name(), "spaced");
    }
}
