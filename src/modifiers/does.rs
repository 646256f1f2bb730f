//! Delegation
//!
//! [`Does`] replaces a placeholder function's body with a separately
//! supplied implementation while keeping the placeholder's name,
//! documentation, return type and dependencies.

use std::sync::Arc;

use log::debug;

use crate::error::Result;
use crate::graph::{Callable, Config, FunctionDef, Kwargs, Node, NodeOutput};

use super::base::NodeCreator;
use super::validators::{
    ensure_function_empty, ensure_function_kwarg_only, ensure_output_types_match,
};

/// Delegates a placeholder function to `implementation`.
///
/// The implementation receives the placeholder's declared parameters as
/// keyword arguments, so it must accept arbitrary keywords.
#[derive(Debug, Clone)]
pub struct Does {
    implementation: FunctionDef,
}

impl Does {
    pub fn new(implementation: FunctionDef) -> Self {
        Self { implementation }
    }
}

impl NodeCreator for Does {
    fn validate(&self, function: &FunctionDef) -> Result<()> {
        ensure_function_empty(function)?;
        ensure_function_kwarg_only(&self.implementation)?;
        ensure_output_types_match(function, &self.implementation)
    }

    fn generate_node(&self, function: &FunctionDef, _config: &Config) -> Result<Node> {
        let spec = function.signature.clone();
        let implementation = self.implementation.clone();

        debug!(
            "Delegating '{}' to implementation '{}'",
            spec.name,
            implementation.name()
        );

        let callable: Callable = Arc::new(move |kwargs: &Kwargs| {
            // Forward only the declared parameters, with defaults filled
            let bound = spec.bind_defaults(kwargs);
            let forwarded: Kwargs = bound
                .into_iter()
                .filter(|(name, _)| spec.has_parameter(name))
                .collect();
            implementation.call(&forwarded).map(NodeOutput::new)
        });

        Ok(Node::from_fn(function).with_callable(callable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::graph::{DataType, Value};

    fn sum_() -> FunctionDef {
        FunctionDef::new("sum_", DataType::Int)
            .var_keyword("kwargs", DataType::Int)
            .implemented_by(|kwargs| {
                let total: f64 = kwargs.values().filter_map(Value::as_f64).sum();
                Ok(Value::Int(total as i64))
            })
    }

    fn to_modify() -> FunctionDef {
        FunctionDef::new("to_modify", DataType::Int)
            .doc("This sums the inputs it gets...")
            .param("param1", DataType::Int)
            .param("param2", DataType::Int)
    }

    #[test]
    fn test_does_function_modifier() {
        let annotation = Does::new(sum_());
        let spec = to_modify();
        annotation.validate(&spec).unwrap();

        let node = annotation.generate_node(&spec, &Config::new()).unwrap();
        assert_eq!(node.name(), "to_modify");
        assert_eq!(node.documentation(), spec.docstring());

        let mut kwargs = Kwargs::new();
        kwargs.insert("param1".to_string(), Value::Int(1));
        kwargs.insert("param2".to_string(), Value::Int(1));
        assert_eq!(node.invoke(&kwargs).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_does_keeps_spec_inputs() {
        let node = Does::new(sum_())
            .generate_node(&to_modify(), &Config::new())
            .unwrap();
        assert_eq!(node.dependencies(), vec!["param1", "param2"]);
    }

    #[test]
    fn test_does_forwards_only_declared_params() {
        let node = Does::new(sum_())
            .generate_node(&to_modify(), &Config::new())
            .unwrap();

        let mut kwargs = Kwargs::new();
        kwargs.insert("param1".to_string(), Value::Int(1));
        kwargs.insert("param2".to_string(), Value::Int(2));
        kwargs.insert("unrelated".to_string(), Value::Int(100));
        assert_eq!(node.invoke(&kwargs).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_does_fills_spec_defaults() {
        let spec = FunctionDef::new("spec", DataType::Int)
            .param("a", DataType::Int)
            .optional_param("b", DataType::Int, 5);
        let node = Does::new(sum_())
            .generate_node(&spec, &Config::new())
            .unwrap();

        let mut kwargs = Kwargs::new();
        kwargs.insert("a".to_string(), Value::Int(1));
        assert_eq!(node.invoke(&kwargs).unwrap(), Value::Int(6));
    }

    #[test]
    fn test_does_rejects_spec_with_body() {
        let spec = to_modify().implemented_by(|_| Ok(Value::Int(0)));
        assert!(matches!(
            Does::new(sum_()).validate(&spec),
            Err(Error::InvalidModifier(_))
        ));
    }

    #[test]
    fn test_does_rejects_return_mismatch() {
        let implementation = FunctionDef::new("as_str", DataType::Str)
            .var_keyword("kwargs", DataType::Any)
            .implemented_by(|_| Ok(Value::from("")));
        assert!(Does::new(implementation).validate(&to_modify()).is_err());
    }

    #[test]
    fn test_does_rejects_positional_implementation() {
        let implementation = FunctionDef::new("positional", DataType::Int)
            .var_positional("args")
            .implemented_by(|_| Ok(Value::Int(0)));
        assert!(Does::new(implementation).validate(&to_modify()).is_err());
    }
}
