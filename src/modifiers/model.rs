//! Model Wrapping
//!
//! [`WrapModel`] backs a placeholder function with a [`Model`] built from
//! configuration. The model's parameters live under a caller-chosen config
//! key; the model decides which columns the node depends on.

use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::error::{Error, Result};
use crate::graph::{
    Callable, Config, DataType, DependencyType, FunctionDef, InputTypes, Kwargs, Node, NodeOutput,
};
use crate::models::{Model, ModelFactory};

use super::base::NodeCreator;
use super::validators::ensure_function_empty;

/// Creates a node whose value is computed by a configured model.
///
/// # Example
/// ```
/// use dagwright::graph::{Config, DataType, FunctionDef, Value};
/// use dagwright::models::LinearCombination;
/// use dagwright::modifiers::{NodeCreator, WrapModel};
///
/// let config = Config::from_yaml_str("my_column_params: {col_1: 0.5, col_2: 0.5}").unwrap();
/// let my_column = FunctionDef::new("my_column", DataType::Series);
///
/// let annotation = WrapModel::new(LinearCombination::factory(), "my_column_params");
/// annotation.validate(&my_column).unwrap();
/// let node = annotation.generate_node(&my_column, &config).unwrap();
/// assert_eq!(node.dependencies(), vec!["col_1", "col_2"]);
/// ```
#[derive(Clone)]
pub struct WrapModel {
    factory: ModelFactory,
    config_key: String,
}

impl WrapModel {
    pub fn new(factory: ModelFactory, config_key: impl Into<String>) -> Self {
        Self {
            factory,
            config_key: config_key.into(),
        }
    }

    pub fn config_key(&self) -> &str {
        &self.config_key
    }
}

impl fmt::Debug for WrapModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapModel")
            .field("config_key", &self.config_key)
            .finish_non_exhaustive()
    }
}

impl NodeCreator for WrapModel {
    fn validate(&self, function: &FunctionDef) -> Result<()> {
        ensure_function_empty(function)?;
        if !function.params().is_empty() {
            return Err(Error::invalid(format!(
                "'{}' is backed by a model and must not declare parameters",
                function.name()
            )));
        }
        Ok(())
    }

    fn generate_node(&self, function: &FunctionDef, config: &Config) -> Result<Node> {
        let params = config.get(&self.config_key).ok_or_else(|| {
            Error::invalid(format!(
                "model parameters for '{}' not found under config key '{}'",
                function.name(),
                self.config_key
            ))
        })?;

        let model: Arc<dyn Model> = (self.factory)(params, function.name())?;
        let input_types: InputTypes = model
            .dependents()
            .into_iter()
            .map(|dep| (dep, (DataType::Series, DependencyType::Required)))
            .collect();

        debug!(
            "Wrapping '{}' with a model reading {:?}",
            function.name(),
            input_types.keys().collect::<Vec<_>>()
        );

        let callable: Callable =
            Arc::new(move |kwargs: &Kwargs| model.predict(kwargs).map(NodeOutput::new));

        Ok(Node::from_fn(function)
            .with_input_types(input_types)
            .with_callable(callable))
    }
}
