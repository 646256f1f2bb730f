//! Configured Models
//!
//! A [`Model`] computes a column from other columns using parameters taken
//! from configuration. Models are built per node by a [`ModelFactory`] and
//! wrapped into graph nodes by [`crate::modifiers::WrapModel`].
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use dagwright::graph::{Kwargs, Value};
//! use dagwright::models::{LinearCombination, Model};
//!
//! let params = Value::Map(BTreeMap::from([
//!     ("col_1".to_string(), Value::Float(0.5)),
//!     ("col_2".to_string(), Value::Float(0.5)),
//! ]));
//! let model = LinearCombination::from_params(&params, "my_column").unwrap();
//! assert_eq!(model.dependents(), vec!["col_1", "col_2"]);
//!
//! let kwargs = Kwargs::from([
//!     ("col_1".to_string(), Value::Series(vec![Value::Int(1)])),
//!     ("col_2".to_string(), Value::Series(vec![Value::Int(2)])),
//! ]);
//! assert_eq!(model.predict(&kwargs).unwrap(), Value::Series(vec![Value::Float(1.5)]));
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graph::{Kwargs, Value};

/// A configured computation over named input columns.
pub trait Model: Send + Sync {
    /// Names of the columns the model reads.
    fn dependents(&self) -> Vec<String>;

    /// Computes the output from the dependent columns.
    fn predict(&self, columns: &Kwargs) -> Result<Value>;
}

/// Builds a model from its configuration parameters and the name of the
/// node it will back.
pub type ModelFactory = Arc<dyn Fn(&Value, &str) -> Result<Arc<dyn Model>> + Send + Sync>;

/// Weighted elementwise sum of numeric series.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearCombination {
    node_name: String,
    weights: BTreeMap<String, f64>,
}

impl LinearCombination {
    /// Reads weights from a mapping of column name to number.
    pub fn from_params(params: &Value, node_name: &str) -> Result<Self> {
        let map = params.as_map().ok_or_else(|| {
            Error::Model(format!(
                "'{}' expects a mapping of column to weight, got {}",
                node_name,
                params.type_name()
            ))
        })?;

        let weights = map
            .iter()
            .map(|(column, weight)| {
                weight.as_f64().map(|w| (column.clone(), w)).ok_or_else(|| {
                    Error::Model(format!(
                        "weight for '{}' in '{}' must be numeric, got {}",
                        column,
                        node_name,
                        weight.type_name()
                    ))
                })
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self {
            node_name: node_name.to_string(),
            weights,
        })
    }

    /// Factory suitable for [`crate::modifiers::WrapModel`].
    pub fn factory() -> ModelFactory {
        Arc::new(|params: &Value, node_name: &str| -> Result<Arc<dyn Model>> {
            let model: Arc<dyn Model> = Arc::new(Self::from_params(params, node_name)?);
            Ok(model)
        })
    }

    fn numeric_column(&self, columns: &Kwargs, name: &str) -> Result<Vec<f64>> {
        let values = match columns.get(name) {
            Some(Value::Series(values)) | Some(Value::List(values)) => values,
            Some(other) => {
                return Err(Error::InputType {
                    node: self.node_name.clone(),
                    input: name.to_string(),
                    expected: "series".to_string(),
                    found: other.type_name().to_string(),
                });
            }
            None => {
                return Err(Error::MissingInput {
                    node: self.node_name.clone(),
                    input: name.to_string(),
                });
            }
        };

        values
            .iter()
            .map(|v| {
                v.as_f64().ok_or_else(|| {
                    Error::Model(format!(
                        "column '{}' of '{}' holds a non-numeric {}",
                        name,
                        self.node_name,
                        v.type_name()
                    ))
                })
            })
            .collect()
    }
}

impl Model for LinearCombination {
    fn dependents(&self) -> Vec<String> {
        self.weights.keys().cloned().collect()
    }

    fn predict(&self, columns: &Kwargs) -> Result<Value> {
        let mut total: Option<Vec<f64>> = None;

        for (name, weight) in &self.weights {
            // Accumulate weighted columns of equal length
            let column = self.numeric_column(columns, name)?;
            total = Some(match total {
                None => column.iter().map(|v| v * weight).collect(),
                Some(acc) if acc.len() == column.len() => acc
                    .iter()
                    .zip(&column)
                    .map(|(a, v)| a + v * weight)
                    .collect(),
                Some(acc) => {
                    return Err(Error::Model(format!(
                        "column '{}' has {} rows, expected {} for '{}'",
                        name,
                        column.len(),
                        acc.len(),
                        self.node_name
                    )));
                }
            });
        }

        let values = total.unwrap_or_default();
        Ok(Value::Series(values.into_iter().map(Value::Float).collect()))
    }
}
