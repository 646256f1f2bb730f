//! Extraction Expanders
//!
//! [`ExtractColumns`] splits a table-returning function into one node per
//! column; [`ExtractFields`] does the same for mapping-returning functions.
//! The original node is always kept as the first output, and every extracted
//! node depends only on it.
//!
//! Whether a column or field actually exists is only known when the graph
//! runs, so construction never fails on it. At call time a missing entry is
//! either synthesized from the fill value (and handed back as an updated copy
//! of the upstream result) or reported as an error.

use std::collections::HashSet;
use std::sync::Arc;

use log::debug;

use crate::error::{Error, Result};
use crate::graph::{
    Callable, Config, DataType, DependencyType, FunctionDef, InputTypes, Kwargs, Node, NodeOutput,
    Value,
};

use super::base::{is_identifier, NodeExpander, OutputSpec};

/// Extracts named columns from a table.
///
/// # Example
/// ```
/// use dagwright::modifiers::{ExtractColumns, OutputSpec};
///
/// let annotation = ExtractColumns::new(vec![
///     OutputSpec::from("col_1"),
///     OutputSpec::from(("col_2", "col2_doc")),
/// ])
/// .unwrap()
/// .fill_with(0);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractColumns {
    columns: Vec<(String, Option<String>)>,
    fill_with: Option<Value>,
}

impl ExtractColumns {
    /// At least one column is required. Each entry is a bare name or a
    /// `(name, doc)` pair; a whole list in one entry is rejected.
    pub fn new<S: Into<OutputSpec>>(columns: impl IntoIterator<Item = S>) -> Result<Self> {
        let mut parsed = Vec::new();
        let mut seen = HashSet::new();

        for spec in columns {
            let (name, doc) = match spec.into() {
                OutputSpec::Name(name) => (name, None),
                OutputSpec::Documented { name, doc } => (name, Some(doc)),
                OutputSpec::Collection(names) => {
                    return Err(Error::invalid(format!(
                        "extract_columns got a list {:?}; pass each column separately",
                        names
                    )));
                }
            };
            if !seen.insert(name.clone()) {
                return Err(Error::invalid(format!("column '{}' listed twice", name)));
            }
            parsed.push((name, doc));
        }

        if parsed.is_empty() {
            return Err(Error::invalid("extract_columns requires at least one column"));
        }

        Ok(Self {
            columns: parsed,
            fill_with: None,
        })
    }

    /// Value used to synthesize columns missing at run time.
    pub fn fill_with(mut self, value: impl Into<Value>) -> Self {
        self.fill_with = Some(value.into());
        self
    }
}

impl NodeExpander for ExtractColumns {
    fn validate(&self, function: &FunctionDef) -> Result<()> {
        if !function.return_type().is_tabular() {
            return Err(Error::invalid(format!(
                "extract_columns requires '{}' to return a table, not {}",
                function.name(),
                function.return_type()
            )));
        }
        Ok(())
    }

    fn expand_node(
        &self,
        node: &Node,
        _config: &Config,
        _function: &FunctionDef,
    ) -> Result<Vec<Node>> {
        let source = node.name().to_string();
        let input_types: InputTypes = InputTypes::from([(
            source.clone(),
            (node.node_type().clone(), DependencyType::Required),
        )]);

        let mut nodes = vec![node.clone()];
        for (column, doc) in &self.columns {
            let callable = column_extractor(source.clone(), column.clone(), self.fill_with.clone());
            let doc = doc.as_deref().unwrap_or(node.documentation());

            debug!("Extracting column '{}' from '{}'", column, source);
            nodes.push(
                Node::new(column.clone(), DataType::Series, doc, callable)
                    .with_input_types(input_types.clone())
                    .with_tags(node.tags().clone()),
            );
        }
        Ok(nodes)
    }
}

fn column_extractor(source: String, column: String, fill_with: Option<Value>) -> Callable {
    Arc::new(move |kwargs: &Kwargs| {
        // Upstream must be a table
        let table = match kwargs.get(&source) {
            Some(Value::Table(table)) => table,
            Some(other) => {
                return Err(Error::InputType {
                    node: column.clone(),
                    input: source.clone(),
                    expected: DataType::Table.to_string(),
                    found: other.type_name().to_string(),
                });
            }
            None => {
                return Err(Error::MissingInput {
                    node: column.clone(),
                    input: source.clone(),
                });
            }
        };

        if let Some(values) = table.column(&column) {
            return Ok(NodeOutput::new(Value::Series(values.to_vec())));
        }

        // Missing column: synthesize and backfill, or fail
        match &fill_with {
            Some(fill) => {
                let values = vec![fill.clone(); table.num_rows()];
                let mut updated = table.clone();
                updated.insert_column(column.clone(), values.clone());
                debug!("Filled missing column '{}' of '{}'", column, source);
                Ok(NodeOutput::new(Value::Series(values))
                    .with_updated_input(source.clone(), Value::Table(updated)))
            }
            None => Err(Error::MissingColumn {
                column: column.clone(),
                source_node: source.clone(),
            }),
        }
    })
}

/// Extracts typed fields from a mapping.
#[derive(Debug, Clone)]
pub struct ExtractFields {
    fields: Vec<(String, DataType)>,
    fill_with: Option<Value>,
}

impl ExtractFields {
    /// Fields must be a non-empty list of identifier names with concrete
    /// types.
    pub fn new<K: Into<String>>(fields: impl IntoIterator<Item = (K, DataType)>) -> Result<Self> {
        let mut parsed = Vec::new();
        let mut seen = HashSet::new();

        for (name, ty) in fields {
            let name = name.into();
            if !is_identifier(&name) {
                return Err(Error::invalid(format!(
                    "extract_fields field name '{}' is not a valid identifier",
                    name
                )));
            }
            if !ty.is_concrete() {
                return Err(Error::invalid(format!(
                    "extract_fields field '{}' must map to a concrete type, got {}",
                    name, ty
                )));
            }
            if !seen.insert(name.clone()) {
                return Err(Error::invalid(format!("field '{}' listed twice", name)));
            }
            parsed.push((name, ty));
        }

        if parsed.is_empty() {
            return Err(Error::invalid(
                "extract_fields requires a non-empty mapping of field name to type",
            ));
        }

        Ok(Self {
            fields: parsed,
            fill_with: None,
        })
    }

    /// Builds the extractor from a dynamically supplied specifier, such as one
    /// read from configuration: a mapping of field name to type name.
    pub fn from_spec(spec: &Value) -> Result<Self> {
        let map = match spec {
            Value::Map(map) => map,
            other => {
                return Err(Error::invalid(format!(
                    "extract_fields requires a mapping of field name to type, got {}",
                    other.type_name()
                )));
            }
        };

        let fields = map
            .iter()
            .map(|(name, ty)| match ty {
                Value::Str(type_name) => Ok((name.clone(), type_name.parse::<DataType>()?)),
                other => Err(Error::invalid(format!(
                    "extract_fields field '{}' must name a type, got {}",
                    name,
                    other.type_name()
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(fields)
    }

    /// Value used to synthesize fields missing at run time.
    pub fn fill_with(mut self, value: impl Into<Value>) -> Self {
        self.fill_with = Some(value.into());
        self
    }
}

impl NodeExpander for ExtractFields {
    fn validate(&self, function: &FunctionDef) -> Result<()> {
        if !function.return_type().is_dict_compatible() {
            return Err(Error::invalid(format!(
                "extract_fields requires '{}' to return a dict, not {}",
                function.name(),
                function.return_type()
            )));
        }
        Ok(())
    }

    fn expand_node(
        &self,
        node: &Node,
        _config: &Config,
        _function: &FunctionDef,
    ) -> Result<Vec<Node>> {
        let source = node.name().to_string();
        let input_types: InputTypes = InputTypes::from([(
            source.clone(),
            (node.node_type().clone(), DependencyType::Required),
        )]);

        let mut nodes = vec![node.clone()];
        for (field, ty) in &self.fields {
            let callable = field_extractor(source.clone(), field.clone(), self.fill_with.clone());

            debug!("Extracting field '{}' ({}) from '{}'", field, ty, source);
            nodes.push(
                Node::new(field.clone(), ty.clone(), node.documentation(), callable)
                    .with_input_types(input_types.clone())
                    .with_tags(node.tags().clone()),
            );
        }
        Ok(nodes)
    }
}

fn field_extractor(source: String, field: String, fill_with: Option<Value>) -> Callable {
    Arc::new(move |kwargs: &Kwargs| {
        // Upstream must be a mapping
        let map = match kwargs.get(&source) {
            Some(Value::Map(map)) => map,
            Some(other) => {
                return Err(Error::InputType {
                    node: field.clone(),
                    input: source.clone(),
                    expected: DataType::Dict.to_string(),
                    found: other.type_name().to_string(),
                });
            }
            None => {
                return Err(Error::MissingInput {
                    node: field.clone(),
                    input: source.clone(),
                });
            }
        };

        if let Some(value) = map.get(&field) {
            return Ok(NodeOutput::new(value.clone()));
        }

        // Missing field
        match &fill_with {
            Some(fill) => {
                let mut updated = map.clone();
                updated.insert(field.clone(), fill.clone());
                debug!("Filled missing field '{}' of '{}'", field, source);
                Ok(NodeOutput::new(fill.clone())
                    .with_updated_input(source.clone(), Value::Map(updated)))
            }
            None => Err(Error::MissingField {
                field: field.clone(),
                source_node: source.clone(),
            }),
        }
    })
}
