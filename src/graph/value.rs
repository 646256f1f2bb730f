//! Runtime Values
//!
//! Dynamic values flowing between node callables. Nodes are invoked with a
//! [`Kwargs`] mapping from dependency name to [`Value`].
//!
//! # Example
//!
//! ```
//! use dagwright::graph::{Table, Value};
//!
//! let table = Table::new()
//!     .with_column("col_1", vec![Value::Int(1), Value::Int(2)])
//!     .with_column("col_2", vec![Value::Int(11), Value::Int(12)]);
//!
//! assert_eq!(table.num_rows(), 2);
//! assert!(table.contains_column("col_2"));
//! ```

use std::collections::BTreeMap;

/// Keyword arguments passed to a node callable.
pub type Kwargs = BTreeMap<String, Value>;

/// A dynamically typed value produced or consumed by a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// A single column of values.
    Series(Vec<Value>),
    Table(Table),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Series(_) => "series",
            Self::Table(_) => "table",
        }
    }

    /// Returns true for single, non-container values (including null).
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Null | Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Str(_)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of ints and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self::Map(map)
    }
}

impl From<Table> for Value {
    fn from(table: Table) -> Self {
        Self::Table(table)
    }
}

/// Converts parsed JSON/YAML data. Integral numbers become `Int`, other
/// numbers `Float`, arrays `List` and objects `Map`.
impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match value {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Self::Str(s),
            Json::Array(items) => Self::List(items.into_iter().map(Value::from).collect()),
            Json::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// A column-oriented table. Column order is insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<(String, Vec<Value>)>,
}

impl Table {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a column, builder style.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<Value>) -> Self {
        self.insert_column(name, values);
        self
    }

    /// Adds a column, replacing any existing column of the same name in place.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<Value>) {
        let name = name.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((name, values)),
        }
    }

    /// Gets a column by name.
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of rows, taken from the longest column.
    pub fn num_rows(&self) -> usize {
        self.columns.iter().map(|(_, v)| v.len()).max().unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_insert_replaces_existing_column() {
        let mut table = Table::new().with_column("a", vec![Value::Int(1)]);
        table.insert_column("a", vec![Value::Int(2)]);

        assert_eq!(table.num_columns(), 1);
        assert_eq!(table.column("a"), Some(&[Value::Int(2)][..]));
    }

    #[test]
    fn test_table_column_order() {
        let table = Table::new()
            .with_column("b", vec![])
            .with_column("a", vec![]);
        assert_eq!(table.column_names(), vec!["b", "a"]);
    }

    #[test]
    fn test_table_num_rows_empty() {
        assert_eq!(Table::new().num_rows(), 0);
    }

    #[test]
    fn test_value_from_json() {
        let json = serde_json::json!({
            "weights": {"col_1": 0.5, "col_2": 2},
            "name": "x",
            "flags": [true, null]
        });

        let value = Value::from(json);
        let map = value.as_map().unwrap();
        assert_eq!(map["name"], Value::Str("x".to_string()));
        assert_eq!(
            map["flags"],
            Value::List(vec![Value::Bool(true), Value::Null])
        );

        let weights = map["weights"].as_map().unwrap();
        assert_eq!(weights["col_1"], Value::Float(0.5));
        assert_eq!(weights["col_2"], Value::Int(2));
    }

    #[test]
    fn test_value_is_scalar() {
        assert!(Value::Null.is_scalar());
        assert!(Value::from("x").is_scalar());
        assert!(!Value::List(vec![]).is_scalar());
        assert!(!Value::Table(Table::new()).is_scalar());
    }

    #[test]
    fn test_value_as_f64() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::from("3").as_f64(), None);
    }
}
