//! Declared Types
//!
//! The vocabulary of type annotations used by function signatures and nodes.
//! Types are compared structurally; the crate never checks runtime values
//! against them except inside extractor callables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A declared parameter or return type.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Unconstrained annotation.
    Any,
    /// The unit/none type.
    None,
    Bool,
    Int,
    Float,
    Str,
    List,
    /// An untyped mapping.
    Dict,
    /// A mapping with declared key and value types.
    DictOf(Box<DataType>, Box<DataType>),
    /// A dataframe-like table of named columns.
    Table,
    /// A single column.
    Series,
    /// A dense numeric array.
    Array,
    /// Any other user-defined type, identified by name.
    Custom(String),
}

impl DataType {
    /// Shorthand for `DictOf(key, value)`.
    pub fn dict_of(key: DataType, value: DataType) -> Self {
        Self::DictOf(Box::new(key), Box::new(value))
    }

    /// True for dataframe-like types that support column extraction.
    pub fn is_tabular(&self) -> bool {
        matches!(self, Self::Table)
    }

    /// True for mapping types that support field extraction.
    pub fn is_dict_compatible(&self) -> bool {
        matches!(self, Self::Dict | Self::DictOf(..))
    }

    /// A concrete type names an actual type rather than the `Any` wildcard.
    pub fn is_concrete(&self) -> bool {
        !matches!(self, Self::Any)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::None => write!(f, "none"),
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Str => write!(f, "str"),
            Self::List => write!(f, "list"),
            Self::Dict => write!(f, "dict"),
            Self::DictOf(k, v) => write!(f, "dict[{}, {}]", k, v),
            Self::Table => write!(f, "table"),
            Self::Series => write!(f, "series"),
            Self::Array => write!(f, "array"),
            Self::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Parses the simple type names accepted in dynamically supplied specifiers.
impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "any" => Ok(Self::Any),
            "none" => Ok(Self::None),
            "bool" => Ok(Self::Bool),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "str" => Ok(Self::Str),
            "list" => Ok(Self::List),
            "dict" => Ok(Self::Dict),
            "table" | "dataframe" => Ok(Self::Table),
            "series" => Ok(Self::Series),
            "array" | "ndarray" => Ok(Self::Array),
            other => Err(Error::invalid(format!("'{}' is not a known type name", other))),
        }
    }
}

/// Whether a node must be supplied a dependency or may fall back to a default.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    Required,
    Optional,
}
