//! Error Types
//!
//! One error enum covers the whole crate. Construction-time contract
//! violations all surface as [`Error::InvalidModifier`] and abort the
//! affected declaration before any node is emitted. The extraction errors
//! ([`Error::MissingColumn`], [`Error::MissingField`]) are deferred: they only
//! occur when a generated callable is invoked by the execution engine.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A modifier's preconditions do not hold for the function it decorates,
    /// or the modifier itself was constructed with malformed arguments.
    #[error("Invalid modifier: {0}")]
    InvalidModifier(String),

    /// Two emitted nodes share a name.
    #[error("Duplicate node name: '{0}'")]
    DuplicateNode(String),

    /// More than one configuration variant matched for the same logical name.
    #[error("Multiple variants of '{name}' match the configuration: {candidates:?}")]
    AmbiguousVariant {
        name: String,
        candidates: Vec<String>,
    },

    /// An extractor ran against a table lacking the column and no fill value
    /// was configured.
    #[error("Column '{column}' is not present in the output of '{source_node}'")]
    MissingColumn { column: String, source_node: String },

    /// An extractor ran against a mapping lacking the field and no fill value
    /// was configured.
    #[error("Field '{field}' is not present in the output of '{source_node}'")]
    MissingField { field: String, source_node: String },

    /// A callable was invoked without one of its required inputs.
    #[error("Node '{node}' was invoked without required input '{input}'")]
    MissingInput { node: String, input: String },

    /// A callable received an input of the wrong shape.
    #[error("Node '{node}' expected input '{input}' to be {expected}, got {found}")]
    InputType {
        node: String,
        input: String,
        expected: String,
        found: String,
    },

    /// A placeholder function with no implementation was invoked.
    #[error("Function '{0}' has no implementation and cannot be called")]
    PlaceholderCalled(String),

    /// A wrapped model failed to construct or predict.
    #[error("Model error: {0}")]
    Model(String),

    /// The configuration could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::InvalidModifier`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidModifier(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_modifier_display() {
        let err = Error::invalid("parameter 'x' not found");
        assert_eq!(err.to_string(), "Invalid modifier: parameter 'x' not found");
    }

    #[test]
    fn test_missing_column_display() {
        let err = Error::MissingColumn {
            column: "col_3".to_string(),
            source_node: "frame".to_string(),
        };
        assert!(err.to_string().contains("col_3"));
        assert!(err.to_string().contains("frame"));
    }

    #[test]
    fn test_ambiguous_variant_display() {
        let err = Error::AmbiguousVariant {
            name: "signal".to_string(),
            candidates: vec!["signal__a".to_string(), "signal__b".to_string()],
        };
        assert!(err.to_string().contains("signal__a"));
    }
}
