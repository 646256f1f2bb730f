//! Shared Preconditions
//!
//! Checks reused by several modifiers. Each returns
//! [`Error::InvalidModifier`](crate::Error::InvalidModifier) on violation.

use log::debug;

use crate::error::{Error, Result};
use crate::graph::{FunctionDef, ParamKind};

/// Ensures a function is a pure specification: docstring only, no body.
pub fn ensure_function_empty(function: &FunctionDef) -> Result<()> {
    if !function.is_placeholder() {
        return Err(Error::invalid(format!(
            "function '{}' must not have a body; its implementation is supplied by a modifier",
            function.name()
        )));
    }
    debug!("Function '{}' is a placeholder", function.name());
    Ok(())
}

/// Ensures an implementation can be invoked purely by keyword.
///
/// The function must collect arbitrary keyword arguments and must not declare
/// positional-only or variadic positional parameters.
pub fn ensure_function_kwarg_only(function: &FunctionDef) -> Result<()> {
    if function.is_placeholder() {
        return Err(Error::invalid(format!(
            "implementation '{}' has no body",
            function.name()
        )));
    }

    // Reject positional forms
    for param in function.params() {
        match param.kind {
            ParamKind::PositionalOnly => {
                return Err(Error::invalid(format!(
                    "implementation '{}' declares positional-only parameter '{}'",
                    function.name(),
                    param.name
                )));
            }
            ParamKind::VarPositional => {
                return Err(Error::invalid(format!(
                    "implementation '{}' declares variadic positional parameter '*{}'",
                    function.name(),
                    param.name
                )));
            }
            _ => {}
        }
    }

    // Require **kwargs
    if !function
        .params()
        .iter()
        .any(|p| p.kind == ParamKind::VarKeyword)
    {
        return Err(Error::invalid(format!(
            "implementation '{}' must accept arbitrary keyword arguments",
            function.name()
        )));
    }

    Ok(())
}

/// Ensures an implementation returns the same type as the specification it
/// replaces.
pub fn ensure_output_types_match(spec: &FunctionDef, implementation: &FunctionDef) -> Result<()> {
    if spec.return_type() != implementation.return_type() {
        return Err(Error::invalid(format!(
            "output type mismatch: '{}' declares {} but '{}' returns {}",
            spec.name(),
            spec.return_type(),
            implementation.name(),
            implementation.return_type()
        )));
    }
    Ok(())
}
