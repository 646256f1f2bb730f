//! Function Modifiers
//!
//! Modifiers attach to a function declaration and shape the nodes it
//! contributes to the graph.
//!
//! # Structure
//!
//! - [`base`]: Lifecycle traits and name desugaring
//! - [`validators`]: Shared signature checks
//! - [`does`]: Delegating a placeholder to an implementation
//! - [`model`]: Backing a placeholder with a configured model
//! - [`parametrized`]: One function, many nodes
//! - [`extract`]: Splitting tables and mappings into nodes
//! - [`resolve`]: Configuration-driven variants
//! - [`tags`]: Node metadata
//! - [`template`]: Docstring placeholder rendering

pub mod base;
pub mod does;
pub mod extract;
pub mod model;
pub mod parametrized;
pub mod resolve;
pub mod tags;
pub mod template;
pub mod validators;

pub use base::{
    is_identifier,
    sanitize_function_name,
    DefaultNodeCreator,
    NodeCreator,
    NodeDecorator,
    NodeExpander,
    NodeResolver,
    OutputSpec,
    VARIANT_MARKER
};
pub use does::Does;
pub use extract::{ExtractColumns, ExtractFields};
pub use model::WrapModel;
pub use parametrized::{ParameterizedInputs, Parametrized, ParametrizedInput, OUTPUT_NAME_KWARG};
pub use resolve::{Condition, ConfigWhen};
pub use tags::{Tag, RESERVED_TAG_NAMESPACE};
