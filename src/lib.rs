//! dagwright - Declarative Dataflow Node Construction
//!
//! Turns plain function declarations into the nodes of a dataflow graph.
//! Functions are described explicitly (name, parameters, return type,
//! docstring, body) and modifiers attached to them decide how many nodes
//! each function contributes, what those nodes depend on, and how they
//! compute their values. Executing the graph is left to a separate engine.
//!
//! # Architecture
//!
//! The library is organized into three main modules:
//!
//! - [`graph`]: Values, types, function declarations, nodes and assembly
//! - [`modifiers`]: Resolvers, creators, expanders and decorators
//! - [`models`]: Configured models that can back a node
//!
//! # Example
//!
//! ```rust
//! use dagwright::graph::{Config, DataType, Declaration, FunctionDef, GraphAssembler};
//! use dagwright::modifiers::{ExtractColumns, OutputSpec, Tag};
//!
//! fn main() -> Result<(), dagwright::Error> {
//!     let prices = FunctionDef::new("prices", DataType::Table)
//!         .doc("Daily prices.")
//!         .param("raw_prices", DataType::Table);
//!
//!     let mut assembler = GraphAssembler::new();
//!     assembler.add(
//!         Declaration::new(prices)
//!             .expand(ExtractColumns::new(vec![
//!                 OutputSpec::from("open"),
//!                 OutputSpec::from(("close", "Closing price.")),
//!             ])?)
//!             .decorate(Tag::new([("owner", "markets")])),
//!     );
//!
//!     let nodes = assembler.assemble(&Config::new())?;
//!     assert_eq!(nodes.names(), vec!["prices", "open", "close"]);
//!     assert_eq!(nodes.external_inputs(), vec!["raw_prices"]);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod graph;
pub mod models;
pub mod modifiers;

// Re-export commonly used types
pub use error::{Error, Result};
pub use graph::{Config, DataType, Declaration, FunctionDef, GraphAssembler, Node, NodeSet, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name, also the reserved tag namespace
pub const APP_NAME: &str = "dagwright";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_matches_package() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert_eq!(APP_NAME, env!("CARGO_PKG_NAME"));
    }

    #[test]
    fn test_app_name_is_reserved_namespace() {
        assert_eq!(APP_NAME, modifiers::RESERVED_TAG_NAMESPACE);
    }

    #[test]
    fn test_module_exports_function_def() {
        let f = FunctionDef::new("test", DataType::Int);
        assert_eq!(f.name(), "test");
        assert!(f.is_placeholder());
    }

    #[test]
    fn test_module_exports_config() {
        let config = Config::new().with("key", "value");
        assert_eq!(config.get("key"), Some(&Value::from("value")));
    }
}
