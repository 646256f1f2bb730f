//! Graph Model
//!
//! Data structures shared by every modifier and by the execution engine
//! that consumes their output.
//!
//! # Structure
//!
//! - [`value`]: Runtime values and tables
//! - [`types`]: Declared data types and dependency kinds
//! - [`signature`]: Function declarations
//! - [`node`]: Graph nodes
//! - [`config`]: Assembly configuration
//! - [`assembler`]: Turning declarations into a node set

pub mod assembler;
pub mod config;
pub mod node;
pub mod signature;
pub mod types;
pub mod value;

pub use assembler::{Declaration, GraphAssembler, NodeSet};
pub use config::Config;
pub use node::{Callable, InputTypes, Node, NodeOutput, Tags, MODULE_TAG};
pub use signature::{Body, FunctionDef, Implementation, ParamKind, Parameter, Signature};
pub use types::{DataType, DependencyType};
pub use value::{Kwargs, Table, Value};
