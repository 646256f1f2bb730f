//! Parametrization Expanders
//!
//! Three ways to turn one function into several sibling nodes:
//!
//! - [`Parametrized`]: bind one parameter to a different literal per output
//! - [`ParametrizedInput`]: read one parameter from a different upstream
//!   node per output
//! - [`ParameterizedInputs`]: remap several parameters per output, with
//!   per-output docstrings rendered from the function's docstring template
//!
//! Parameters that are not bound or remapped stay shared dependencies of
//! every sibling.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use log::debug;

use crate::error::{Error, Result};
use crate::graph::{Callable, Config, FunctionDef, InputTypes, Kwargs, Node, NodeOutput, Value};

use super::base::{NodeExpander, OutputSpec};
use super::template;

/// Reserved parameter name. Docstring templates may reference
/// `{output_name}` to receive the emitted node's own name, so functions may
/// not declare a parameter with this name.
pub const OUTPUT_NAME_KWARG: &str = "output_name";

/// Binds `parameter` to a literal value, once per output.
///
/// # Example
/// ```
/// use dagwright::modifiers::Parametrized;
///
/// let annotation = Parametrized::new(
///     "parameter",
///     vec![(("node_name_1", "doc1"), "value_1"), (("node_name_2", "doc2"), "value_2")],
/// )
/// .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Parametrized {
    parameter: String,
    assigned_output: Vec<(String, String, Value)>,
}

impl Parametrized {
    /// Every output key must be a `(name, doc)` pair; a bare name does not
    /// say what the node documents and is rejected.
    pub fn new<K, V>(
        parameter: impl Into<String>,
        assigned_output: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self>
    where
        K: Into<OutputSpec>,
        V: Into<Value>,
    {
        let parameter = parameter.into();
        let mut outputs = Vec::new();
        let mut seen = HashSet::new();

        for (key, value) in assigned_output {
            let (name, doc) = match key.into() {
                OutputSpec::Documented { name, doc } => (name, doc),
                other => {
                    return Err(Error::invalid(format!(
                        "assigned_output key {:?} for parameter '{}' must be a (name, doc) pair",
                        other, parameter
                    )));
                }
            };
            if !seen.insert(name.clone()) {
                return Err(Error::invalid(format!(
                    "assigned_output names '{}' more than once",
                    name
                )));
            }
            outputs.push((name, doc, value.into()));
        }

        if outputs.is_empty() {
            return Err(Error::invalid(format!(
                "parametrizing '{}' requires at least one output",
                parameter
            )));
        }

        Ok(Self {
            parameter,
            assigned_output: outputs,
        })
    }
}

impl NodeExpander for Parametrized {
    fn validate(&self, function: &FunctionDef) -> Result<()> {
        ensure_parameter_exists(function, &self.parameter)
    }

    fn expand_node(
        &self,
        node: &Node,
        _config: &Config,
        _function: &FunctionDef,
    ) -> Result<Vec<Node>> {
        let mut input_types = node.input_types().clone();
        input_types.remove(&self.parameter);

        let nodes = self
            .assigned_output
            .iter()
            .map(|(name, doc, value)| {
                let base = node.clone();
                let parameter = self.parameter.clone();
                let value = value.clone();

                let callable: Callable = Arc::new(move |kwargs: &Kwargs| {
                    let mut args = kwargs.clone();
                    args.insert(parameter.clone(), value.clone());
                    base.call(&args)
                });

                debug!("Parametrized '{}' -> '{}'", node.name(), name);
                Node::new(name.clone(), node.node_type().clone(), doc.clone(), callable)
                    .with_input_types(input_types.clone())
                    .with_tags(node.tags().clone())
            })
            .collect();

        Ok(nodes)
    }
}

/// Rewires `parameter` to a different upstream node, once per output.
///
/// Each entry maps an upstream node name to the `(name, doc)` of the node
/// reading from it.
#[derive(Debug, Clone)]
pub struct ParametrizedInput {
    parameter: String,
    variable_inputs: Vec<(String, String, String)>,
}

impl ParametrizedInput {
    pub fn new<U, N, D>(
        parameter: impl Into<String>,
        variable_inputs: impl IntoIterator<Item = (U, (N, D))>,
    ) -> Result<Self>
    where
        U: Into<String>,
        N: Into<String>,
        D: Into<String>,
    {
        let parameter = parameter.into();
        let variable_inputs: Vec<_> = variable_inputs
            .into_iter()
            .map(|(upstream, (name, doc))| (upstream.into(), name.into(), doc.into()))
            .collect();

        if variable_inputs.is_empty() {
            return Err(Error::invalid(format!(
                "parametrizing input '{}' requires at least one upstream",
                parameter
            )));
        }

        Ok(Self {
            parameter,
            variable_inputs,
        })
    }
}

impl NodeExpander for ParametrizedInput {
    fn validate(&self, function: &FunctionDef) -> Result<()> {
        ensure_parameter_exists(function, &self.parameter)
    }

    fn expand_node(
        &self,
        node: &Node,
        _config: &Config,
        _function: &FunctionDef,
    ) -> Result<Vec<Node>> {
        Ok(self
            .variable_inputs
            .iter()
            .map(|(upstream, name, doc)| {
                let mapping = BTreeMap::from([(self.parameter.clone(), upstream.clone())]);
                remap_node(node, name, doc, mapping)
            })
            .collect())
    }
}

/// Remaps several parameters to upstream nodes, once per output.
///
/// The function's docstring is a template: `{param}` placeholders render to
/// that output's upstream name and `{output_name}` to the output itself.
///
/// # Example
/// ```
/// use dagwright::modifiers::ParameterizedInputs;
///
/// let annotation = ParameterizedInputs::new(vec![
///     ("test_1", vec![("parameter1", "input_1"), ("parameter2", "input_2")]),
///     ("test_2", vec![("parameter1", "input_2"), ("parameter2", "input_1")]),
/// ])
/// .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ParameterizedInputs {
    parametrization: Vec<(String, BTreeMap<String, String>)>,
}

impl ParameterizedInputs {
    pub fn new<O, M, P, U>(parametrization: impl IntoIterator<Item = (O, M)>) -> Result<Self>
    where
        O: Into<String>,
        M: IntoIterator<Item = (P, U)>,
        P: Into<String>,
        U: Into<String>,
    {
        let mut outputs = Vec::new();
        let mut seen = HashSet::new();

        for (output, mapping) in parametrization {
            let output = output.into();
            let mapping: BTreeMap<String, String> = mapping
                .into_iter()
                .map(|(param, upstream)| (param.into(), upstream.into()))
                .collect();

            if mapping.is_empty() {
                return Err(Error::invalid(format!(
                    "output '{}' has an empty mapping",
                    output
                )));
            }
            if !seen.insert(output.clone()) {
                return Err(Error::invalid(format!(
                    "output '{}' is parameterized more than once",
                    output
                )));
            }
            outputs.push((output, mapping));
        }

        if outputs.is_empty() {
            return Err(Error::invalid(
                "parameterized inputs require at least one output",
            ));
        }

        Ok(Self {
            parametrization: outputs,
        })
    }

    fn format_doc(&self, doc: &str, output: &str, mapping: &BTreeMap<String, String>) -> Result<String> {
        let mut values = mapping.clone();
        values.insert(OUTPUT_NAME_KWARG.to_string(), output.to_string());
        template::render(doc, &values)
    }
}

impl NodeExpander for ParameterizedInputs {
    fn validate(&self, function: &FunctionDef) -> Result<()> {
        if function.has_parameter(OUTPUT_NAME_KWARG) {
            return Err(Error::invalid(format!(
                "function '{}' cannot declare '{}' as a parameter; it is reserved",
                function.name(),
                OUTPUT_NAME_KWARG
            )));
        }

        let mut missing = Vec::new();
        for (output, mapping) in &self.parametrization {
            for (param, upstream) in mapping {
                if param == OUTPUT_NAME_KWARG || upstream == OUTPUT_NAME_KWARG {
                    return Err(Error::invalid(format!(
                        "output '{}' remaps the reserved name '{}'",
                        output, OUTPUT_NAME_KWARG
                    )));
                }
                if !function.has_parameter(param) && !missing.contains(param) {
                    missing.push(param.clone());
                }
            }
        }
        if !missing.is_empty() {
            return Err(Error::invalid(format!(
                "parameters {:?} are not declared by '{}'",
                missing,
                function.name()
            )));
        }

        // Every docstring placeholder must be satisfiable for every output
        let placeholders = template::placeholder_names(function.docstring());
        for (output, mapping) in &self.parametrization {
            let unmatched: Vec<&str> = placeholders
                .iter()
                .map(String::as_str)
                .filter(|name| *name != OUTPUT_NAME_KWARG && !mapping.contains_key(*name))
                .collect();
            if !unmatched.is_empty() {
                return Err(Error::invalid(format!(
                    "docstring of '{}' references {:?}, which output '{}' does not remap",
                    function.name(),
                    unmatched,
                    output
                )));
            }

            self.format_doc(function.docstring(), output, mapping)
                .map_err(|e| {
                    Error::invalid(format!(
                        "docstring of '{}' cannot be templated for output '{}': {}",
                        function.name(),
                        output,
                        e
                    ))
                })?;
        }

        Ok(())
    }

    fn expand_node(
        &self,
        node: &Node,
        _config: &Config,
        function: &FunctionDef,
    ) -> Result<Vec<Node>> {
        self.parametrization
            .iter()
            .map(|(output, mapping)| {
                let doc = self.format_doc(function.docstring(), output, mapping)?;
                Ok(remap_node(node, output, &doc, mapping.clone()))
            })
            .collect()
    }
}

fn ensure_parameter_exists(function: &FunctionDef, parameter: &str) -> Result<()> {
    if !function.has_parameter(parameter) {
        return Err(Error::invalid(format!(
            "parameter '{}' is not declared by '{}'",
            parameter,
            function.name()
        )));
    }
    Ok(())
}

/// Builds a sibling of `node` whose parameters in `mapping` are read from
/// other upstream nodes.
fn remap_node(node: &Node, name: &str, doc: &str, mapping: BTreeMap<String, String>) -> Node {
    // Rename remapped inputs to their upstream names
    let input_types: InputTypes = node
        .input_types()
        .iter()
        .map(|(param, ty)| {
            let key = mapping.get(param).unwrap_or(param).clone();
            (key, ty.clone())
        })
        .collect();

    let base = node.clone();
    let callable: Callable = Arc::new(move |kwargs: &Kwargs| {
        // Keep shared inputs, drop upstream-only values
        let base_inputs = base.input_types();
        let mut args: Kwargs = kwargs
            .iter()
            .filter(|(key, _)| {
                base_inputs.contains_key(key.as_str()) || !mapping.values().any(|u| u == *key)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        // Feed each parameter from its upstream
        for (param, upstream) in &mapping {
            match kwargs.get(upstream) {
                Some(value) => {
                    args.insert(param.clone(), value.clone());
                }
                None => {
                    args.remove(param);
                }
            }
        }

        // Report updated copies under the upstream names
        let output = base.call(&args)?;
        let updated_inputs = output
            .updated_inputs
            .into_iter()
            .map(|(key, value)| match mapping.get(&key) {
                Some(upstream) => (upstream.clone(), value),
                None => (key, value),
            })
            .collect();
        Ok(NodeOutput {
            value: output.value,
            updated_inputs,
        })
    });

    debug!("Remapped '{}' -> '{}' via {:?}", node.name(), name, node.dependencies());
    Node::new(name, node.node_type().clone(), doc, callable)
        .with_input_types(input_types)
        .with_tags(node.tags().clone())
}
