//! Graph Assembly
//!
//! A [`Declaration`] is a function definition together with the modifiers
//! attached to it. Resolving a declaration against a [`Config`] runs the
//! fixed modifier pipeline:
//!
//! 1. validate every attached modifier against the declared function
//! 2. resolve: drop the declaration or rename it for this configuration
//! 3. create the base node (default creator if none is attached)
//! 4. expand, each expander applied to every node of the previous one
//! 5. decorate every resulting node
//!
//! The [`GraphAssembler`] collects declarations and produces a [`NodeSet`],
//! enforcing that node names are unique and that at most one configuration
//! variant of each logical name is active.
//!
//! # Example
//!
//! ```
//! use dagwright::graph::{Config, DataType, Declaration, FunctionDef, GraphAssembler};
//! use dagwright::modifiers::{ConfigWhen, Tag};
//!
//! let mut assembler = GraphAssembler::new();
//! assembler.add(
//!     Declaration::new(FunctionDef::new("signal__fast", DataType::Int))
//!         .when(ConfigWhen::when("mode", "fast"))
//!         .decorate(Tag::new([("owner", "quant")])),
//! );
//! assembler.add(
//!     Declaration::new(FunctionDef::new("signal__slow", DataType::Int))
//!         .when(ConfigWhen::when("mode", "slow")),
//! );
//!
//! let nodes = assembler.assemble(&Config::new().with("mode", "fast")).unwrap();
//! assert_eq!(nodes.names(), vec!["signal"]);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::modifiers::{
    DefaultNodeCreator, NodeCreator, NodeDecorator, NodeExpander, NodeResolver,
};

use super::config::Config;
use super::node::Node;
use super::signature::FunctionDef;

/// A function definition with its attached modifiers.
#[derive(Clone)]
pub struct Declaration {
    function: FunctionDef,
    resolvers: Vec<Arc<dyn NodeResolver>>,
    creators: Vec<Arc<dyn NodeCreator>>,
    expanders: Vec<Arc<dyn NodeExpander>>,
    decorators: Vec<Arc<dyn NodeDecorator>>,
}

impl Declaration {
    pub fn new(function: FunctionDef) -> Self {
        Self {
            function,
            resolvers: Vec::new(),
            creators: Vec::new(),
            expanders: Vec::new(),
            decorators: Vec::new(),
        }
    }

    /// Attaches a resolver. Several resolvers apply in order, each to the
    /// function returned by the previous one.
    pub fn when(mut self, resolver: impl NodeResolver + 'static) -> Self {
        self.resolvers.push(Arc::new(resolver));
        self
    }

    /// Attaches the node creator. At most one may be attached.
    pub fn creator(mut self, creator: impl NodeCreator + 'static) -> Self {
        self.creators.push(Arc::new(creator));
        self
    }

    /// Attaches an expander; expanders chain in attachment order.
    pub fn expand(mut self, expander: impl NodeExpander + 'static) -> Self {
        self.expanders.push(Arc::new(expander));
        self
    }

    pub fn decorate(mut self, decorator: impl NodeDecorator + 'static) -> Self {
        self.decorators.push(Arc::new(decorator));
        self
    }

    pub fn function(&self) -> &FunctionDef {
        &self.function
    }

    /// True if the declaration only exists under some configurations.
    pub fn is_conditional(&self) -> bool {
        !self.resolvers.is_empty()
    }

    /// Checks every attached modifier against the declared function.
    ///
    /// Expanders after the first are checked later, against the nodes the
    /// previous expander produces.
    pub fn validate(&self) -> Result<()> {
        if self.creators.len() > 1 {
            return Err(Error::invalid(format!(
                "'{}' has {} node creators attached; at most one is allowed",
                self.function.name(),
                self.creators.len()
            )));
        }

        for resolver in &self.resolvers {
            resolver.validate(&self.function)?;
        }
        for creator in &self.creators {
            creator.validate(&self.function)?;
        }
        if let Some(expander) = self.expanders.first() {
            expander.validate(&self.function)?;
        }
        for decorator in &self.decorators {
            decorator.validate(&self.function)?;
        }
        Ok(())
    }

    /// Name the declaration's nodes are built under whenever it resolves.
    pub fn logical_name(&self) -> String {
        self.resolvers
            .iter()
            .fold(self.function.name().to_string(), |name, resolver| {
                resolver.logical_name(&self.function.renamed(name))
            })
    }

    /// Applies the resolvers. `None` means the declaration contributes
    /// nothing under `config`.
    pub fn resolve(&self, config: &Config) -> Option<FunctionDef> {
        self.resolvers
            .iter()
            .try_fold(self.function.clone(), |function, resolver| {
                resolver.resolve(&function, config)
            })
    }

    /// Runs the full pipeline, returning the nodes this declaration
    /// contributes (possibly none).
    pub fn resolve_nodes(&self, config: &Config) -> Result<Vec<Node>> {
        self.validate()?;
        match self.resolve(config) {
            Some(function) => self.build_nodes(&function, config),
            None => {
                debug!("'{}' is inactive for this configuration", self.function.name());
                Ok(Vec::new())
            }
        }
    }

    fn build_nodes(&self, function: &FunctionDef, config: &Config) -> Result<Vec<Node>> {
        // Create
        let base = match self.creators.first() {
            Some(creator) => creator.generate_node(function, config)?,
            None => DefaultNodeCreator.generate_node(function, config)?,
        };

        // Expand, later stages checked against each node they receive
        let mut nodes = vec![base];
        for (stage, expander) in self.expanders.iter().enumerate() {
            let mut expanded = Vec::new();
            for node in &nodes {
                if stage == 0 {
                    expanded.extend(expander.expand_node(node, config, function)?);
                } else {
                    let view = FunctionDef::from_node(node);
                    expander.validate(&view)?;
                    expanded.extend(expander.expand_node(node, config, &view)?);
                }
            }
            debug!(
                "Expansion stage {} of '{}' produced {} node(s)",
                stage + 1,
                function.name(),
                expanded.len()
            );
            nodes = expanded;
        }

        // Names must stay unique within one declaration
        {
            let mut seen = HashSet::new();
            for node in &nodes {
                if !seen.insert(node.name()) {
                    return Err(Error::DuplicateNode(node.name().to_string()));
                }
            }
        }

        // Decorate
        Ok(nodes
            .into_iter()
            .map(|node| {
                self.decorators
                    .iter()
                    .fold(node, |node, decorator| decorator.decorate_node(node))
            })
            .collect())
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declaration")
            .field("function", &self.function.name())
            .field("resolvers", &self.resolvers.len())
            .field("creators", &self.creators.len())
            .field("expanders", &self.expanders.len())
            .field("decorators", &self.decorators.len())
            .finish()
    }
}

/// Collects declarations and turns them into a node set.
#[derive(Debug, Clone, Default)]
pub struct GraphAssembler {
    declarations: Vec<Declaration>,
}

impl GraphAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, declaration: Declaration) -> &mut Self {
        self.declarations.push(declaration);
        self
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Resolves every declaration under `config`.
    ///
    /// Fails on the first invalid declaration, if two active variants share
    /// a logical name, or if two nodes share a name.
    pub fn assemble(&self, config: &Config) -> Result<NodeSet> {
        info!(
            "Assembling graph from {} declarations ({} config keys)",
            self.declarations.len(),
            config.len()
        );

        // logical name -> declared names of the variants that matched
        let mut active: BTreeMap<String, Vec<String>> = BTreeMap::new();
        // logical names with at least one matching conditional variant
        let mut conditional: BTreeSet<String> = BTreeSet::new();
        // logical names of conditional variants that did not match
        let mut inactive: BTreeSet<String> = BTreeSet::new();
        let mut resolved = Vec::new();

        for declaration in &self.declarations {
            declaration.validate()?;
            let declared = declaration.function().name();

            match declaration.resolve(config) {
                Some(function) => {
                    if declaration.is_conditional() {
                        conditional.insert(function.name().to_string());
                    }
                    active
                        .entry(function.name().to_string())
                        .or_default()
                        .push(declared.to_string());
                    resolved.push((declaration, function));
                }
                None => {
                    debug!("Skipping '{}' for this configuration", declared);
                    inactive.insert(declaration.logical_name());
                }
            }
        }

        // At most one active variant per logical name
        for (name, candidates) in &active {
            if candidates.len() > 1 && conditional.contains(name) {
                return Err(Error::AmbiguousVariant {
                    name: name.clone(),
                    candidates: candidates.clone(),
                });
            }
        }
        for name in inactive.iter().filter(|name| !active.contains_key(*name)) {
            warn!("No variant of '{}' matches the configuration", name);
        }

        // Build and index every node
        let mut nodes = NodeSet::default();
        for (declaration, function) in resolved {
            for node in declaration.build_nodes(&function, config)? {
                debug!(
                    "Emitting node '{}' ({}) depending on {:?}",
                    node.name(),
                    node.node_type(),
                    node.dependencies()
                );
                nodes.insert(node)?;
            }
        }

        info!("Assembled {} nodes", nodes.len());
        Ok(nodes)
    }
}

/// Nodes produced by assembly, in emission order, addressable by name.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

impl NodeSet {
    fn insert(&mut self, node: Node) -> Result<()> {
        if self.index.contains_key(node.name()) {
            return Err(Error::DuplicateNode(node.name().to_string()));
        }
        self.index.insert(node.name().to_string(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name()).collect()
    }

    /// Dependencies no node in the set produces, sorted. The engine must be
    /// given these as inputs.
    pub fn external_inputs(&self) -> Vec<String> {
        let external: BTreeSet<&str> = self
            .nodes
            .iter()
            .flat_map(|n| n.dependencies())
            .filter(|dep| !self.contains(dep))
            .collect();
        external.into_iter().map(str::to_string).collect()
    }

    pub fn into_vec(self) -> Vec<Node> {
        self.nodes
    }
}

impl IntoIterator for NodeSet {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DataType, Kwargs, Table, Value};
    use crate::modifiers::{
        ConfigWhen, Does, ExtractColumns, OutputSpec, Parametrized, Tag,
    };

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|v| Value::Int(*v)).collect()
    }

    fn prices() -> FunctionDef {
        FunctionDef::new("prices", DataType::Table)
            .doc("Raw prices.")
            .module("pipelines.prices")
            .param("raw", DataType::Table)
            .implemented_by(|kwargs| Ok(kwargs["raw"].clone()))
    }

    #[test]
    fn test_extract_columns_end_to_end() {
        init_logger();
        let mut assembler = GraphAssembler::new();
        assembler.add(
            Declaration::new(prices())
                .expand(
                    ExtractColumns::new(vec![OutputSpec::from("open"), OutputSpec::from("close")])
                        .unwrap(),
                )
                .decorate(Tag::new([("owner", "markets")])),
        );
        assembler.add(
            Declaration::new(FunctionDef::new("volume", DataType::Table).implemented_by(|_| {
                Ok(Value::Table(Table::new().with_column("open", ints(&[5, 6]))))
            }))
            .expand(ExtractColumns::new(vec!["shares"]).unwrap().fill_with(0)),
        );

        let nodes = assembler.assemble(&Config::new()).unwrap();
        assert_eq!(
            nodes.names(),
            vec!["prices", "open", "close", "volume", "shares"]
        );
        assert_eq!(nodes.external_inputs(), vec!["raw"]);
        assert_eq!(
            nodes.get("close").unwrap().tags().get("owner"),
            Some(&Value::from("markets"))
        );
        assert_eq!(
            nodes.get("close").unwrap().tags().get("module"),
            Some(&Value::from("pipelines.prices"))
        );

        let raw = Value::Table(Table::new().with_column("open", ints(&[1, 2])));
        let table = nodes
            .get("prices")
            .unwrap()
            .invoke(&Kwargs::from([("raw".to_string(), raw)]))
            .unwrap();
        let args = Kwargs::from([("prices".to_string(), table)]);
        assert_eq!(
            nodes.get("open").unwrap().invoke(&args).unwrap(),
            Value::Series(ints(&[1, 2]))
        );
        assert!(matches!(
            nodes.get("close").unwrap().call(&args),
            Err(Error::MissingColumn { .. })
        ));

        let volume = nodes.get("volume").unwrap().invoke(&Kwargs::new()).unwrap();
        let filled = nodes
            .get("shares")
            .unwrap()
            .call(&Kwargs::from([("volume".to_string(), volume)]))
            .unwrap();
        assert_eq!(filled.value, Value::Series(ints(&[0, 0])));
        let backfilled = filled.updated_inputs["volume"].as_table().unwrap();
        assert!(backfilled.contains_column("shares"));
    }

    #[test]
    fn test_config_variants_select_one() {
        init_logger();
        let mut assembler = GraphAssembler::new();
        assembler
            .add(
                Declaration::new(
                    FunctionDef::new("rate__eu", DataType::Float)
                        .implemented_by(|_| Ok(Value::Float(0.2))),
                )
                .when(ConfigWhen::when("region", "eu")),
            )
            .add(
                Declaration::new(
                    FunctionDef::new("rate__us", DataType::Float)
                        .implemented_by(|_| Ok(Value::Float(0.1))),
                )
                .when(ConfigWhen::when("region", "us")),
            );

        let nodes = assembler.assemble(&Config::new().with("region", "us")).unwrap();
        assert_eq!(nodes.names(), vec!["rate"]);
        assert_eq!(
            nodes.get("rate").unwrap().invoke(&Kwargs::new()).unwrap(),
            Value::Float(0.1)
        );

        let none = assembler.assemble(&Config::new().with("region", "apac")).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_ambiguous_variants_abort() {
        init_logger();
        let mut assembler = GraphAssembler::new();
        assembler
            .add(
                Declaration::new(FunctionDef::new("rate__a", DataType::Float))
                    .when(ConfigWhen::when("region", "eu")),
            )
            .add(
                Declaration::new(FunctionDef::new("rate__b", DataType::Float))
                    .when(ConfigWhen::when_in("region", ["eu", "us"])),
            );

        match assembler.assemble(&Config::new().with("region", "eu")) {
            Err(Error::AmbiguousVariant { name, candidates }) => {
                assert_eq!(name, "rate");
                assert_eq!(candidates, vec!["rate__a", "rate__b"]);
            }
            other => panic!("expected ambiguous variant, got {:?}", other),
        }
        assert!(assembler.assemble(&Config::new().with("region", "us")).is_ok());
    }

    #[test]
    fn test_duplicate_node_names_abort() {
        init_logger();
        let mut assembler = GraphAssembler::new();
        assembler
            .add(Declaration::new(FunctionDef::new("a", DataType::Int)))
            .add(
                Declaration::new(FunctionDef::new("b", DataType::Int).param("p", DataType::Int))
                    .expand(Parametrized::new("p", vec![(("a", "collides"), 1)]).unwrap()),
            );

        assert!(matches!(
            assembler.assemble(&Config::new()),
            Err(Error::DuplicateNode(name)) if name == "a"
        ));
    }

    #[test]
    fn test_invalid_declaration_aborts() {
        init_logger();
        let implementation = FunctionDef::new("impl", DataType::Int)
            .var_keyword("kwargs", DataType::Int)
            .implemented_by(|_| Ok(Value::Int(0)));
        let declaration = Declaration::new(
            FunctionDef::new("implemented", DataType::Int).implemented_by(|_| Ok(Value::Int(1))),
        )
        .creator(Does::new(implementation));

        assert!(matches!(
            declaration.resolve_nodes(&Config::new()),
            Err(Error::InvalidModifier(_))
        ));
    }

    #[test]
    fn test_multiple_creators_rejected() {
        let implementation = FunctionDef::new("impl", DataType::Int)
            .var_keyword("kwargs", DataType::Int)
            .implemented_by(|_| Ok(Value::Int(0)));
        let declaration = Declaration::new(FunctionDef::new("spec", DataType::Int))
            .creator(Does::new(implementation.clone()))
            .creator(Does::new(implementation));

        assert!(matches!(declaration.validate(), Err(Error::InvalidModifier(_))));
    }

    #[test]
    fn test_chained_expanders_validate_against_nodes() {
        init_logger();
        let scaled = FunctionDef::new("scaled", DataType::Table)
            .param("factor", DataType::Int)
            .implemented_by(|kwargs| {
                let factor = kwargs["factor"].as_f64().unwrap_or(1.0) as i64;
                Ok(Value::Table(
                    Table::new().with_column("x", vec![Value::Int(factor)]),
                ))
            });

        let declaration = Declaration::new(scaled)
            .expand(Parametrized::new("factor", vec![(("triple", "x3"), 3)]).unwrap())
            .expand(ExtractColumns::new(vec!["x"]).unwrap());

        let nodes = declaration.resolve_nodes(&Config::new()).unwrap();
        let names: Vec<_> = nodes.iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["triple", "x"]);
        assert_eq!(nodes[1].input_types().keys().collect::<Vec<_>>(), vec!["triple"]);

        let tripled = nodes[0].invoke(&Kwargs::new()).unwrap();
        assert_eq!(
            nodes[1]
                .invoke(&Kwargs::from([("triple".to_string(), tripled)]))
                .unwrap(),
            Value::Series(vec![Value::Int(3)])
        );

        let rejected = Declaration::new(
            FunctionDef::new("count", DataType::Int).param("n", DataType::Int),
        )
        .expand(Parametrized::new("n", vec![(("one", "1"), 1)]).unwrap())
        .expand(ExtractColumns::new(vec!["x"]).unwrap());
        assert!(matches!(
            rejected.resolve_nodes(&Config::new()),
            Err(Error::InvalidModifier(_))
        ));
    }

    #[test]
    fn test_declaration_rejects_repeated_names() {
        init_logger();
        let scaled = FunctionDef::new("scaled", DataType::Table)
            .param("factor", DataType::Int)
            .implemented_by(|_| Ok(Value::Table(Table::new())));

        // both parametrized nodes would emit a column named "x"
        let declaration = Declaration::new(scaled)
            .expand(
                Parametrized::new(
                    "factor",
                    vec![(("double", "x2"), 2), (("triple", "x3"), 3)],
                )
                .unwrap(),
            )
            .expand(ExtractColumns::new(vec!["x"]).unwrap());

        assert!(matches!(
            declaration.resolve_nodes(&Config::new()),
            Err(Error::DuplicateNode(name)) if name == "x"
        ));
    }

    #[test]
    fn test_ambiguous_variants_with_override_names() {
        init_logger();
        let mut assembler = GraphAssembler::new();
        assembler
            .add(
                Declaration::new(FunctionDef::new("rate_eu", DataType::Float))
                    .when(ConfigWhen::when("r", "eu").with_name("rate")),
            )
            .add(
                Declaration::new(FunctionDef::new("rate_any", DataType::Float))
                    .when(ConfigWhen::when_in("r", ["eu", "us"]).with_name("rate")),
            );

        match assembler.assemble(&Config::new().with("r", "eu")) {
            Err(Error::AmbiguousVariant { name, candidates }) => {
                assert_eq!(name, "rate");
                assert_eq!(candidates, vec!["rate_eu", "rate_any"]);
            }
            other => panic!("expected ambiguous variant, got {:?}", other),
        }

        let nodes = assembler.assemble(&Config::new().with("r", "us")).unwrap();
        assert_eq!(nodes.names(), vec!["rate"]);
    }

    #[test]
    fn test_logical_name_follows_resolvers() {
        let plain = Declaration::new(FunctionDef::new("rate__eu", DataType::Float));
        assert_eq!(plain.logical_name(), "rate__eu");

        let sanitized = plain.clone().when(ConfigWhen::when("r", "eu"));
        assert_eq!(sanitized.logical_name(), "rate");

        let overridden = plain.when(ConfigWhen::when("r", "eu").with_name("eu_rate"));
        assert_eq!(overridden.logical_name(), "eu_rate");
    }

    #[test]
    fn test_node_set_lookup() {
        let mut assembler = GraphAssembler::new();
        assembler.add(Declaration::new(
            FunctionDef::new("a", DataType::Int).param("input", DataType::Int),
        ));
        let nodes = assembler.assemble(&Config::new()).unwrap();

        assert!(nodes.contains("a"));
        assert!(nodes.get("missing").is_none());
        assert_eq!(nodes.external_inputs(), vec!["input"]);
        assert_eq!(nodes.into_vec().len(), 1);
    }
}
