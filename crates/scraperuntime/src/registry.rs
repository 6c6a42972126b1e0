use crate::graph::Graph;
use scrapecore::{EdgeTarget, GraphError, GraphNode, GraphSpec, NodeError, NodeKind, NodeSpec};
use std::collections::HashMap;
use std::sync::Arc;

/// Factory trait for creating node instances
pub trait NodeFactory: Send + Sync {
    /// Create a node from its spec. `branches` is set only for conditional
    /// nodes and holds the (true, false) successor names.
    fn create(&self, spec: NodeSpec, branches: Option<[String; 2]>) -> Result<GraphNode, NodeError>;

    /// Get node type identifier
    fn node_type(&self) -> &str;

    fn kind(&self) -> NodeKind {
        NodeKind::Standard
    }

    /// Optional: Get node metadata (description, state keys, etc.)
    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::default()
    }
}

/// Metadata about a node type
#[derive(Debug, Clone)]
pub struct NodeMetadata {
    pub description: String,
    pub category: String,
    pub inputs: Vec<PortDefinition>,
    pub outputs: Vec<PortDefinition>,
}

impl Default for NodeMetadata {
    fn default() -> Self {
        Self {
            description: String::new(),
            category: "general".to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

/// A state key a step reads or writes
#[derive(Debug, Clone)]
pub struct PortDefinition {
    pub name: String,
    pub description: String,
    pub required: bool,
}

impl PortDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
        }
    }
}

/// Registry of available node types
pub struct NodeRegistry {
    factories: HashMap<String, Arc<dyn NodeFactory>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a node factory
    pub fn register(&mut self, factory: Arc<dyn NodeFactory>) {
        let node_type = factory.node_type().to_string();
        tracing::debug!("Registering node type: {}", node_type);
        self.factories.insert(node_type, factory);
    }

    /// Create a node instance from a node type and spec
    pub fn create_node(
        &self,
        node_type: &str,
        spec: NodeSpec,
        branches: Option<[String; 2]>,
    ) -> Result<GraphNode, GraphError> {
        let factory = self
            .factories
            .get(node_type)
            .ok_or_else(|| GraphError::UnknownNodeType(node_type.to_string()))?;

        let expected = if branches.is_some() {
            NodeKind::Conditional
        } else {
            NodeKind::Standard
        };
        if factory.kind() != expected {
            return Err(GraphError::Invalid(format!(
                "'{}' is declared as {} but step '{}' is {}",
                spec.name,
                expected,
                node_type,
                factory.kind()
            )));
        }

        let node = spec.name.clone();
        factory
            .create(spec, branches)
            .map_err(|source| GraphError::Node { node, source })
    }

    /// Validate a graph description and instantiate it
    pub fn build_graph(&self, spec: &GraphSpec) -> Result<Graph, GraphError> {
        spec.validate()?;

        let mut nodes = Vec::with_capacity(spec.nodes.len());
        for entry in &spec.nodes {
            let node_spec = entry.to_node_spec().map_err(|source| GraphError::Node {
                node: entry.node_name.clone(),
                source,
            })?;
            let branches = match entry.node_type {
                NodeKind::Conditional => spec.branches_of(&entry.node_name),
                NodeKind::Standard => None,
            };
            if entry.node_type == NodeKind::Conditional && branches.is_none() {
                return Err(GraphError::InvalidConnection(format!(
                    "conditional node '{}' has no branch targets",
                    entry.node_name
                )));
            }
            nodes.push(self.create_node(entry.step_type(), node_spec, branches)?);
        }

        let edges = spec.edges.iter().filter_map(|edge| match &edge.to {
            EdgeTarget::One(to) => Some((edge.from.clone(), to.clone())),
            EdgeTarget::Branch(_) => None,
        });

        Graph::new(nodes, edges, spec.entry_point.clone())
    }

    /// Get all registered node types, sorted
    pub fn list_node_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }

    /// Get metadata for a node type
    pub fn get_metadata(&self, node_type: &str) -> Option<NodeMetadata> {
        self.factories.get(node_type).map(|f| f.metadata())
    }

    pub fn get_kind(&self, node_type: &str) -> Option<NodeKind> {
        self.factories.get(node_type).map(|f| f.kind())
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
