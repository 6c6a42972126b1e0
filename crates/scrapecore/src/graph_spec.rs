//! Declarative graph description exchanged with graph-building tools.
//!
//! ```json
//! {
//!   "nodes": [{"node_name": "fetch", "node_type": "node", "args": {"input": "url"}, "returns": {}}],
//!   "edges": [{"from": "fetch", "to": "parse"}],
//!   "entry_point": "fetch"
//! }
//! ```

use crate::{GraphError, NodeError, NodeKind, NodeSpec, Value};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Arg keys with a fixed meaning; everything else is step config.
pub const RESERVED_ARGS: [&str; 4] = ["step", "input", "output", "min_inputs"];

/// Complete graph description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSpec {
    pub nodes: Vec<NodeEntry>,
    pub edges: Vec<EdgeEntry>,
    pub entry_point: String,
}

/// Node entry in a graph description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub node_name: String,
    pub node_type: NodeKind,
    #[serde(default)]
    pub args: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub returns: serde_json::Value,
}

/// Directed edge; conditional sources name both branch targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeEntry {
    pub from: String,
    pub to: EdgeTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EdgeTarget {
    One(String),
    Branch(Vec<String>),
}

impl EdgeTarget {
    pub fn names(&self) -> Vec<&str> {
        match self {
            EdgeTarget::One(name) => vec![name.as_str()],
            EdgeTarget::Branch(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

impl GraphSpec {
    pub fn new(entry_point: impl Into<String>) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            entry_point: entry_point.into(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn add_node(&mut self, node: NodeEntry) -> &mut Self {
        self.nodes.push(node);
        self
    }

    pub fn connect(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.push(EdgeEntry {
            from: from.into(),
            to: EdgeTarget::One(to.into()),
        });
        self
    }

    pub fn branch(
        &mut self,
        from: impl Into<String>,
        on_true: impl Into<String>,
        on_false: impl Into<String>,
    ) -> &mut Self {
        self.edges.push(EdgeEntry {
            from: from.into(),
            to: EdgeTarget::Branch(vec![on_true.into(), on_false.into()]),
        });
        self
    }

    pub fn find_node(&self, name: &str) -> Option<&NodeEntry> {
        self.nodes.iter().find(|n| n.node_name == name)
    }

    /// Branch targets declared for a conditional node.
    pub fn branches_of(&self, name: &str) -> Option<[String; 2]> {
        self.edges
            .iter()
            .find(|e| e.from == name)
            .and_then(|e| match &e.to {
                EdgeTarget::Branch(names) if names.len() == 2 => {
                    Some([names[0].clone(), names[1].clone()])
                }
                _ => None,
            })
    }

    /// Check names, edge shapes and the entry point.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut kinds: HashMap<&str, NodeKind> = HashMap::new();
        for node in &self.nodes {
            if kinds.insert(node.node_name.as_str(), node.node_type).is_some() {
                return Err(GraphError::DuplicateNode(node.node_name.clone()));
            }
        }

        if !kinds.contains_key(self.entry_point.as_str()) {
            return Err(GraphError::NodeNotFound(self.entry_point.clone()));
        }

        let mut sources: HashSet<&str> = HashSet::new();
        for edge in &self.edges {
            let kind = kinds
                .get(edge.from.as_str())
                .copied()
                .ok_or_else(|| GraphError::NodeNotFound(edge.from.clone()))?;

            if !sources.insert(edge.from.as_str()) {
                return Err(GraphError::DuplicateEdge(edge.from.clone()));
            }

            for target in edge.to.names() {
                if !kinds.contains_key(target) {
                    return Err(GraphError::NodeNotFound(target.to_string()));
                }
            }

            match (kind, &edge.to) {
                (NodeKind::Conditional, EdgeTarget::Branch(names)) if names.len() == 2 => {}
                (NodeKind::Conditional, _) => {
                    return Err(GraphError::InvalidConnection(format!(
                        "conditional node '{}' needs exactly two targets",
                        edge.from
                    )));
                }
                (NodeKind::Standard, EdgeTarget::Branch(_)) => {
                    return Err(GraphError::InvalidConnection(format!(
                        "node '{}' is not conditional and cannot branch",
                        edge.from
                    )));
                }
                (NodeKind::Standard, EdgeTarget::One(_)) => {}
            }
        }

        for node in &self.nodes {
            if node.node_type == NodeKind::Conditional && !sources.contains(node.node_name.as_str()) {
                return Err(GraphError::InvalidConnection(format!(
                    "conditional node '{}' has no branch targets",
                    node.node_name
                )));
            }
        }

        Ok(())
    }
}

impl NodeEntry {
    pub fn new(node_name: impl Into<String>, node_type: NodeKind, input: &str) -> Self {
        let mut args = serde_json::Map::new();
        args.insert("input".to_string(), serde_json::Value::from(input));
        Self {
            node_name: node_name.into(),
            node_type,
            args,
            returns: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_step(self, step: &str) -> Self {
        self.with_arg("step", step)
    }

    pub fn with_output<I, S>(self, output: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<serde_json::Value> = output
            .into_iter()
            .map(|k| serde_json::Value::String(k.into()))
            .collect();
        self.with_arg("output", keys)
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Registered step type; defaults to the node name.
    pub fn step_type(&self) -> &str {
        self.args
            .get("step")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(&self.node_name)
    }

    /// Build the runtime node description from `args`.
    pub fn to_node_spec(&self) -> Result<NodeSpec, NodeError> {
        let input = self
            .args
            .get("input")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                NodeError::Configuration(format!("{}: args.input must be a string", self.node_name))
            })?;

        let output: Vec<String> = match self.args.get("output") {
            None => Vec::new(),
            Some(serde_json::Value::Array(keys)) => keys
                .iter()
                .map(|k| {
                    k.as_str().map(str::to_string).ok_or_else(|| {
                        NodeError::Configuration(format!(
                            "{}: args.output must be a list of strings",
                            self.node_name
                        ))
                    })
                })
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(NodeError::Configuration(format!(
                    "{}: args.output must be a list of strings",
                    self.node_name
                )))
            }
        };

        let mut spec = NodeSpec::new(self.node_name.clone(), input, output)?;
        if let Some(min) = self.args.get("min_inputs").and_then(serde_json::Value::as_u64) {
            spec = spec.with_min_inputs(min as usize);
        }
        for (key, value) in &self.args {
            if !RESERVED_ARGS.contains(&key.as_str()) {
                spec.config.insert(key.clone(), Value::from_json(value.clone()));
            }
        }
        Ok(spec)
    }
}
