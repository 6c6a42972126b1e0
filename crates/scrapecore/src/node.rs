use crate::{ExpressionError, InputExpression, NodeError, State, Usage, Value};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Core trait that every standard step implements
#[async_trait]
pub trait Node: Send + Sync {
    /// Step type identifier (e.g., "fetch", "transform.json_parse")
    fn node_type(&self) -> &str;

    /// Name, input expression, output keys and config of this instance
    fn spec(&self) -> &NodeSpec;

    /// Run the step. Results go into `state`; the returned output only
    /// carries usage counters.
    async fn execute(&self, state: &mut State) -> Result<NodeOutput, NodeError>;

    fn name(&self) -> &str {
        &self.spec().name
    }

    /// Resolve this node's input expression against `state`.
    fn input_keys(&self, state: &State) -> Result<Vec<String>, NodeError> {
        self.spec().input_keys(state)
    }
}

/// A step that chooses between two successors instead of following an edge
#[async_trait]
pub trait ConditionalNode: Send + Sync {
    fn node_type(&self) -> &str;

    fn spec(&self) -> &NodeSpec;

    /// `true` routes to the first candidate, `false` to the second.
    async fn evaluate(&self, state: &mut State) -> Result<bool, NodeError>;

    fn name(&self) -> &str {
        &self.spec().name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "node")]
    Standard,
    #[serde(rename = "conditional_node")]
    Conditional,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Standard => f.write_str("node"),
            NodeKind::Conditional => f.write_str("conditional_node"),
        }
    }
}

/// Construction-time description shared by all steps
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub name: String,
    pub input: InputExpression,
    /// Keys the step intends to write. Advisory only.
    pub output: Vec<String>,
    pub min_inputs: usize,
    pub config: HashMap<String, Value>,
}

impl NodeSpec {
    pub fn new<I, S>(name: impl Into<String>, input: &str, output: I) -> Result<Self, NodeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(NodeError::Configuration("node name must not be empty".to_string()));
        }
        let input = InputExpression::parse(input).map_err(|source| NodeError::Expression {
            node: name.clone(),
            source,
        })?;

        Ok(Self {
            name,
            input,
            output: output.into_iter().map(Into::into).collect(),
            min_inputs: 1,
            config: HashMap::new(),
        })
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    pub fn with_min_inputs(mut self, min_inputs: usize) -> Self {
        self.min_inputs = min_inputs;
        self
    }

    /// Merge `params` into the config. Existing keys are only replaced when
    /// `overwrite` is set.
    pub fn update_config(&mut self, params: HashMap<String, Value>, overwrite: bool) {
        for (key, value) in params {
            if overwrite || !self.config.contains_key(&key) {
                self.config.insert(key, value);
            }
        }
    }

    /// Get config value or return error
    pub fn require_config(&self, name: &str) -> Result<&Value, NodeError> {
        self.config
            .get(name)
            .ok_or_else(|| NodeError::Configuration(format!("{}: missing config '{}'", self.name, name)))
    }

    /// Get config with default
    pub fn config_or(&self, name: &str, default: Value) -> Value {
        self.config.get(name).cloned().unwrap_or(default)
    }

    pub fn verbose(&self) -> bool {
        self.config
            .get("verbose")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// First declared output key, which most steps write their result to.
    pub fn primary_output(&self) -> Result<&str, NodeError> {
        self.output
            .first()
            .map(String::as_str)
            .ok_or_else(|| NodeError::Configuration(format!("{}: no output key declared", self.name)))
    }

    pub fn input_keys(&self, state: &State) -> Result<Vec<String>, NodeError> {
        let keys = self
            .input
            .resolve_in(state)
            .map_err(|source: ExpressionError| NodeError::Expression {
                node: self.name.clone(),
                source,
            })?;

        if keys.len() < self.min_inputs {
            return Err(NodeError::NotEnoughInputs {
                node: self.name.clone(),
                required: self.min_inputs,
                actual: keys.len(),
            });
        }
        Ok(keys)
    }
}

/// What a standard step hands back to the executor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeOutput {
    pub usage: Usage,
}

impl NodeOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }
}

/// Where control goes after a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Follow the graph's successor map
    Successor,
    /// Jump to a named candidate
    Goto(String),
}

/// Result of one dispatched step
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub usage: Usage,
    pub transition: Transition,
}

/// A node as the executor sees it
#[derive(Clone)]
pub enum GraphNode {
    Standard(Arc<dyn Node>),
    Conditional {
        node: Arc<dyn ConditionalNode>,
        on_true: String,
        on_false: String,
    },
}

impl GraphNode {
    pub fn standard(node: impl Node + 'static) -> Self {
        GraphNode::Standard(Arc::new(node))
    }

    pub fn conditional(
        node: impl ConditionalNode + 'static,
        on_true: impl Into<String>,
        on_false: impl Into<String>,
    ) -> Self {
        GraphNode::Conditional {
            node: Arc::new(node),
            on_true: on_true.into(),
            on_false: on_false.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            GraphNode::Standard(node) => node.name(),
            GraphNode::Conditional { node, .. } => node.name(),
        }
    }

    pub fn node_type(&self) -> &str {
        match self {
            GraphNode::Standard(node) => node.node_type(),
            GraphNode::Conditional { node, .. } => node.node_type(),
        }
    }

    pub fn spec(&self) -> &NodeSpec {
        match self {
            GraphNode::Standard(node) => node.spec(),
            GraphNode::Conditional { node, .. } => node.spec(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            GraphNode::Standard(_) => NodeKind::Standard,
            GraphNode::Conditional { .. } => NodeKind::Conditional,
        }
    }

    /// The two branch targets of a conditional node.
    pub fn candidates(&self) -> Option<(&str, &str)> {
        match self {
            GraphNode::Standard(_) => None,
            GraphNode::Conditional {
                on_true, on_false, ..
            } => Some((on_true.as_str(), on_false.as_str())),
        }
    }

    /// Run the node once against `state`.
    pub async fn step(&self, state: &mut State) -> Result<Step, NodeError> {
        match self {
            GraphNode::Standard(node) => {
                let output = node.execute(state).await?;
                Ok(Step {
                    usage: output.usage,
                    transition: Transition::Successor,
                })
            }
            GraphNode::Conditional {
                node,
                on_true,
                on_false,
            } => {
                let target = if node.evaluate(state).await? {
                    on_true
                } else {
                    on_false
                };
                Ok(Step {
                    usage: Usage::default(),
                    transition: Transition::Goto(target.clone()),
                })
            }
        }
    }
}

impl fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphNode::Standard(node) => f
                .debug_struct("Standard")
                .field("name", &node.name())
                .field("node_type", &node.node_type())
                .finish(),
            GraphNode::Conditional {
                node,
                on_true,
                on_false,
            } => f
                .debug_struct("Conditional")
                .field("name", &node.name())
                .field("node_type", &node.node_type())
                .field("on_true", on_true)
                .field("on_false", on_false)
                .finish(),
        }
    }
}
