use crate::trace::ExecutionTrace;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// A step failed during a run. `source` is the step's own error, untouched.
    #[error("Node '{node}' failed: {source}")]
    NodeFailed {
        node: String,
        #[source]
        source: NodeError,
        trace: Box<ExecutionTrace>,
    },

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FlowError {
    /// Name of the step that aborted the run, if this is a step failure.
    pub fn failed_node(&self) -> Option<&str> {
        match self {
            FlowError::NodeFailed { node, .. } => Some(node.as_str()),
            _ => None,
        }
    }

    /// Trace collected up to and including the failing step.
    pub fn trace(&self) -> Option<&ExecutionTrace> {
        match self {
            FlowError::NodeFailed { trace, .. } => Some(&**trace),
            _ => None,
        }
    }

    /// The node error behind a step failure or a failed node construction.
    pub fn into_node_error(self) -> Option<NodeError> {
        match self {
            FlowError::NodeFailed { source, .. } => Some(source),
            FlowError::Node(e) => Some(e),
            FlowError::Graph(GraphError::Node { source, .. }) => Some(source),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Invalid input type for '{field}': expected {expected}, got {actual}")]
    InvalidInputType {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Error parsing input keys for {node}: {source}")]
    Expression {
        node: String,
        #[source]
        source: ExpressionError,
    },

    #[error("{node} requires at least {required} input keys, got {actual}")]
    NotEnoughInputs {
        node: String,
        required: usize,
        actual: usize,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Timeout after {seconds}s")]
    Timeout { seconds: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("Empty expression.")]
    Empty,

    #[error("Adjacent state keys found without an operator between them.")]
    AdjacentKeys,

    #[error("Invalid operator usage: expression starts with an operator.")]
    LeadingOperator,

    #[error("Invalid operator usage: expression ends with an operator.")]
    TrailingOperator,

    #[error("Invalid operator placement: operators cannot be adjacent.")]
    AdjacentOperators,

    #[error("Missing or unbalanced parentheses in expression.")]
    UnbalancedParentheses,

    #[error("No state keys matched the expression.")]
    NoMatch,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Invalid graph: {0}")]
    Invalid(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Duplicate node name: {0}")]
    DuplicateNode(String),

    #[error("Node '{0}' already has an outgoing edge")]
    DuplicateEdge(String),

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    /// A node could not be built from its description.
    #[error("Failed to create node '{node}': {source}")]
    Node {
        node: String,
        #[source]
        source: NodeError,
    },
}
