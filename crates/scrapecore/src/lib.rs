//! Core abstractions for the scrape flow engine
//!
//! This crate provides the fundamental types and traits that all other
//! components depend on: the shared state, the node contracts, input-key
//! expressions, execution traces and the graph interchange format.

mod error;
pub mod events;
pub mod expression;
pub mod graph_spec;
mod node;
mod state;
pub mod trace;
mod value;

pub use error::{ExpressionError, FlowError, GraphError, NodeError};
pub use events::{EventBus, ExecutionEvent, ExecutionId};
pub use expression::{resolve_input_keys, InputExpression};
pub use graph_spec::{EdgeEntry, EdgeTarget, GraphSpec, NodeEntry};
pub use node::{
    ConditionalNode, GraphNode, Node, NodeKind, NodeOutput, NodeSpec, Step, Transition,
};
pub use state::State;
pub use trace::{ExecutionTrace, TraceRecord, Usage, TOTAL_RESULT};
pub use value::Value;

/// Result type for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;
