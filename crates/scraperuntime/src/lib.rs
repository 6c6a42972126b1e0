//! Graph execution runtime
//!
//! This crate provides the graph type, the sequential executor that walks it,
//! the node registry that turns graph descriptions into live nodes, and a
//! small runtime facade tying them to a telemetry bus.

mod executor;
mod graph;
mod registry;
mod runtime;

pub use executor::{ExecutionResult, GraphExecutor};
pub use graph::Graph;
pub use registry::{NodeFactory, NodeMetadata, NodeRegistry, PortDefinition};
pub use runtime::{parse_flag, Runtime, RuntimeConfig, TELEMETRY_ENV};
