use crate::{graph::Graph, registry::NodeRegistry, ExecutionResult, GraphExecutor};
use scrapecore::{EventBus, ExecutionEvent, FlowError, GraphError, GraphSpec, State};
use std::sync::Arc;

/// Environment variable that can switch telemetry off.
pub const TELEMETRY_ENV: &str = "SCRAPEFLOW_TELEMETRY_ENABLED";

/// Main runtime for building and executing graphs
pub struct Runtime {
    registry: Arc<NodeRegistry>,
    executor: GraphExecutor,
    event_bus: Arc<EventBus>,
}

impl Runtime {
    /// Create a new runtime with default settings
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a new runtime with custom configuration
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self::with_registry(Arc::new(NodeRegistry::new()), config)
    }

    /// Create a new runtime with a pre-configured registry
    pub fn with_registry(registry: Arc<NodeRegistry>, config: RuntimeConfig) -> Self {
        let event_bus = if config.telemetry_enabled {
            EventBus::new(config.event_buffer_size)
        } else {
            EventBus::disabled()
        };

        Self {
            registry,
            executor: GraphExecutor::new(),
            event_bus: Arc::new(event_bus),
        }
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// Instantiate a graph description with the registered steps
    pub fn build_graph(&self, spec: &GraphSpec) -> Result<Graph, GraphError> {
        self.registry.build_graph(spec)
    }

    /// Execute an already built graph
    pub async fn execute(&self, graph: &Graph, state: State) -> Result<ExecutionResult, FlowError> {
        self.executor.execute(graph, state, &self.event_bus).await
    }

    /// Build a graph description and execute it
    pub async fn execute_spec(
        &self,
        spec: &GraphSpec,
        state: State,
    ) -> Result<ExecutionResult, FlowError> {
        let graph = self.build_graph(spec)?;
        self.execute(&graph, state).await
    }

    /// Subscribe to execution events
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ExecutionEvent> {
        self.event_bus.subscribe()
    }

    /// Get the event bus for direct access
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub event_buffer_size: usize,
    pub telemetry_enabled: bool,
}

impl RuntimeConfig {
    /// Defaults, with telemetry switched off when `SCRAPEFLOW_TELEMETRY_ENABLED`
    /// is `false`, `0`, `no` or `off`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(TELEMETRY_ENV) {
            config.telemetry_enabled = parse_flag(&value).unwrap_or(config.telemetry_enabled);
        }
        config
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: 1000,
            telemetry_enabled: true,
        }
    }
}

/// Parse a boolean-ish flag as written in env vars.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
