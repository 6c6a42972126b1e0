use crate::graph::Graph;
use chrono::Utc;
use scrapecore::{
    EventBus, ExecutionEvent, ExecutionId, ExecutionTrace, FlowError, GraphError, State,
    TraceRecord, Transition, Usage,
};
use std::time::Instant;

/// Walks a graph one node at a time against a single shared state
#[derive(Debug, Default, Clone, Copy)]
pub struct GraphExecutor;

impl GraphExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Run `graph` from its entry point until a node has no successor.
    ///
    /// Every step mutates the same `State`. The first failing step aborts the
    /// run: its error is returned as-is inside [`FlowError::NodeFailed`]
    /// together with the trace so far, and the partial state is dropped.
    pub async fn execute(
        &self,
        graph: &Graph,
        initial_state: State,
        event_bus: &EventBus,
    ) -> Result<ExecutionResult, FlowError> {
        let execution_id = ExecutionId::new_v4();
        let start_time = Instant::now();

        event_bus.emit(ExecutionEvent::RunStarted {
            execution_id,
            entry_point: graph.entry_point().to_string(),
            timestamp: Utc::now(),
        });

        tracing::info!(
            "Starting graph execution {} at '{}'",
            execution_id,
            graph.entry_point()
        );

        let mut state = initial_state;
        let mut trace = ExecutionTrace::new();
        let mut current = Some(graph.entry_point().to_string());

        while let Some(name) = current.take() {
            let Some(node) = graph.node(&name) else {
                let error = GraphError::NodeNotFound(name.clone());
                trace.fail(&name);
                self.complete(event_bus, execution_id, &start_time, &trace, Some(error.to_string()));
                return Err(error.into());
            };

            event_bus.emit(ExecutionEvent::NodeStarted {
                execution_id,
                node_name: name.clone(),
                node_type: node.node_type().to_string(),
                timestamp: Utc::now(),
            });

            let started = Instant::now();
            let outcome = node.step(&mut state).await;
            let exec_time = started.elapsed().as_secs_f64();

            match outcome {
                Ok(step) => {
                    let record = TraceRecord::new(name.as_str(), step.usage, exec_time);
                    tracing::info!("Node {} completed in {:.3}s", name, exec_time);

                    event_bus.emit(ExecutionEvent::NodeCompleted {
                        execution_id,
                        record: record.clone(),
                        timestamp: Utc::now(),
                    });
                    trace.push(record);

                    current = match step.transition {
                        Transition::Goto(next) => Some(next),
                        Transition::Successor => graph.successor(&name).map(str::to_string),
                    };
                }
                Err(error) => {
                    tracing::error!("Node {} failed: {}", name, error);

                    event_bus.emit(ExecutionEvent::NodeFailed {
                        execution_id,
                        node_name: name.clone(),
                        error: error.to_string(),
                        timestamp: Utc::now(),
                    });

                    trace.push(TraceRecord::new(name.as_str(), Usage::default(), exec_time));
                    trace.fail(&name);
                    self.complete(event_bus, execution_id, &start_time, &trace, Some(error.to_string()));

                    return Err(FlowError::NodeFailed {
                        node: name,
                        source: error,
                        trace: Box::new(trace),
                    });
                }
            }
        }

        trace.finish();
        self.complete(event_bus, execution_id, &start_time, &trace, None);

        Ok(ExecutionResult {
            execution_id,
            state,
            trace,
        })
    }

    fn complete(
        &self,
        event_bus: &EventBus,
        execution_id: ExecutionId,
        start_time: &Instant,
        trace: &ExecutionTrace,
        exception: Option<String>,
    ) {
        let exec_time = start_time.elapsed().as_secs_f64();
        let success = exception.is_none();

        if success {
            tracing::info!("Graph execution {} finished in {:.3}s", execution_id, exec_time);
        }

        event_bus.emit(ExecutionEvent::RunCompleted {
            execution_id,
            success,
            exec_time,
            total_tokens: trace.total().usage.total_tokens,
            error_node: trace.error_node().map(str::to_string),
            exception,
            timestamp: Utc::now(),
        });
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub execution_id: ExecutionId,
    /// The shared state after the last node
    pub state: State,
    pub trace: ExecutionTrace,
}
