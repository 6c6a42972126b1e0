use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::ops::{Add, AddAssign};

/// Label of the synthesized cumulative record.
pub const TOTAL_RESULT: &str = "TOTAL RESULT";

/// Model usage counters a step may report for its own external calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub total_tokens: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub successful_requests: u64,
    #[serde(rename = "total_cost_USD")]
    pub total_cost_usd: f64,
}

impl Usage {
    pub fn requests(count: u64) -> Self {
        Self {
            successful_requests: count,
            ..Self::default()
        }
    }

    pub fn tokens(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            total_tokens: prompt_tokens + completion_tokens,
            prompt_tokens,
            completion_tokens,
            ..Self::default()
        }
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, rhs: Self) {
        self.total_tokens += rhs.total_tokens;
        self.prompt_tokens += rhs.prompt_tokens;
        self.completion_tokens += rhs.completion_tokens;
        self.successful_requests += rhs.successful_requests;
        self.total_cost_usd += rhs.total_cost_usd;
    }
}

impl Add for Usage {
    type Output = Usage;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

/// One row of the execution trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub node_name: String,
    #[serde(flatten)]
    pub usage: Usage,
    /// Wall-clock seconds
    pub exec_time: f64,
}

impl TraceRecord {
    pub fn new(node_name: impl Into<String>, usage: Usage, exec_time: f64) -> Self {
        Self {
            node_name: node_name.into(),
            usage,
            exec_time,
        }
    }
}

/// Per-step telemetry for a single run.
///
/// Append-only. A successful run ends with exactly one [`TOTAL_RESULT`] row;
/// an aborted run instead names the failing step in `error_node`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTrace {
    records: Vec<TraceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_node: Option<String>,
    /// Set once the run is over; on success the last record is the total row.
    #[serde(default)]
    finished: bool,
}

impl ExecutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: TraceRecord) {
        if !self.finished {
            self.records.push(record);
        }
    }

    /// Record the step that aborted the run.
    pub fn fail(&mut self, node_name: impl Into<String>) {
        self.error_node = Some(node_name.into());
        self.finished = true;
    }

    /// Append the cumulative row. Later calls are ignored.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        let total = self.total();
        self.records.push(total);
        self.finished = true;
    }

    /// Column-wise sum of every per-step row.
    pub fn total(&self) -> TraceRecord {
        let (usage, exec_time) = self
            .steps()
            .iter()
            .fold((Usage::default(), 0.0), |(usage, time), record| {
                (usage + record.usage, time + record.exec_time)
            });
        TraceRecord::new(TOTAL_RESULT, usage, exec_time)
    }

    /// Per-step rows, without the cumulative one.
    pub fn steps(&self) -> &[TraceRecord] {
        match self.records.split_last() {
            Some((_, steps)) if self.finished && self.error_node.is_none() => steps,
            _ => &self.records,
        }
    }

    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    pub fn error_node(&self) -> Option<&str> {
        self.error_node.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Node names in execution order.
    pub fn visited(&self) -> Vec<&str> {
        self.steps().iter().map(|r| r.node_name.as_str()).collect()
    }

    /// Plain-text table for terminal output.
    pub fn to_table(&self) -> String {
        let width = self
            .records
            .iter()
            .map(|r| r.node_name.len())
            .max()
            .unwrap_or(0)
            .max("node_name".len());

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<width$}  {:>12}  {:>13}  {:>17}  {:>19}  {:>14}  {:>10}",
            "node_name",
            "total_tokens",
            "prompt_tokens",
            "completion_tokens",
            "successful_requests",
            "total_cost_USD",
            "exec_time",
        );
        for r in &self.records {
            let _ = writeln!(
                out,
                "{:<width$}  {:>12}  {:>13}  {:>17}  {:>19}  {:>14.6}  {:>10.4}",
                r.node_name,
                r.usage.total_tokens,
                r.usage.prompt_tokens,
                r.usage.completion_tokens,
                r.usage.successful_requests,
                r.usage.total_cost_usd,
                r.exec_time,
            );
        }
        if let Some(node) = &self.error_node {
            let _ = writeln!(out, "failed at: {}", node);
        }
        out
    }
}
