#![allow(dead_code)]

use async_trait::async_trait;
use scrapecore::{
    ConditionalNode, GraphNode, Node, NodeError, NodeOutput, NodeSpec, State, Usage, Value,
};
use std::sync::{Arc, Mutex};

pub type Visits = Arc<Mutex<Vec<String>>>;

pub fn visits() -> Visits {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn seen(visits: &Visits) -> Vec<String> {
    visits.lock().unwrap().clone()
}

/// Writes `<name>_done` into every declared output key
pub struct WriteNode {
    spec: NodeSpec,
    usage: Usage,
    visits: Visits,
}

#[async_trait]
impl Node for WriteNode {
    fn node_type(&self) -> &str {
        "test.write"
    }

    fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    async fn execute(&self, state: &mut State) -> Result<NodeOutput, NodeError> {
        self.visits.lock().unwrap().push(self.spec.name.clone());
        for key in &self.spec.output {
            state.insert(key.clone(), format!("{}_done", self.spec.name));
        }
        Ok(NodeOutput::new().with_usage(self.usage))
    }
}

pub fn write(name: &str, output: &str, visits: &Visits) -> GraphNode {
    write_with_usage(name, output, Usage::default(), visits)
}

pub fn write_with_usage(name: &str, output: &str, usage: Usage, visits: &Visits) -> GraphNode {
    GraphNode::standard(WriteNode {
        spec: NodeSpec::new(name, "seed | doc", [output]).unwrap(),
        usage,
        visits: visits.clone(),
    })
}

/// Always fails
pub struct FailingNode {
    spec: NodeSpec,
    visits: Visits,
}

#[async_trait]
impl Node for FailingNode {
    fn node_type(&self) -> &str {
        "test.fail"
    }

    fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    async fn execute(&self, _state: &mut State) -> Result<NodeOutput, NodeError> {
        self.visits.lock().unwrap().push(self.spec.name.clone());
        Err(NodeError::ExecutionFailed("boom".to_string()))
    }
}

pub fn failing(name: &str, visits: &Visits) -> GraphNode {
    GraphNode::standard(FailingNode {
        spec: NodeSpec::new(name, "seed", ["never"]).unwrap(),
        visits: visits.clone(),
    })
}

/// Mutates a private copy of the state and writes nothing to the shared one
pub struct CopyingNode {
    spec: NodeSpec,
}

#[async_trait]
impl Node for CopyingNode {
    fn node_type(&self) -> &str {
        "test.copy"
    }

    fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    async fn execute(&self, state: &mut State) -> Result<NodeOutput, NodeError> {
        let mut copy = state.clone();
        copy.insert("ghost", "should not leak");
        Ok(NodeOutput::new().with_usage(Usage::requests(1)))
    }
}

pub fn copying(name: &str) -> GraphNode {
    GraphNode::standard(CopyingNode {
        spec: NodeSpec::new(name, "seed", ["ghost"]).unwrap(),
    })
}

/// Routes on the boolean `flag` key
pub struct FlagNode {
    spec: NodeSpec,
    visits: Visits,
}

#[async_trait]
impl ConditionalNode for FlagNode {
    fn node_type(&self) -> &str {
        "test.flag"
    }

    fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    async fn evaluate(&self, state: &mut State) -> Result<bool, NodeError> {
        self.visits.lock().unwrap().push(self.spec.name.clone());
        Ok(state.get("flag").and_then(Value::as_bool).unwrap_or(false))
    }
}

pub fn flag(name: &str, on_true: &str, on_false: &str, visits: &Visits) -> GraphNode {
    GraphNode::conditional(
        FlagNode {
            spec: NodeSpec::new(name, "flag", Vec::<String>::new()).unwrap(),
            visits: visits.clone(),
        },
        on_true,
        on_false,
    )
}

pub fn seeded() -> State {
    State::new().with("seed", "start")
}
