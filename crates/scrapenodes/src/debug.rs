use async_trait::async_trait;
use scrapecore::{GraphNode, Node, NodeError, NodeOutput, NodeSpec, State};
use scraperuntime::{NodeFactory, NodeMetadata};

/// Simple debug node that logs the state keys it resolves
pub struct DebugNode {
    spec: NodeSpec,
}

impl DebugNode {
    pub fn new(spec: NodeSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl Node for DebugNode {
    fn node_type(&self) -> &str {
        "debug.log"
    }

    fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    async fn execute(&self, state: &mut State) -> Result<NodeOutput, NodeError> {
        let keys = self.input_keys(state)?;

        tracing::info!("DEBUG [{}]", self.spec.name);
        for key in &keys {
            if let Some(value) = state.get(key) {
                tracing::info!("  {}: {}", key, value.to_json());
            }
        }

        Ok(NodeOutput::new())
    }
}

pub struct DebugNodeFactory;

impl NodeFactory for DebugNodeFactory {
    fn create(&self, spec: NodeSpec, _branches: Option<[String; 2]>) -> Result<GraphNode, NodeError> {
        Ok(GraphNode::standard(DebugNode::new(spec)))
    }

    fn node_type(&self) -> &str {
        "debug.log"
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            description: "Logs resolved state values for debugging".to_string(),
            category: "debug".to_string(),
            inputs: vec![],
            outputs: vec![],
        }
    }
}
