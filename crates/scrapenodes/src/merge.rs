use async_trait::async_trait;
use scrapecore::{GraphNode, Node, NodeError, NodeOutput, NodeSpec, State, Value};
use scraperuntime::{NodeFactory, NodeMetadata, PortDefinition};

/// Concatenates the results found under every resolved input key
pub struct MergeAnswersNode {
    spec: NodeSpec,
}

impl MergeAnswersNode {
    pub fn new(spec: NodeSpec) -> Result<Self, NodeError> {
        spec.primary_output()?;
        Ok(Self { spec })
    }
}

#[async_trait]
impl Node for MergeAnswersNode {
    fn node_type(&self) -> &str {
        "merge_answers"
    }

    fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    async fn execute(&self, state: &mut State) -> Result<NodeOutput, NodeError> {
        let keys = self.input_keys(state)?;

        let mut merged = Vec::new();
        for key in &keys {
            match state.get(key) {
                Some(Value::Array(items)) => merged.extend(items.iter().cloned()),
                Some(Value::Json(serde_json::Value::Array(items))) => {
                    merged.extend(items.iter().cloned().map(Value::Json))
                }
                Some(value) if !value.is_null() => merged.push(value.clone()),
                _ => {}
            }
        }

        tracing::debug!("{}: merged {} items from {:?}", self.spec.name, merged.len(), keys);

        state.insert(self.spec.primary_output()?, Value::Array(merged));
        Ok(NodeOutput::new())
    }
}

pub struct MergeAnswersNodeFactory;

impl NodeFactory for MergeAnswersNodeFactory {
    fn create(&self, spec: NodeSpec, _branches: Option<[String; 2]>) -> Result<GraphNode, NodeError> {
        Ok(GraphNode::standard(MergeAnswersNode::new(spec)?))
    }

    fn node_type(&self) -> &str {
        "merge_answers"
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            description: "Concatenates partial results into one list".to_string(),
            category: "merge".to_string(),
            inputs: vec![PortDefinition::new("results", "Partial answers", true)],
            outputs: vec![PortDefinition::new("answer", "Merged list", true)],
        }
    }
}
