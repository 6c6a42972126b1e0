use async_trait::async_trait;
use scrapecore::{GraphNode, Node, NodeError, NodeOutput, NodeSpec, State, Value};
use scraperuntime::{NodeFactory, NodeMetadata, PortDefinition};

/// Parse JSON string to Value
pub struct JsonParseNode {
    spec: NodeSpec,
}

impl JsonParseNode {
    pub fn new(spec: NodeSpec) -> Result<Self, NodeError> {
        spec.primary_output()?;
        Ok(Self { spec })
    }
}

#[async_trait]
impl Node for JsonParseNode {
    fn node_type(&self) -> &str {
        "transform.json_parse"
    }

    fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    async fn execute(&self, state: &mut State) -> Result<NodeOutput, NodeError> {
        let keys = self.input_keys(state)?;
        let key = keys
            .first()
            .ok_or_else(|| NodeError::MissingInput(self.spec.input.to_string()))?;
        let input = state
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| NodeError::InvalidInputType {
                field: key.clone(),
                expected: "string".to_string(),
                actual: "other".to_string(),
            })?;

        let parsed: serde_json::Value = serde_json::from_str(input)
            .map_err(|e| NodeError::ExecutionFailed(format!("JSON parse error: {}", e)))?;

        state.insert(self.spec.primary_output()?, Value::Json(parsed));
        Ok(NodeOutput::new())
    }
}

pub struct JsonParseNodeFactory;

impl NodeFactory for JsonParseNodeFactory {
    fn create(&self, spec: NodeSpec, _branches: Option<[String; 2]>) -> Result<GraphNode, NodeError> {
        Ok(GraphNode::standard(JsonParseNode::new(spec)?))
    }

    fn node_type(&self) -> &str {
        "transform.json_parse"
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            description: "Parse JSON string".to_string(),
            category: "transform".to_string(),
            inputs: vec![PortDefinition::new("json", "JSON text", true)],
            outputs: vec![PortDefinition::new("parsed", "Parsed JSON value", true)],
        }
    }
}
