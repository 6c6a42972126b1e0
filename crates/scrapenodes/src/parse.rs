use async_trait::async_trait;
use scrapecore::{GraphNode, Node, NodeError, NodeOutput, NodeSpec, State, Value};
use scraperuntime::{NodeFactory, NodeMetadata, PortDefinition};

const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Splits a document into chunks small enough for a model prompt
pub struct ParseNode {
    spec: NodeSpec,
    chunk_size: usize,
}

impl ParseNode {
    pub fn new(spec: NodeSpec) -> Result<Self, NodeError> {
        spec.primary_output()?;

        let chunk_size = match spec.config.get("chunk_size") {
            None => DEFAULT_CHUNK_SIZE,
            Some(value) => value
                .as_f64()
                .filter(|n| *n >= 1.0)
                .map(|n| n as usize)
                .ok_or_else(|| {
                    NodeError::Configuration(format!("{}: chunk_size must be a positive number", spec.name))
                })?,
        };

        Ok(Self { spec, chunk_size })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

/// Split on char boundaries into pieces of at most `size` chars.
fn chunk(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|piece| piece.iter().collect())
        .collect()
}

#[async_trait]
impl Node for ParseNode {
    fn node_type(&self) -> &str {
        "parse"
    }

    fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    async fn execute(&self, state: &mut State) -> Result<NodeOutput, NodeError> {
        let keys = self.input_keys(state)?;
        let key = keys
            .first()
            .ok_or_else(|| NodeError::MissingInput(self.spec.input.to_string()))?;

        let invalid = |field: String| NodeError::InvalidInputType {
            field,
            expected: "string or list of strings".to_string(),
            actual: "other".to_string(),
        };

        let chunks: Vec<Value> = match state.get(key) {
            Some(Value::String(text)) => chunk(text, self.chunk_size)
                .into_iter()
                .map(Value::String)
                .collect(),
            Some(Value::Array(docs)) => {
                let mut chunks = Vec::new();
                for (i, doc) in docs.iter().enumerate() {
                    let text = doc
                        .as_str()
                        .ok_or_else(|| invalid(format!("{}[{}]", key, i)))?;
                    chunks.extend(chunk(text, self.chunk_size).into_iter().map(Value::String));
                }
                chunks
            }
            _ => return Err(invalid(key.clone())),
        };

        if self.spec.verbose() {
            tracing::info!("--- Executing Parse Node: {} chunks ---", chunks.len());
        }

        state.insert(self.spec.primary_output()?, Value::Array(chunks));
        Ok(NodeOutput::new())
    }
}

pub struct ParseNodeFactory;

impl NodeFactory for ParseNodeFactory {
    fn create(&self, spec: NodeSpec, _branches: Option<[String; 2]>) -> Result<GraphNode, NodeError> {
        Ok(GraphNode::standard(ParseNode::new(spec)?))
    }

    fn node_type(&self) -> &str {
        "parse"
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            description: "Splits a document into fixed-size text chunks".to_string(),
            category: "parse".to_string(),
            inputs: vec![PortDefinition::new("doc", "Document text", true)],
            outputs: vec![PortDefinition::new("parsed_doc", "List of chunks", true)],
        }
    }
}
