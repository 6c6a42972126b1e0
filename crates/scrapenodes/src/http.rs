use async_trait::async_trait;
use scrapecore::{GraphNode, Node, NodeError, NodeOutput, NodeSpec, State, Usage, Value};
use scraperuntime::{NodeFactory, NodeMetadata, PortDefinition};
use std::time::Duration;

/// Fetches a document from a URL, or passes local source text through
pub struct FetchNode {
    spec: NodeSpec,
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl FetchNode {
    pub fn new(spec: NodeSpec) -> Result<Self, NodeError> {
        spec.primary_output()?;

        let timeout = match spec.config.get("timeout_secs") {
            None => None,
            Some(value) => {
                let invalid = || {
                    NodeError::Configuration(format!("{}: timeout_secs must be a positive number", spec.name))
                };
                let secs = value.as_f64().filter(|s| *s > 0.0).ok_or_else(invalid)?;
                Some(Duration::try_from_secs_f64(secs).map_err(|_| invalid())?)
            }
        };

        Ok(Self {
            spec,
            client: reqwest::Client::new(),
            timeout,
        })
    }

    async fn fetch(&self, url: &str) -> Result<String, NodeError> {
        let mut request = self.client.get(url);

        if let Some(Value::Object(headers)) = self.spec.config.get("headers") {
            for (key, value) in headers {
                if let Some(val_str) = value.as_str() {
                    request = request.header(key, val_str);
                }
            }
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                NodeError::Timeout {
                    seconds: self.timeout.map(|t| t.as_secs()).unwrap_or_default(),
                }
            } else {
                NodeError::ExecutionFailed(format!("HTTP request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NodeError::ExecutionFailed(format!(
                "GET {} returned status {}",
                url, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| NodeError::ExecutionFailed(format!("Failed to read response: {}", e)))
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

#[async_trait]
impl Node for FetchNode {
    fn node_type(&self) -> &str {
        "fetch"
    }

    fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    async fn execute(&self, state: &mut State) -> Result<NodeOutput, NodeError> {
        let keys = self.input_keys(state)?;
        let key = keys
            .first()
            .ok_or_else(|| NodeError::MissingInput(self.spec.input.to_string()))?;
        let source = state
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| NodeError::InvalidInputType {
                field: key.clone(),
                expected: "string".to_string(),
                actual: "other".to_string(),
            })?
            .to_string();

        let (document, usage) = if is_remote(&source) {
            if self.spec.verbose() {
                tracing::info!("--- Executing Fetch Node: GET {} ---", source);
            }
            (self.fetch(&source).await?, Usage::requests(1))
        } else {
            tracing::debug!("{}: using local source from '{}'", self.spec.name, key);
            (source, Usage::default())
        };

        state.insert(self.spec.primary_output()?, document);
        Ok(NodeOutput::new().with_usage(usage))
    }
}

pub struct FetchNodeFactory;

impl NodeFactory for FetchNodeFactory {
    fn create(&self, spec: NodeSpec, _branches: Option<[String; 2]>) -> Result<GraphNode, NodeError> {
        Ok(GraphNode::standard(FetchNode::new(spec)?))
    }

    fn node_type(&self) -> &str {
        "fetch"
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            description: "Fetches a document from a URL or passes local source text through".to_string(),
            category: "fetch".to_string(),
            inputs: vec![
                PortDefinition::new("url", "Page to GET", false),
                PortDefinition::new("local_dir", "Already loaded source text", false),
            ],
            outputs: vec![PortDefinition::new("doc", "Fetched document", true)],
        }
    }
}
