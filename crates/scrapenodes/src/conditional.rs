use async_trait::async_trait;
use scrapecore::{ConditionalNode, GraphNode, NodeError, NodeKind, NodeSpec, State, Value};
use scraperuntime::{NodeFactory, NodeMetadata, PortDefinition};

/// Routes on whether a state key holds a non-empty value.
///
/// The first branch is taken when `key_name` exists and is non-empty, the
/// second otherwise.
pub struct KeyPresentNode {
    spec: NodeSpec,
    key_name: String,
}

impl KeyPresentNode {
    pub fn new(spec: NodeSpec) -> Result<Self, NodeError> {
        let key_name = spec
            .require_config("key_name")?
            .as_str()
            .ok_or_else(|| NodeError::Configuration(format!("{}: key_name must be a string", spec.name)))?
            .to_string();
        Ok(Self { spec, key_name })
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }
}

#[async_trait]
impl ConditionalNode for KeyPresentNode {
    fn node_type(&self) -> &str {
        "conditional.key_present"
    }

    fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    async fn evaluate(&self, state: &mut State) -> Result<bool, NodeError> {
        let present = state
            .get(&self.key_name)
            .map(|value| !value.is_empty())
            .unwrap_or(false);

        tracing::debug!("{}: '{}' present = {}", self.spec.name, self.key_name, present);
        Ok(present)
    }
}

pub struct KeyPresentNodeFactory;

impl NodeFactory for KeyPresentNodeFactory {
    fn create(&self, spec: NodeSpec, branches: Option<[String; 2]>) -> Result<GraphNode, NodeError> {
        let [on_true, on_false] = branches.ok_or_else(|| {
            NodeError::Configuration(format!("{}: a conditional node needs two branch targets", spec.name))
        })?;
        Ok(GraphNode::conditional(KeyPresentNode::new(spec)?, on_true, on_false))
    }

    fn node_type(&self) -> &str {
        "conditional.key_present"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Conditional
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            description: "Decides the next node based on whether a state key is filled".to_string(),
            category: "conditional".to_string(),
            inputs: vec![PortDefinition::new("key_name", "State key to check (config)", true)],
            outputs: vec![],
        }
    }
}

/// Convenience for graphs assembled in code.
pub fn key_present(
    name: &str,
    key_name: &str,
    on_true: &str,
    on_false: &str,
) -> Result<GraphNode, NodeError> {
    let spec = NodeSpec::new(name, key_name, Vec::<String>::new())?
        .with_config("key_name", Value::from(key_name));
    KeyPresentNodeFactory.create(spec, Some([on_true.to_string(), on_false.to_string()]))
}
