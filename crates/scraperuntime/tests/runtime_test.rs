mod common;

use common::*;
use scrapecore::{
    ExpressionError, GraphError, GraphNode, GraphSpec, NodeEntry, NodeError, NodeKind, NodeSpec,
};
use scraperuntime::{parse_flag, NodeFactory, NodeMetadata, NodeRegistry, Runtime, RuntimeConfig};
use std::sync::Arc;

struct WriteFactory(Visits);

impl NodeFactory for WriteFactory {
    fn create(&self, spec: NodeSpec, _branches: Option<[String; 2]>) -> Result<GraphNode, NodeError> {
        let output = spec.primary_output()?;
        Ok(write(&spec.name, &output, &self.0))
    }

    fn node_type(&self) -> &str {
        "test.write"
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            description: "Writes a marker".to_string(),
            category: "test".to_string(),
            ..NodeMetadata::default()
        }
    }
}

struct FlagFactory(Visits);

impl NodeFactory for FlagFactory {
    fn create(&self, spec: NodeSpec, branches: Option<[String; 2]>) -> Result<GraphNode, NodeError> {
        let [on_true, on_false] = branches
            .ok_or_else(|| NodeError::Configuration(format!("{}: missing branches", spec.name)))?;
        Ok(flag(&spec.name, &on_true, &on_false, &self.0))
    }

    fn node_type(&self) -> &str {
        "test.flag"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Conditional
    }
}

fn registry(v: &Visits) -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    registry.register(Arc::new(WriteFactory(v.clone())));
    registry.register(Arc::new(FlagFactory(v.clone())));
    registry
}

fn branching_spec() -> GraphSpec {
    let mut spec = GraphSpec::new("start");
    spec.add_node(NodeEntry::new("start", NodeKind::Standard, "seed").with_step("test.write").with_output(["x"]))
        .add_node(NodeEntry::new("check", NodeKind::Conditional, "flag").with_step("test.flag"))
        .add_node(NodeEntry::new("yes", NodeKind::Standard, "x").with_step("test.write").with_output(["answer"]))
        .add_node(NodeEntry::new("no", NodeKind::Standard, "x").with_step("test.write").with_output(["answer"]));
    spec.connect("start", "check").branch("check", "yes", "no");
    spec
}

#[test]
fn test_parse_flag() {
    assert_eq!(parse_flag("true"), Some(true));
    assert_eq!(parse_flag(" ON "), Some(true));
    assert_eq!(parse_flag("1"), Some(true));
    assert_eq!(parse_flag("False"), Some(false));
    assert_eq!(parse_flag("off"), Some(false));
    assert_eq!(parse_flag("maybe"), None);
}

#[test]
fn test_registry_lists_types_sorted() {
    let v = visits();
    let registry = registry(&v);

    assert_eq!(registry.list_node_types(), vec!["test.flag", "test.write"]);
    assert_eq!(registry.get_kind("test.flag"), Some(NodeKind::Conditional));
    assert_eq!(registry.get_kind("test.write"), Some(NodeKind::Standard));
    assert_eq!(registry.get_metadata("test.write").map(|m| m.category), Some("test".to_string()));
    assert!(registry.get_metadata("nope").is_none());
}

#[test]
fn test_registry_rejects_unknown_step() {
    let v = visits();
    let mut spec = GraphSpec::new("a");
    spec.add_node(NodeEntry::new("a", NodeKind::Standard, "seed").with_step("nope"));

    let err = registry(&v).build_graph(&spec).unwrap_err();
    assert_eq!(err, GraphError::UnknownNodeType("nope".to_string()));
}

#[test]
fn test_registry_rejects_kind_mismatch() {
    let v = visits();
    let spec = NodeSpec::new("a", "seed", ["x"]).unwrap();

    let result = registry(&v).create_node("test.flag", spec, None);
    assert!(result.is_err());
}

#[tokio::test]
async fn test_runtime_executes_spec() {
    let v = visits();
    let runtime = Runtime::with_registry(Arc::new(registry(&v)), RuntimeConfig::default());

    let result = runtime
        .execute_spec(&branching_spec(), seeded().with("flag", true))
        .await
        .unwrap();

    assert_eq!(seen(&v), vec!["start", "check", "yes"]);
    assert_eq!(result.state.get("answer").and_then(|a| a.as_str()), Some("yes_done"));
}

#[tokio::test]
async fn test_runtime_with_telemetry_off_emits_nothing() {
    let v = visits();
    let config = RuntimeConfig {
        telemetry_enabled: false,
        ..RuntimeConfig::default()
    };
    let runtime = Runtime::with_registry(Arc::new(registry(&v)), config);
    assert!(!runtime.event_bus().is_enabled());

    let mut events = runtime.subscribe_events();
    runtime.execute_spec(&branching_spec(), seeded()).await.unwrap();

    assert!(events.try_recv().is_err());
    assert_eq!(seen(&v), vec!["start", "check", "no"]);
}

#[test]
fn test_registry_keeps_node_errors_typed() {
    let v = visits();

    let mut spec = GraphSpec::new("a");
    spec.add_node(NodeEntry::new("a", NodeKind::Standard, "seed doc").with_step("test.write"));
    match registry(&v).build_graph(&spec) {
        Err(GraphError::Node { node, source }) => {
            assert_eq!(node, "a");
            assert!(matches!(
                source,
                NodeError::Expression { source: ExpressionError::AdjacentKeys, .. }
            ));
        }
        other => panic!("expected a node error, got {:?}", other),
    }

    let spec = NodeSpec::new("a", "seed", Vec::<String>::new()).unwrap();
    match registry(&v).create_node("test.write", spec, None) {
        Err(GraphError::Node { node, source }) => {
            assert_eq!(node, "a");
            assert!(matches!(source, NodeError::Configuration(_)));
        }
        other => panic!("expected a node error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_runtime_surfaces_construction_error_as_node_error() {
    let v = visits();
    let runtime = Runtime::with_registry(Arc::new(registry(&v)), RuntimeConfig::default());

    let mut spec = GraphSpec::new("a");
    spec.add_node(NodeEntry::new("a", NodeKind::Standard, "seed &").with_step("test.write"));

    let err = runtime.execute_spec(&spec, seeded()).await.unwrap_err();
    assert!(matches!(
        err.into_node_error(),
        Some(NodeError::Expression { source: ExpressionError::TrailingOperator, .. })
    ));
}
