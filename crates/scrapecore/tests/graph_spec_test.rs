use scrapecore::{EdgeTarget, GraphError, GraphSpec, NodeEntry, NodeKind, Value};

const SEARCH_GRAPH: &str = r#"{
  "nodes": [
    {"node_name": "fetch", "node_type": "node",
     "args": {"input": "url | local_dir", "output": ["doc"], "timeout_secs": 10},
     "returns": {"doc": "fetched page"}},
    {"node_name": "has_doc", "node_type": "conditional_node",
     "args": {"step": "conditional.key_present", "input": "doc", "key_name": "doc"},
     "returns": {}},
    {"node_name": "parse", "node_type": "node",
     "args": {"input": "doc", "output": ["parsed_doc"], "chunk_size": 512}},
    {"node_name": "log", "node_type": "node",
     "args": {"step": "debug.log", "input": "parsed_doc | url"}}
  ],
  "edges": [
    {"from": "fetch", "to": "has_doc"},
    {"from": "has_doc", "to": ["parse", "log"]},
    {"from": "parse", "to": "log"}
  ],
  "entry_point": "fetch"
}"#;

fn spec() -> GraphSpec {
    GraphSpec::from_json_str(SEARCH_GRAPH).unwrap()
}

#[test]
fn test_parses_interchange_format() {
    let spec = spec();
    assert_eq!(spec.nodes.len(), 4);
    assert_eq!(spec.entry_point, "fetch");
    assert_eq!(spec.nodes[1].node_type, NodeKind::Conditional);
    assert_eq!(
        spec.edges[1].to,
        EdgeTarget::Branch(vec!["parse".to_string(), "log".to_string()])
    );
    assert_eq!(spec.edges[0].to, EdgeTarget::One("has_doc".to_string()));
    assert_eq!(spec.branches_of("has_doc"), Some(["parse".to_string(), "log".to_string()]));
    spec.validate().unwrap();
}

#[test]
fn test_round_trips_through_json() {
    let spec = spec();
    let again = GraphSpec::from_json_str(&spec.to_json_pretty().unwrap()).unwrap();
    assert_eq!(spec, again);
}

#[test]
fn test_node_entry_builds_node_spec() {
    let spec = spec();
    let fetch = spec.find_node("fetch").unwrap();
    assert_eq!(fetch.step_type(), "fetch");

    let node_spec = fetch.to_node_spec().unwrap();
    assert_eq!(node_spec.name, "fetch");
    assert_eq!(node_spec.input.as_str(), "url | local_dir");
    assert_eq!(node_spec.output, vec!["doc"]);
    assert_eq!(node_spec.config.get("timeout_secs"), Some(&Value::Number(10.0)));
    assert!(!node_spec.config.contains_key("input"));
    assert!(!node_spec.config.contains_key("output"));

    let has_doc = spec.find_node("has_doc").unwrap();
    assert_eq!(has_doc.step_type(), "conditional.key_present");
    let node_spec = has_doc.to_node_spec().unwrap();
    assert!(node_spec.output.is_empty());
    assert!(!node_spec.config.contains_key("step"));
}

#[test]
fn test_bad_input_expression_is_a_construction_error() {
    let entry = NodeEntry::new("broken", NodeKind::Standard, "a&&b");
    let err = entry.to_node_spec().unwrap_err();
    assert!(err.to_string().contains("broken"));
}

#[test]
fn test_missing_entry_point() {
    let mut spec = spec();
    spec.entry_point = "nowhere".to_string();
    assert_eq!(spec.validate(), Err(GraphError::NodeNotFound("nowhere".to_string())));
}

#[test]
fn test_dangling_edges() {
    let mut spec = spec();
    spec.connect("ghost", "fetch");
    assert_eq!(spec.validate(), Err(GraphError::NodeNotFound("ghost".to_string())));

    let mut spec = self::spec();
    spec.edges[2].to = EdgeTarget::One("ghost".to_string());
    assert_eq!(spec.validate(), Err(GraphError::NodeNotFound("ghost".to_string())));
}

#[test]
fn test_conditional_needs_two_targets() {
    let mut spec = spec();
    spec.edges[1].to = EdgeTarget::One("parse".to_string());
    assert!(matches!(spec.validate(), Err(GraphError::InvalidConnection(_))));

    let mut spec = self::spec();
    spec.edges[1].to = EdgeTarget::Branch(vec!["parse".into(), "log".into(), "fetch".into()]);
    assert!(matches!(spec.validate(), Err(GraphError::InvalidConnection(_))));

    let mut spec = self::spec();
    spec.edges.remove(1);
    assert!(matches!(spec.validate(), Err(GraphError::InvalidConnection(_))));
}

#[test]
fn test_standard_node_cannot_branch() {
    let mut spec = spec();
    spec.edges[2].to = EdgeTarget::Branch(vec!["log".into(), "fetch".into()]);
    assert!(matches!(spec.validate(), Err(GraphError::InvalidConnection(_))));
}

#[test]
fn test_duplicates_rejected() {
    let mut spec = spec();
    spec.add_node(NodeEntry::new("parse", NodeKind::Standard, "doc"));
    assert_eq!(spec.validate(), Err(GraphError::DuplicateNode("parse".to_string())));

    let mut spec = self::spec();
    spec.connect("parse", "fetch");
    assert_eq!(spec.validate(), Err(GraphError::DuplicateEdge("parse".to_string())));
}
