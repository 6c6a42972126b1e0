mod common;

use common::*;
use scrapecore::{GraphError, NodeKind};
use scraperuntime::Graph;

#[test]
fn test_builds_successor_map() {
    let v = visits();
    let graph = Graph::new(
        vec![write("a", "x", &v), write("b", "y", &v), write("c", "z", &v)],
        [("a", "b"), ("b", "c")],
        "a",
    )
    .unwrap();

    assert_eq!(graph.len(), 3);
    assert_eq!(graph.entry_point(), "a");
    assert_eq!(graph.successor("a"), Some("b"));
    assert_eq!(graph.successor("c"), None);
    assert_eq!(graph.edges(), vec![("a", "b"), ("b", "c")]);
}

#[test]
fn test_append_links_previous_last_node() {
    let v = visits();
    let mut graph = Graph::new(vec![write("a", "x", &v), write("b", "y", &v)], [("a", "b")], "a").unwrap();

    graph.append_node(write("c", "z", &v)).unwrap();
    assert_eq!(graph.edges(), vec![("a", "b"), ("b", "c")]);
    assert_eq!(graph.nodes().last().map(|n| n.name()), Some("c"));
}

#[test]
fn test_append_duplicate_leaves_graph_untouched() {
    let v = visits();
    let mut graph = Graph::new(vec![write("a", "x", &v), write("b", "y", &v)], [("a", "b")], "a").unwrap();

    let err = graph.append_node(write("b", "other", &v)).unwrap_err();
    assert_eq!(err, GraphError::DuplicateNode("b".to_string()));
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.edges(), vec![("a", "b")]);
}

#[test]
fn test_append_after_conditional_is_rejected() {
    let v = visits();
    let mut graph = Graph::new(
        vec![write("a", "x", &v), write("b", "y", &v), flag("check", "a", "b", &v)],
        [("a", "check")],
        "a",
    )
    .unwrap();

    let err = graph.append_node(write("c", "z", &v)).unwrap_err();
    assert!(matches!(err, GraphError::InvalidConnection(_)));
    assert_eq!(graph.len(), 3);
}

#[test]
fn test_construction_errors() {
    let v = visits();

    let err = Graph::new(vec![write("a", "x", &v), write("a", "y", &v)], Vec::<(&str, &str)>::new(), "a").unwrap_err();
    assert_eq!(err, GraphError::DuplicateNode("a".to_string()));

    let err = Graph::new(vec![write("a", "x", &v)], [("a", "ghost")], "a").unwrap_err();
    assert_eq!(err, GraphError::NodeNotFound("ghost".to_string()));

    let err = Graph::new(vec![write("a", "x", &v)], [("ghost", "a")], "a").unwrap_err();
    assert_eq!(err, GraphError::NodeNotFound("ghost".to_string()));

    let err = Graph::new(vec![write("a", "x", &v)], Vec::<(&str, &str)>::new(), "missing").unwrap_err();
    assert_eq!(err, GraphError::NodeNotFound("missing".to_string()));

    let err = Graph::new(
        vec![write("a", "x", &v), write("b", "y", &v), write("c", "z", &v)],
        [("a", "b"), ("a", "c")],
        "a",
    )
    .unwrap_err();
    assert_eq!(err, GraphError::DuplicateEdge("a".to_string()));

    let err = Graph::new(vec![flag("check", "yes", "no", &v)], Vec::<(&str, &str)>::new(), "check").unwrap_err();
    assert_eq!(err, GraphError::NodeNotFound("yes".to_string()));

    let err = Graph::new(
        vec![flag("check", "a", "a", &v), write("a", "x", &v)],
        [("check", "a")],
        "check",
    )
    .unwrap_err();
    assert!(matches!(err, GraphError::InvalidConnection(_)));
}

#[test]
fn test_entry_point_not_first_is_only_a_warning() {
    let v = visits();
    let graph = Graph::new(vec![write("a", "x", &v), write("b", "y", &v)], [("b", "a")], "b");
    assert!(graph.is_ok());
}

#[test]
fn test_exports_interchange_spec() {
    let v = visits();
    let graph = Graph::new(
        vec![write("a", "x", &v), flag("check", "b", "c", &v), write("b", "y", &v), write("c", "z", &v)],
        [("a", "check"), ("b", "c")],
        "a",
    )
    .unwrap();

    let spec = graph.to_spec();
    spec.validate().unwrap();
    assert_eq!(spec.entry_point, "a");
    assert_eq!(spec.nodes.len(), 4);
    assert_eq!(spec.nodes[1].node_type, NodeKind::Conditional);
    assert_eq!(spec.nodes[0].step_type(), "test.write");
    assert_eq!(spec.branches_of("check"), Some(["b".to_string(), "c".to_string()]));

    let rebuilt = spec.nodes[0].to_node_spec().unwrap();
    assert_eq!(rebuilt.input.as_str(), "seed | doc");
    assert_eq!(rebuilt.output, vec!["x"]);
}

#[test]
fn test_dot_labels_branches() {
    let v = visits();
    let graph = Graph::new(
        vec![write("a", "x", &v), flag("check", "b", "c", &v), write("b", "y", &v), write("c", "z", &v)],
        [("a", "check")],
        "a",
    )
    .unwrap();

    let dot = graph.to_dot();
    assert!(dot.starts_with("digraph"));
    assert!(dot.contains("check (test.flag)"));
    assert!(dot.contains("\"true\""));
    assert!(dot.contains("\"false\""));
}
