use petgraph::dot::Dot;
use petgraph::graph::DiGraph;
use scrapecore::{EdgeEntry, EdgeTarget, GraphError, GraphNode, GraphSpec, NodeEntry, NodeKind};
use std::collections::HashMap;

/// Named steps, a successor map and an entry point.
///
/// Standard nodes follow at most one outgoing edge; conditional nodes carry
/// their two candidate successors themselves and have no edge.
pub struct Graph {
    nodes: Vec<GraphNode>,
    edges: HashMap<String, String>,
    entry_point: String,
}

impl Graph {
    /// Build and validate a graph.
    ///
    /// Fails on duplicate names, dangling references and edge collisions. An
    /// entry point that is not the first node only produces a warning.
    pub fn new<I, F, T>(
        nodes: Vec<GraphNode>,
        edges: I,
        entry_point: impl Into<String>,
    ) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (F, T)>,
        F: Into<String>,
        T: Into<String>,
    {
        let entry_point = entry_point.into();
        let mut graph = Self {
            nodes: Vec::with_capacity(nodes.len()),
            edges: HashMap::new(),
            entry_point,
        };

        for node in nodes {
            if graph.contains(node.name()) {
                return Err(GraphError::DuplicateNode(node.name().to_string()));
            }
            graph.nodes.push(node);
        }

        for (from, to) in edges {
            let (from, to) = (from.into(), to.into());
            graph.check_edge(&from, &to)?;
            graph.edges.insert(from, to);
        }

        for node in &graph.nodes {
            graph.check_candidates(node)?;
        }

        if !graph.contains(&graph.entry_point) {
            return Err(GraphError::NodeNotFound(graph.entry_point.clone()));
        }

        if graph.nodes.first().map(GraphNode::name) != Some(graph.entry_point.as_str()) {
            tracing::warn!(
                "Careful! The entry point node '{}' is different from the first node of the graph.",
                graph.entry_point
            );
        }

        Ok(graph)
    }

    /// Add `node` after the current last node, linking the two.
    ///
    /// The graph is left untouched on error.
    pub fn append_node(&mut self, node: GraphNode) -> Result<(), GraphError> {
        if self.contains(node.name()) {
            return Err(GraphError::DuplicateNode(node.name().to_string()));
        }

        let last = self
            .nodes
            .last()
            .ok_or_else(|| GraphError::Invalid("cannot append to an empty graph".to_string()))?;

        if last.kind() == NodeKind::Conditional {
            return Err(GraphError::InvalidConnection(format!(
                "cannot append after conditional node '{}'",
                last.name()
            )));
        }
        if self.edges.contains_key(last.name()) {
            return Err(GraphError::DuplicateEdge(last.name().to_string()));
        }
        self.check_candidates(&node)?;

        let from = last.name().to_string();
        self.edges.insert(from, node.name().to_string());
        self.nodes.push(node);
        Ok(())
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node(name).is_some()
    }

    pub fn successor(&self, name: &str) -> Option<&str> {
        self.edges.get(name).map(String::as_str)
    }

    /// Successor-map edges, in node order.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.nodes
            .iter()
            .filter_map(|n| self.successor(n.name()).map(|to| (n.name(), to)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Describe this graph in the interchange format.
    pub fn to_spec(&self) -> GraphSpec {
        let mut spec = GraphSpec::new(self.entry_point.clone());

        for node in &self.nodes {
            let node_spec = node.spec();
            let mut entry = NodeEntry::new(node.name(), node.kind(), node_spec.input.as_str())
                .with_step(node.node_type())
                .with_output(node_spec.output.iter().cloned());
            if node_spec.min_inputs != 1 {
                entry = entry.with_arg("min_inputs", node_spec.min_inputs as u64);
            }
            for (key, value) in &node_spec.config {
                entry = entry.with_arg(key.clone(), value.to_json());
            }
            entry.returns = serde_json::json!({ "output": node_spec.output });
            spec.add_node(entry);

            match node.candidates() {
                Some((on_true, on_false)) => {
                    spec.edges.push(EdgeEntry {
                        from: node.name().to_string(),
                        to: EdgeTarget::Branch(vec![on_true.to_string(), on_false.to_string()]),
                    });
                }
                None => {
                    if let Some(to) = self.successor(node.name()) {
                        spec.connect(node.name(), to);
                    }
                }
            }
        }

        spec
    }

    /// Render as Graphviz DOT. Conditional edges are labelled `true`/`false`.
    pub fn to_dot(&self) -> String {
        let mut graph: DiGraph<String, &'static str> = DiGraph::new();
        let index: HashMap<&str, _> = self
            .nodes
            .iter()
            .map(|n| (n.name(), graph.add_node(format!("{} ({})", n.name(), n.node_type()))))
            .collect();

        for node in &self.nodes {
            let Some(&from) = index.get(node.name()) else {
                continue;
            };
            let targets: Vec<(&str, &'static str)> = match node.candidates() {
                Some((on_true, on_false)) => vec![(on_true, "true"), (on_false, "false")],
                None => self.successor(node.name()).map(|to| (to, "")).into_iter().collect(),
            };
            for (to, label) in targets {
                if let Some(&to) = index.get(to) {
                    graph.add_edge(from, to, label);
                }
            }
        }

        format!("{}", Dot::new(&graph))
    }

    fn check_edge(&self, from: &str, to: &str) -> Result<(), GraphError> {
        let source = self
            .node(from)
            .ok_or_else(|| GraphError::NodeNotFound(from.to_string()))?;
        if !self.contains(to) {
            return Err(GraphError::NodeNotFound(to.to_string()));
        }
        if source.kind() == NodeKind::Conditional {
            return Err(GraphError::InvalidConnection(format!(
                "conditional node '{}' routes through its candidates, not edges",
                from
            )));
        }
        if self.edges.contains_key(from) {
            return Err(GraphError::DuplicateEdge(from.to_string()));
        }
        Ok(())
    }

    fn check_candidates(&self, node: &GraphNode) -> Result<(), GraphError> {
        if let Some((on_true, on_false)) = node.candidates() {
            for candidate in [on_true, on_false] {
                if !self.contains(candidate) {
                    return Err(GraphError::NodeNotFound(candidate.to_string()));
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes)
            .field("edges", &self.edges())
            .field("entry_point", &self.entry_point)
            .finish()
    }
}
