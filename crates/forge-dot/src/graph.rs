use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Open attribute map. One value per key, iterated in key order.
pub type Attrs = BTreeMap<String, String>;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub attrs: Attrs,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attrs: Attrs::new(),
        }
    }

    pub fn with_attrs<K, V>(mut self, attrs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.attrs
            .extend(attrs.into_iter().map(|(key, value)| (key.into(), value.into())));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Empty until assigned; every parsed edge carries one.
    #[serde(default)]
    pub id: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub attrs: Attrs,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            from: from.into(),
            to: to.into(),
            attrs: Attrs::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_attrs<K, V>(mut self, attrs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.attrs
            .extend(attrs.into_iter().map(|(key, value)| (key.into(), value.into())));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// `"<from>-><to>"`, independent of any assigned ID.
    pub fn stable_id(&self) -> String {
        format!("{}->{}", self.from, self.to)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subgraph {
    /// Rendered identifier; may differ from `name` for graphs built outside the parser.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub node_ids: Vec<String>,
    #[serde(default)]
    pub node_defaults: Attrs,
}

impl Subgraph {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            ..Self::default()
        }
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.node_ids.iter().any(|id| id == node_id)
    }

    pub(crate) fn add_member(&mut self, node_id: &str) {
        if !self.contains(node_id) {
            self.node_ids.push(node_id.to_string());
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub name: String,
    #[serde(default)]
    pub nodes: BTreeMap<String, Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub node_defaults: Attrs,
    #[serde(default)]
    pub edge_defaults: Attrs,
    #[serde(default)]
    pub subgraphs: Vec<Subgraph>,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Inserts the node, replacing any node with the same ID.
    pub fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn find_node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn find_edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|edge| !edge.id.is_empty() && edge.id == id)
    }

    pub fn outgoing_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.from == node_id)
    }

    pub fn incoming_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.to == node_id)
    }

    /// First node (in ID order) shaped `Mdiamond`, falling back to a
    /// `node_type`/`type` of `start`.
    pub fn find_start_node(&self) -> Option<&Node> {
        self.find_marked_node("Mdiamond", "start")
    }

    /// First node (in ID order) shaped `Msquare`, falling back to a
    /// `node_type`/`type` of `exit`.
    pub fn find_exit_node(&self) -> Option<&Node> {
        self.find_marked_node("Msquare", "exit")
    }

    fn find_marked_node(&self, shape: &str, node_type: &str) -> Option<&Node> {
        self.nodes
            .values()
            .find(|node| node.attr("shape") == Some(shape))
            .or_else(|| {
                self.nodes.values().find(|node| {
                    node.attr("node_type") == Some(node_type) || node.attr("type") == Some(node_type)
                })
            })
    }

    /// All node IDs, sorted.
    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    /// Gives every edge with an empty ID its stable ID, suffixing `#<n>` from
    /// the second occurrence of the same endpoints on. Pre-set IDs are kept
    /// and do not count as occurrences. A candidate already taken by any
    /// edge is skipped, so IDs stay unique even when node IDs contain `#`.
    pub fn assign_edge_ids(&mut self) {
        let mut taken: BTreeSet<String> = self
            .edges
            .iter()
            .filter(|edge| !edge.id.is_empty())
            .map(|edge| edge.id.clone())
            .collect();
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();

        for edge in self.edges.iter_mut().filter(|edge| edge.id.is_empty()) {
            let key = edge.stable_id();
            let count = counts.entry(key.clone()).or_insert(0);
            loop {
                *count += 1;
                let candidate = if *count == 1 {
                    key.clone()
                } else {
                    format!("{key}#{count}")
                };
                if taken.insert(candidate.clone()) {
                    edge.id = candidate;
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> Graph {
        let mut graph = Graph::new("G");
        graph.add_node(Node::new("a"));
        graph.add_node(Node::new("b"));
        graph.add_node(Node::new("c"));
        graph.add_edge(Edge::new("a", "b"));
        graph.add_edge(Edge::new("a", "c"));
        graph.add_edge(Edge::new("b", "c"));
        graph
    }

    #[test]
    fn add_node_same_id_expected_last_write_wins() {
        let mut graph = Graph::new("G");
        graph.add_node(Node::new("a").with_attrs([("shape", "box")]));
        graph.add_node(Node::new("a").with_attrs([("shape", "circle")]));
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(
            graph.find_node("a").and_then(|node| node.attr("shape")),
            Some("circle")
        );
        assert!(graph.find_node("missing").is_none());
    }

    #[test]
    fn outgoing_and_incoming_edges_expected_filtered_in_order() {
        let graph = sample_graph();
        let outgoing: Vec<_> = graph.outgoing_edges("a").map(|e| e.to.as_str()).collect();
        assert_eq!(outgoing, vec!["b", "c"]);
        let incoming: Vec<_> = graph.incoming_edges("c").map(|e| e.from.as_str()).collect();
        assert_eq!(incoming, vec!["a", "b"]);
        assert_eq!(graph.outgoing_edges("c").count(), 0);
    }

    #[test]
    fn find_start_and_exit_node_expected_shape_then_type_fallback() {
        let mut graph = Graph::new("G");
        graph.add_node(Node::new("begin").with_attrs([("type", "start")]));
        graph.add_node(Node::new("finish").with_attrs([("node_type", "exit")]));
        assert_eq!(graph.find_start_node().map(|n| n.id.as_str()), Some("begin"));
        assert_eq!(graph.find_exit_node().map(|n| n.id.as_str()), Some("finish"));

        graph.add_node(Node::new("zeta").with_attrs([("shape", "Mdiamond")]));
        assert_eq!(graph.find_start_node().map(|n| n.id.as_str()), Some("zeta"));

        let empty = Graph::new("G");
        assert!(empty.find_start_node().is_none());
        assert!(empty.find_exit_node().is_none());
    }

    #[test]
    fn node_ids_expected_sorted() {
        let mut graph = Graph::new("G");
        for id in ["zeta", "alpha", "Mid"] {
            graph.add_node(Node::new(id));
        }
        assert_eq!(graph.node_ids(), vec!["Mid", "alpha", "zeta"]);
    }

    #[test]
    fn stable_id_expected_endpoint_format_ignoring_assigned_id() {
        let edge = Edge::new("a", "b").with_id("custom");
        assert_eq!(edge.stable_id(), "a->b");
    }

    #[test]
    fn assign_edge_ids_duplicates_expected_numeric_suffix() {
        let mut graph = Graph::new("G");
        graph.add_edge(Edge::new("a", "b"));
        graph.add_edge(Edge::new("a", "b"));
        graph.add_edge(Edge::new("b", "a"));
        graph.add_edge(Edge::new("a", "b"));
        graph.assign_edge_ids();

        let ids: Vec<_> = graph.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a->b", "a->b#2", "b->a", "a->b#3"]);
        assert_eq!(graph.find_edge("a->b#2").map(|e| e.from.as_str()), Some("a"));
    }

    #[test]
    fn assign_edge_ids_preserves_existing_expected_untouched_and_uncounted() {
        let mut graph = Graph::new("G");
        graph.add_edge(Edge::new("a", "b").with_id("custom"));
        graph.add_edge(Edge::new("a", "b"));
        graph.assign_edge_ids();

        assert_eq!(graph.edges[0].id, "custom");
        assert_eq!(graph.edges[1].id, "a->b");
    }

    #[test]
    fn assign_edge_ids_collision_with_preset_expected_unique() {
        let mut graph = Graph::new("G");
        graph.add_edge(Edge::new("x", "y").with_id("a->b"));
        graph.add_edge(Edge::new("a", "b"));
        graph.assign_edge_ids();

        assert_eq!(graph.edges[0].id, "a->b");
        assert_eq!(graph.edges[1].id, "a->b#2");
    }

    #[test]
    fn assign_edge_ids_generated_suffix_matches_node_id_expected_unique() {
        let mut graph = Graph::new("G");
        graph.add_edge(Edge::new("a", "b"));
        graph.add_edge(Edge::new("a", "b"));
        graph.add_edge(Edge::new("a", "b#2"));
        graph.assign_edge_ids();

        let ids: Vec<_> = graph.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a->b", "a->b#2", "a->b#2#2"]);
        let unique: BTreeSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn assign_edge_ids_empty_graph_expected_noop() {
        let mut graph = Graph::new("G");
        graph.assign_edge_ids();
        assert!(graph.edges.is_empty());
    }
}
