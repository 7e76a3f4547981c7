//! Canonical DOT rendering.
//!
//! Output depends only on the graph value: nodes are sorted by ID, attributes
//! by key, and edges/subgraphs keep their stored order. Everything emitted
//! parses back through [`crate::parse`].

use crate::{Attrs, Graph, KEYWORDS};

const INDENT: &str = "  ";

pub fn serialize(graph: &Graph) -> String {
    let mut out = String::new();
    out.push_str(&format!("digraph {} {{\n", quote_id(&graph.name)));

    let header_blocks = [
        ("graph", &graph.attrs),
        ("node", &graph.node_defaults),
        ("edge", &graph.edge_defaults),
    ];
    let mut wrote_header = false;
    for (keyword, attrs) in header_blocks {
        if !attrs.is_empty() {
            out.push_str(&format!("{INDENT}{keyword} [{}]\n", format_attrs(attrs)));
            wrote_header = true;
        }
    }
    if wrote_header {
        out.push('\n');
    }

    for (id, node) in &graph.nodes {
        write_statement(&mut out, 1, &quote_id(id), &node.attrs);
    }

    if !graph.nodes.is_empty() && !graph.subgraphs.is_empty() {
        out.push('\n');
    }

    for subgraph in &graph.subgraphs {
        let header = if subgraph.id.is_empty() {
            &subgraph.name
        } else {
            &subgraph.id
        };
        out.push_str(&format!("{INDENT}subgraph {} {{\n", quote_id(header)));
        for (key, value) in &subgraph.attrs {
            out.push_str(&format!(
                "{INDENT}{INDENT}{}={}\n",
                quote_key(key),
                quote_value(value)
            ));
        }
        if !subgraph.node_defaults.is_empty() {
            out.push_str(&format!(
                "{INDENT}{INDENT}node [{}]\n",
                format_attrs(&subgraph.node_defaults)
            ));
        }
        for node_id in &subgraph.node_ids {
            out.push_str(&format!("{INDENT}{INDENT}{}\n", quote_id(node_id)));
        }
        out.push_str(&format!("{INDENT}}}\n"));
    }

    if (!graph.nodes.is_empty() || !graph.subgraphs.is_empty()) && !graph.edges.is_empty() {
        out.push('\n');
    }

    for edge in &graph.edges {
        let endpoints = format!("{} -> {}", quote_id(&edge.from), quote_id(&edge.to));
        write_statement(&mut out, 1, &endpoints, &edge.attrs);
    }

    out.push_str("}\n");
    out
}

fn write_statement(out: &mut String, depth: usize, head: &str, attrs: &Attrs) {
    let indent = INDENT.repeat(depth);
    if attrs.is_empty() {
        out.push_str(&format!("{indent}{head}\n"));
    } else {
        out.push_str(&format!("{indent}{head} [{}]\n", format_attrs(attrs)));
    }
}

/// `key=value` pairs in key order, comma-space separated.
pub fn format_attrs(attrs: &Attrs) -> String {
    attrs
        .iter()
        .map(|(key, value)| format!("{}={}", quote_key(key), quote_value(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders an attribute value bare when the lexer reads it back as a single
/// token with the same text, quoted and escaped otherwise.
pub fn quote_value(value: &str) -> String {
    if is_bare_identifier(value) {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Graph, node and subgraph identifiers. Reserved words are always quoted.
pub fn quote_id(id: &str) -> String {
    if is_reserved(id) {
        let mut quoted = String::with_capacity(id.len() + 2);
        quoted.push('"');
        quoted.push_str(id);
        quoted.push('"');
        return quoted;
    }
    quote_value(id)
}

/// Attribute keys keep their case; anything that would not lex back as a
/// plain identifier is quoted.
fn quote_key(key: &str) -> String {
    let plain = key
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && key.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        && !is_reserved(key);
    if plain { key.to_string() } else { quote_id(key) }
}

fn is_reserved(word: &str) -> bool {
    KEYWORDS.iter().any(|(keyword, _)| *keyword == word)
}

/// Numeric (`-?\d+(\.\d+)?`) or made of lowercase ASCII letters, digits and
/// underscores without a leading digit.
pub fn is_bare_identifier(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    if is_numeric(value) {
        return true;
    }
    let starts_with_digit = value.chars().next().is_some_and(|ch| ch.is_ascii_digit());
    !starts_with_digit
        && value
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
}

fn is_numeric(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits, None),
    };
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    all_digits(whole) && fraction.is_none_or(all_digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Edge, Node, Subgraph, parse};
    use pretty_assertions::assert_eq;

    #[test]
    fn quote_value_expected_bare_or_escaped() {
        let cases = [
            ("", r#""""#),
            ("box", "box"),
            ("my_shape", "my_shape"),
            ("node1", "node1"),
            ("filled", "filled"),
            ("42", "42"),
            ("3.14", "3.14"),
            ("-1", "-1"),
            ("0.75", "0.75"),
            ("true", "true"),
            ("My Node", r#""My Node""#),
            ("Mdiamond", r#""Mdiamond""#),
            ("#ADD8E6", r##""#ADD8E6""##),
            ("a,b", r#""a,b""#),
            ("a=b", r#""a=b""#),
            ("path/to", r#""path/to""#),
            (r#"say "hi""#, r#""say \"hi\"""#),
            (r"path\to", r#""path\\to""#),
            ("line1\nline2", r#""line1\nline2""#),
            ("col1\tcol2", r#""col1\tcol2""#),
            ("1a", r#""1a""#),
            ("1.", r#""1.""#),
            (".5", r#"".5""#),
            ("1.2.3", r#""1.2.3""#),
        ];
        for (input, expected) in cases {
            assert_eq!(quote_value(input), expected, "quote_value({input:?})");
        }
    }

    #[test]
    fn quote_id_reserved_words_expected_quoted() {
        assert_eq!(quote_id("node"), r#""node""#);
        assert_eq!(quote_id("true"), r#""true""#);
        assert_eq!(quote_id("nodes"), "nodes");
    }

    #[test]
    fn serialize_empty_graph_expected_header_and_footer() {
        assert_eq!(serialize(&Graph::new("empty")), "digraph empty {\n}\n");
        assert_eq!(serialize(&Graph::new("My Graph")), "digraph \"My Graph\" {\n}\n");
    }

    #[test]
    fn serialize_full_layout_expected_canonical_text() {
        let mut graph = Graph::new("pipeline");
        graph.attrs.insert("goal".into(), "Run tests".into());
        graph.node_defaults.insert("style".into(), "filled".into());
        graph.edge_defaults.insert("fontsize".into(), "10".into());
        graph.add_node(Node::new("start").with_attrs([("shape", "Mdiamond"), ("label", "Start")]));
        graph.add_node(Node::new("process").with_attrs([("shape", "box")]));
        graph.add_node(Node::new("end"));
        graph.add_edge(Edge::new("start", "process"));
        graph.add_edge(Edge::new("process", "end").with_attrs([("label", "done")]));
        let mut subgraph = Subgraph::new("main");
        subgraph.id = "cluster_main".to_string();
        subgraph.attrs.insert("label".into(), "Main Flow".into());
        subgraph.attrs.insert("style".into(), "dashed".into());
        subgraph.node_defaults.insert("color".into(), "blue".into());
        subgraph.node_ids = vec!["process".into()];
        graph.subgraphs.push(subgraph);

        let expected = "\
digraph pipeline {
  graph [goal=\"Run tests\"]
  node [style=filled]
  edge [fontsize=10]

  end
  process [shape=box]
  start [label=\"Start\", shape=\"Mdiamond\"]

  subgraph cluster_main {
    label=\"Main Flow\"
    style=dashed
    node [color=blue]
    process
  }

  start -> process
  process -> end [label=done]
}
";
        assert_eq!(serialize(&graph), expected);
    }

    #[test]
    fn serialize_edges_only_expected_no_leading_blank_line() {
        let mut graph = Graph::new("g");
        graph.add_edge(Edge::new("a", "b"));
        assert_eq!(serialize(&graph), "digraph g {\n  a -> b\n}\n");
    }

    #[test]
    fn serialize_round_trip_expected_same_graph() {
        let source = r#"
            digraph "Release Flow" {
                graph [goal="Ship it", rankdir=LR]
                node [shape=box]
                edge [weight=2]
                start [shape=Mdiamond, label="Start"]
                "review step" [prompt="Check \"quality\"\n\tthen report"]
                subgraph cluster_loop {
                    label = "Loop Alpha"
                    node [timeout="900s"]
                    work
                }
                done [shape=Msquare]
                start -> "review step" -> work -> done [label="next"]
                work -> work
                work -> work
            }
        "#;
        let graph = parse(source).expect("graph should parse");
        let rendered = serialize(&graph);
        let reparsed = parse(&rendered).expect("serialized graph should parse");

        assert_eq!(reparsed.nodes, graph.nodes);
        assert_eq!(reparsed.edges, graph.edges);
        assert_eq!(reparsed.attrs, graph.attrs);
        assert_eq!(reparsed.node_defaults, graph.node_defaults);
        assert_eq!(reparsed.edge_defaults, graph.edge_defaults);
        assert_eq!(reparsed.subgraphs, graph.subgraphs);
        assert_eq!(serialize(&reparsed), rendered);
    }
}
