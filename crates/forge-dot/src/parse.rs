//! Recursive-descent parser for the pipeline DOT dialect.
//!
//! Accepts a single `digraph` and builds a [`Graph`]. `node` defaults are
//! scoped to the enclosing subgraph, `edge` defaults are graph-wide.
//! Subgraph members get a `class` attribute derived from the subgraph label.
//! Edge IDs are assigned once the body closes.

use crate::{Attrs, Edge, Graph, Node, ParseError, Subgraph, Token, TokenType, lex};

/// Deepest subgraph nesting accepted before parsing fails.
pub const MAX_NESTING: usize = 256;

#[derive(Clone, Debug, Default)]
struct Scope {
    node_defaults: Attrs,
}

#[derive(Debug)]
struct ParseState {
    tokens: Vec<Token>,
    index: usize,
    graph: Graph,
    open_subgraphs: Vec<Subgraph>,
}

pub fn parse(source: &str) -> Result<Graph, ParseError> {
    let tokens = lex(source)?;
    let mut state = ParseState::new(tokens);
    state.parse_graph()?;

    let mut graph = state.graph;
    graph.assign_edge_ids();
    tracing::debug!(
        graph = %graph.name,
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        subgraphs = graph.subgraphs.len(),
        "parsed DOT graph"
    );
    Ok(graph)
}

impl ParseState {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            index: 0,
            graph: Graph::default(),
            open_subgraphs: Vec::new(),
        }
    }

    fn parse_graph(&mut self) -> Result<(), ParseError> {
        let first = self.peek().clone();
        if first.kind == TokenType::Identifier && first.value == "strict" {
            return Err(ParseError::StrictNotSupported {
                line: first.line,
                col: first.col,
            });
        }
        if first.kind != TokenType::Digraph {
            return Err(ParseError::MissingDigraph {
                found: first.describe(),
                line: first.line,
                col: first.col,
            });
        }
        self.advance();

        if is_id_token(self.peek_kind()) {
            self.graph.name = self.advance().value;
        }
        self.expect(TokenType::LBrace, "'{' to open the digraph body")?;

        let mut scope = Scope::default();
        self.parse_body(&mut scope)?;

        let trailing = self.peek().clone();
        match trailing.kind {
            TokenType::Eof => Ok(()),
            TokenType::Digraph => Err(ParseError::MultipleDigraphs {
                line: trailing.line,
                col: trailing.col,
            }),
            _ => Err(unexpected(&trailing, "end of input")),
        }
    }

    /// Parses statements up to and including the closing `}`.
    fn parse_body(&mut self, scope: &mut Scope) -> Result<(), ParseError> {
        loop {
            match self.peek_kind() {
                TokenType::RBrace => {
                    self.advance();
                    return Ok(());
                }
                TokenType::Eof => return Err(unexpected(self.peek(), "'}'")),
                TokenType::Semicolon => {
                    self.advance();
                }
                _ => self.parse_statement(scope)?,
            }
        }
    }

    fn parse_statement(&mut self, scope: &mut Scope) -> Result<(), ParseError> {
        match self.peek_kind() {
            TokenType::Graph => {
                self.advance();
                let attrs = self.parse_attr_list()?;
                self.target_attrs().extend(attrs);
                Ok(())
            }
            TokenType::Node => {
                self.advance();
                let attrs = self.parse_attr_list()?;
                scope.node_defaults.extend(attrs.clone());
                match self.open_subgraphs.last_mut() {
                    Some(subgraph) => subgraph.node_defaults.extend(attrs),
                    None => self.graph.node_defaults.extend(attrs),
                }
                Ok(())
            }
            TokenType::Edge => {
                self.advance();
                let attrs = self.parse_attr_list()?;
                self.graph.edge_defaults.extend(attrs);
                Ok(())
            }
            TokenType::Subgraph => {
                self.check_nesting()?;
                self.advance();
                let name = if is_id_token(self.peek_kind()) {
                    self.advance().value
                } else {
                    String::new()
                };
                self.expect(TokenType::LBrace, "'{' to open the subgraph body")?;
                self.parse_subgraph(name, scope)
            }
            TokenType::LBrace => {
                self.check_nesting()?;
                self.advance();
                self.parse_subgraph(String::new(), scope)
            }
            kind if is_id_token(kind) => self.parse_id_statement(scope),
            _ => Err(unexpected(self.peek(), "a statement")),
        }
    }

    fn check_nesting(&self) -> Result<(), ParseError> {
        if self.open_subgraphs.len() < MAX_NESTING {
            return Ok(());
        }
        let token = self.peek();
        Err(ParseError::NestingTooDeep {
            max: MAX_NESTING,
            line: token.line,
            col: token.col,
        })
    }

    fn parse_subgraph(&mut self, name: String, parent: &Scope) -> Result<(), ParseError> {
        let mut scope = parent.clone();
        self.open_subgraphs.push(Subgraph::new(name));
        self.parse_body(&mut scope)?;

        let Some(subgraph) = self.open_subgraphs.pop() else {
            return Ok(());
        };
        if let Some(class_name) = subgraph.attrs.get("label").and_then(|l| derive_class(l)) {
            for node_id in &subgraph.node_ids {
                if let Some(node) = self.graph.nodes.get_mut(node_id) {
                    node.attrs
                        .entry("class".to_string())
                        .or_insert_with(|| class_name.clone());
                }
            }
        }
        self.graph.subgraphs.push(subgraph);
        Ok(())
    }

    /// Statements that start with an identifier: `key = value`, edge chains,
    /// and node declarations.
    fn parse_id_statement(&mut self, scope: &Scope) -> Result<(), ParseError> {
        let first = self.advance();

        match self.peek_kind() {
            TokenType::Equals if first.kind != TokenType::Number => {
                self.advance();
                let value = self.parse_value()?;
                self.target_attrs().insert(first.value, value);
                Ok(())
            }
            TokenType::Arrow => self.parse_edge_chain(first.value, scope),
            TokenType::Minus => Err(self.undirected_or_unexpected()),
            _ => {
                let attrs = if self.peek_kind() == TokenType::LBracket {
                    self.parse_attr_list()?
                } else {
                    Attrs::new()
                };
                self.declare_node(&first.value, attrs, scope);
                Ok(())
            }
        }
    }

    fn parse_edge_chain(&mut self, first: String, scope: &Scope) -> Result<(), ParseError> {
        let mut chain = vec![first];
        while self.peek_kind() == TokenType::Arrow {
            self.advance();
            let next = self.peek().clone();
            if !is_id_token(next.kind) {
                return Err(unexpected(&next, "a node identifier after '->'"));
            }
            self.advance();
            chain.push(next.value);
            if self.peek_kind() == TokenType::Minus {
                return Err(self.undirected_or_unexpected());
            }
        }

        let explicit = if self.peek_kind() == TokenType::LBracket {
            self.parse_attr_list()?
        } else {
            Attrs::new()
        };
        let mut attrs = self.graph.edge_defaults.clone();
        attrs.extend(explicit);

        for node_id in &chain {
            self.ensure_node(node_id, scope);
        }
        for pair in chain.windows(2) {
            self.graph
                .add_edge(Edge::new(pair[0].clone(), pair[1].clone()).with_attrs(attrs.clone()));
        }
        Ok(())
    }

    fn declare_node(&mut self, node_id: &str, explicit: Attrs, scope: &Scope) {
        match self.graph.nodes.get_mut(node_id) {
            Some(node) => {
                for (key, value) in &scope.node_defaults {
                    node.attrs
                        .entry(key.clone())
                        .or_insert_with(|| value.clone());
                }
                node.attrs.extend(explicit);
            }
            None => {
                let mut attrs = scope.node_defaults.clone();
                attrs.extend(explicit);
                self.graph.add_node(Node::new(node_id).with_attrs(attrs));
            }
        }
        self.register_member(node_id);
    }

    /// Edge endpoints: created with the active defaults when missing.
    fn ensure_node(&mut self, node_id: &str, scope: &Scope) {
        if !self.graph.nodes.contains_key(node_id) {
            self.graph
                .add_node(Node::new(node_id).with_attrs(scope.node_defaults.clone()));
        }
        self.register_member(node_id);
    }

    fn register_member(&mut self, node_id: &str) {
        for subgraph in &mut self.open_subgraphs {
            subgraph.add_member(node_id);
        }
    }

    fn target_attrs(&mut self) -> &mut Attrs {
        match self.open_subgraphs.last_mut() {
            Some(subgraph) => &mut subgraph.attrs,
            None => &mut self.graph.attrs,
        }
    }

    fn parse_attr_list(&mut self) -> Result<Attrs, ParseError> {
        self.expect(TokenType::LBracket, "'['")?;
        let mut attrs = Attrs::new();
        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenType::RBracket => {
                    self.advance();
                    return Ok(attrs);
                }
                TokenType::Comma | TokenType::Semicolon => {
                    self.advance();
                }
                kind if is_attr_key_token(kind) => {
                    self.advance();
                    self.expect(TokenType::Equals, "'=' after attribute key")?;
                    let value = self.parse_value()?;
                    attrs.insert(token.value, value);
                }
                _ => return Err(unexpected(&token, "an attribute key or ']'")),
            }
        }
    }

    fn parse_value(&mut self) -> Result<String, ParseError> {
        let token = self.peek().clone();
        if is_id_token(token.kind) || token.kind == TokenType::Boolean || token.kind.is_keyword() {
            self.advance();
            Ok(token.value)
        } else {
            Err(unexpected(&token, "an attribute value"))
        }
    }

    /// Called with the cursor on a `-` that follows a node identifier.
    fn undirected_or_unexpected(&self) -> ParseError {
        let minus = self.peek();
        let next = self.peek_nth(1);
        let undirected = next.kind == TokenType::Minus
            || (next.kind == TokenType::Number && next.value.starts_with('-'));
        if undirected {
            ParseError::UndirectedEdge {
                line: minus.line,
                col: minus.col,
            }
        } else {
            unexpected(minus, "'->'")
        }
    }

    fn expect(&mut self, kind: TokenType, expected: &str) -> Result<Token, ParseError> {
        if self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            Err(unexpected(self.peek(), expected))
        }
    }

    fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    fn peek_nth(&self, offset: usize) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.index + offset).min(last)]
    }

    fn peek_kind(&self) -> TokenType {
        self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
        token
    }
}

fn unexpected(token: &Token, expected: &str) -> ParseError {
    ParseError::UnexpectedToken {
        expected: expected.to_string(),
        found: token.describe(),
        line: token.line,
        col: token.col,
    }
}

fn is_id_token(kind: TokenType) -> bool {
    matches!(
        kind,
        TokenType::Identifier | TokenType::String | TokenType::Number
    )
}

fn is_attr_key_token(kind: TokenType) -> bool {
    matches!(kind, TokenType::Identifier | TokenType::String) || kind.is_keyword()
}

/// Lower-cases the label and collapses runs of non-alphanumerics into `-`.
pub fn derive_class(label: &str) -> Option<String> {
    let mut out = String::with_capacity(label.len());
    let mut pending_dash = false;
    for ch in label.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() { None } else { Some(out) }
}
