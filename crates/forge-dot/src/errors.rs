use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated string starting at line {line}, col {col}")]
    UnterminatedString { line: usize, col: usize },
    #[error("unterminated block comment starting at line {line}, col {col}")]
    UnterminatedBlockComment { line: usize, col: usize },
    #[error("unexpected character {ch:?} at line {line}, col {col}")]
    UnexpectedCharacter { ch: char, line: usize, col: usize },
}

impl LexError {
    /// Line and column (both 1-based) where the failure was detected.
    pub fn position(&self) -> (usize, usize) {
        match self {
            Self::UnterminatedString { line, col }
            | Self::UnterminatedBlockComment { line, col }
            | Self::UnexpectedCharacter { line, col, .. } => (*line, *col),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("expected 'digraph' keyword, found {found} at line {line}, col {col}")]
    MissingDigraph {
        found: String,
        line: usize,
        col: usize,
    },
    #[error("strict modifier not supported (line {line}, col {col})")]
    StrictNotSupported { line: usize, col: usize },
    #[error("undirected edge '--' not supported at line {line}, col {col}; use '->'")]
    UndirectedEdge { line: usize, col: usize },
    #[error("multiple digraphs not supported (second digraph at line {line}, col {col})")]
    MultipleDigraphs { line: usize, col: usize },
    #[error("subgraphs nested deeper than {max} levels at line {line}, col {col}")]
    NestingTooDeep { max: usize, line: usize, col: usize },
    #[error("unexpected token {found} at line {line}, col {col}: expected {expected}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
        col: usize,
    },
}

impl ParseError {
    pub fn position(&self) -> (usize, usize) {
        match self {
            Self::Lex(error) => error.position(),
            Self::MissingDigraph { line, col, .. }
            | Self::StrictNotSupported { line, col }
            | Self::UndirectedEdge { line, col }
            | Self::MultipleDigraphs { line, col }
            | Self::NestingTooDeep { line, col, .. }
            | Self::UnexpectedToken { line, col, .. } => (*line, *col),
        }
    }
}
