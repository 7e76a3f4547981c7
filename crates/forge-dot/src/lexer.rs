//! Tokenizer for the pipeline DOT dialect.
//!
//! Produces a flat token stream with 1-based line/column positions. The
//! stream always ends with a single [`TokenType::Eof`] token.

use crate::LexError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum TokenType {
    Eof = 0,
    Digraph = 1,
    Subgraph = 2,
    Graph = 3,
    Node = 4,
    Edge = 5,
    LBrace = 6,
    RBrace = 7,
    LBracket = 8,
    RBracket = 9,
    Arrow = 10,
    Equals = 11,
    Comma = 12,
    Semicolon = 13,
    Identifier = 14,
    String = 15,
    Number = 16,
    Boolean = 17,
    Minus = 18,
}

const TOKEN_NAMES: [&str; 19] = [
    "EOF",
    "DIGRAPH",
    "SUBGRAPH",
    "GRAPH",
    "NODE",
    "EDGE",
    "LBRACE",
    "RBRACE",
    "LBRACKET",
    "RBRACKET",
    "ARROW",
    "EQUALS",
    "COMMA",
    "SEMICOLON",
    "IDENTIFIER",
    "STRING",
    "NUMBER",
    "BOOLEAN",
    "MINUS",
];

impl TokenType {
    pub fn name(self) -> &'static str {
        TOKEN_NAMES[self as usize]
    }

    /// Renders the name for a raw discriminant, `UNKNOWN(<n>)` when out of range.
    pub fn name_of(code: u32) -> String {
        TOKEN_NAMES
            .get(code as usize)
            .map(|name| (*name).to_string())
            .unwrap_or_else(|| format!("UNKNOWN({code})"))
    }

    /// Keyword tokens double as plain names in attribute-key position.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::Digraph | Self::Subgraph | Self::Graph | Self::Node | Self::Edge
        )
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenType,
    pub value: String,
    pub line: usize,
    pub col: usize,
}

impl Token {
    pub fn new(kind: TokenType, value: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            line,
            col,
        }
    }

    /// Short human description used in parse error messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenType::Eof => "end of input".to_string(),
            TokenType::Identifier | TokenType::String | TokenType::Number | TokenType::Boolean => {
                format!("{} {:?}", self.kind, self.value)
            }
            _ => format!("'{}'", self.value),
        }
    }
}

/// Reserved words, matched case-sensitively against whole identifiers.
pub const KEYWORDS: [(&str, TokenType); 7] = [
    ("digraph", TokenType::Digraph),
    ("subgraph", TokenType::Subgraph),
    ("graph", TokenType::Graph),
    ("node", TokenType::Node),
    ("edge", TokenType::Edge),
    ("true", TokenType::Boolean),
    ("false", TokenType::Boolean),
];

fn keyword_type(word: &str) -> Option<TokenType> {
    KEYWORDS
        .iter()
        .find(|(keyword, _)| *keyword == word)
        .map(|(_, kind)| *kind)
}

pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let tokens = Lexer::new(source).run()?;
    tracing::trace!(tokens = tokens.len(), "lexed DOT source");
    Ok(tokens)
}

struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: usize,
    col: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            index: 0,
            line: 1,
            col: 1,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        loop {
            self.skip_trivia()?;
            let Some(current) = self.peek() else {
                break;
            };
            let (line, col) = (self.line, self.col);

            match current {
                '{' => self.single(TokenType::LBrace, line, col),
                '}' => self.single(TokenType::RBrace, line, col),
                '[' => self.single(TokenType::LBracket, line, col),
                ']' => self.single(TokenType::RBracket, line, col),
                '=' => self.single(TokenType::Equals, line, col),
                ',' => self.single(TokenType::Comma, line, col),
                ';' => self.single(TokenType::Semicolon, line, col),
                '"' => self.string(line, col)?,
                '-' => match self.peek_at(1) {
                    Some('>') => {
                        self.bump();
                        self.bump();
                        self.push(TokenType::Arrow, "->", line, col);
                    }
                    Some(next) if next.is_ascii_digit() => self.number(line, col),
                    _ => self.single(TokenType::Minus, line, col),
                },
                ch if ch.is_ascii_digit() => self.number(line, col),
                ch if ch.is_ascii_alphabetic() || ch == '_' => self.identifier(line, col),
                ch => return Err(LexError::UnexpectedCharacter { ch, line, col }),
            }
        }

        let (line, col) = (self.line, self.col);
        self.push(TokenType::Eof, "", line, col);
        Ok(self.tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.index += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn push(&mut self, kind: TokenType, value: impl Into<String>, line: usize, col: usize) {
        self.tokens.push(Token::new(kind, value, line, col));
    }

    fn single(&mut self, kind: TokenType, line: usize, col: usize) {
        if let Some(ch) = self.bump() {
            self.push(kind, ch.to_string(), line, col);
        }
    }

    fn skip_trivia(&mut self) -> Result<(), LexError> {
        while let Some(current) = self.peek() {
            match (current, self.peek_at(1)) {
                (' ' | '\t' | '\r' | '\n', _) => {
                    self.bump();
                }
                ('/', Some('/')) => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                ('/', Some('*')) => {
                    let (line, col) = (self.line, self.col);
                    self.bump();
                    self.bump();
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some('*'), Some('/')) => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            (Some(_), _) => {
                                self.bump();
                            }
                            (None, _) => {
                                return Err(LexError::UnterminatedBlockComment { line, col });
                            }
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn string(&mut self, line: usize, col: usize) -> Result<(), LexError> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(LexError::UnterminatedString { line, col }),
                Some('"') => break,
                Some('\\') => match self.bump() {
                    None => return Err(LexError::UnterminatedString { line, col }),
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                },
                Some(ch) => value.push(ch),
            }
        }
        self.push(TokenType::String, value, line, col);
        Ok(())
    }

    fn number(&mut self, line: usize, col: usize) {
        let mut value = String::new();
        if self.peek() == Some('-') {
            value.push('-');
            self.bump();
        }
        self.take_digits(&mut value);
        let fraction_follows = self.peek() == Some('.')
            && self.peek_at(1).is_some_and(|ch| ch.is_ascii_digit());
        if fraction_follows {
            value.push('.');
            self.bump();
            self.take_digits(&mut value);
        }
        self.push(TokenType::Number, value, line, col);
    }

    fn take_digits(&mut self, value: &mut String) {
        while let Some(ch) = self.peek().filter(char::is_ascii_digit) {
            value.push(ch);
            self.bump();
        }
    }

    fn identifier(&mut self, line: usize, col: usize) {
        let mut value = String::new();
        while let Some(ch) = self
            .peek()
            .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        {
            value.push(ch);
            self.bump();
        }
        let kind = keyword_type(&value).unwrap_or(TokenType::Identifier);
        self.push(kind, value, line, col);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenType> {
        lex(source)
            .expect("source should lex")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn lex_empty_input_expected_single_eof() {
        let tokens = lex("").expect("empty input should lex");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenType::Eof);

        let tokens = lex("  \n\t ").expect("whitespace should lex");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenType::Eof);
    }

    #[test]
    fn lex_keywords_exact_match_expected_identifiers_otherwise() {
        assert_eq!(kinds("digraph")[0], TokenType::Digraph);
        assert_eq!(kinds("subgraph")[0], TokenType::Subgraph);
        assert_eq!(kinds("graph")[0], TokenType::Graph);
        assert_eq!(kinds("node")[0], TokenType::Node);
        assert_eq!(kinds("edge")[0], TokenType::Edge);
        assert_eq!(kinds("true")[0], TokenType::Boolean);
        assert_eq!(kinds("false")[0], TokenType::Boolean);

        for word in ["digraphs", "Digraph", "noder", "truefalse", "_private", "node123"] {
            let tokens = lex(word).expect("identifier should lex");
            assert_eq!(tokens[0].kind, TokenType::Identifier, "{word}");
            assert_eq!(tokens[0].value, word);
        }
    }

    #[test]
    fn lex_string_escapes_expected_unescaped_value() {
        let cases = [
            (r#""hello world""#, "hello world"),
            (r#""say \"hi\"""#, "say \"hi\""),
            (r#""path\\to""#, "path\\to"),
            (r#""line1\nline2""#, "line1\nline2"),
            (r#""col1\tcol2""#, "col1\tcol2"),
            (r#""test\xvalue""#, "test\\xvalue"),
            (r#""""#, ""),
        ];
        for (source, expected) in cases {
            let tokens = lex(source).expect("string should lex");
            assert_eq!(tokens[0].kind, TokenType::String);
            assert_eq!(tokens[0].value, expected, "{source}");
        }
    }

    #[test]
    fn lex_numbers_expected_signed_and_fractional() {
        for source in ["42", "0", "-1", "3.14", "-0.5"] {
            let tokens = lex(source).expect("number should lex");
            assert_eq!(tokens[0].kind, TokenType::Number);
            assert_eq!(tokens[0].value, source);
            assert_eq!(tokens.len(), 2);
        }
    }

    #[test]
    fn lex_minus_and_arrow_disambiguation_expected_token_types() {
        assert_eq!(
            kinds("A -> B"),
            vec![
                TokenType::Identifier,
                TokenType::Arrow,
                TokenType::Identifier,
                TokenType::Eof
            ]
        );
        assert_eq!(
            kinds("A -- B"),
            vec![
                TokenType::Identifier,
                TokenType::Minus,
                TokenType::Minus,
                TokenType::Identifier,
                TokenType::Eof
            ]
        );
        assert_eq!(
            kinds("A - B"),
            vec![
                TokenType::Identifier,
                TokenType::Minus,
                TokenType::Identifier,
                TokenType::Eof
            ]
        );
    }

    #[test]
    fn lex_comments_expected_skipped() {
        let tokens = lex("before /* line1\nline2 */ after // trailing\n").expect("should lex");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].value, "before");
        assert_eq!(tokens[1].value, "after");
        assert_eq!((tokens[1].line, tokens[1].col), (2, 10));
    }

    #[test]
    fn lex_positions_expected_line_and_col_tracking() {
        let tokens = lex("digraph\n{\n}").expect("should lex");
        assert_eq!((tokens[0].line, tokens[0].col), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].col), (2, 1));
        assert_eq!((tokens[2].line, tokens[2].col), (3, 1));

        let tokens = lex("A -> B").expect("should lex");
        assert_eq!(tokens[0].col, 1);
        assert_eq!(tokens[1].col, 3);
        assert_eq!(tokens[2].col, 6);
    }

    #[test]
    fn lex_unterminated_string_expected_error() {
        let error = lex("a = \"open").expect_err("must fail");
        assert_eq!(error, LexError::UnterminatedString { line: 1, col: 5 });
        assert!(error.to_string().contains("unterminated string"));
    }

    #[test]
    fn lex_unterminated_block_comment_expected_error() {
        let error = lex("a /* never closed").expect_err("must fail");
        assert!(error.to_string().contains("unterminated block comment"));
    }

    #[test]
    fn lex_unexpected_character_expected_line_col_in_message() {
        let error = lex("digraph G {\n  a @ b\n}").expect_err("must fail");
        let message = error.to_string();
        assert!(message.contains("unexpected character"));
        assert!(message.contains("line 2"));
        assert!(message.contains("col 5"));
    }

    #[test]
    fn token_type_names_expected_upper_case_and_unknown() {
        assert_eq!(TokenType::Eof.name(), "EOF");
        assert_eq!(TokenType::Semicolon.to_string(), "SEMICOLON");
        assert_eq!(TokenType::name_of(18), "MINUS");
        assert_eq!(TokenType::name_of(99), "UNKNOWN(99)");
    }
}
