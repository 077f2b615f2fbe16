//! Lexer token types

use std::fmt;

/// Token kinds for the SQL subset this crate understands.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Query keywords
    Select,
    From,
    Where,
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Cross,
    Natural,
    On,
    Using,
    As,
    And,
    Or,
    Not,
    In,
    Exists,
    Between,
    Like,
    Is,
    Null,
    Group,
    By,
    Having,
    Order,
    Asc,
    Desc,
    Limit,
    Offset,
    Union,
    Intersect,
    Except,
    All,
    Distinct,
    Case,
    When,
    Then,
    Else,
    End,
    Cast,
    With,

    // Statement keywords (recognized so non-queries can be named in errors)
    Insert,
    Update,
    Delete,
    Create,
    Table,
    Drop,
    Alter,

    // DDL keywords
    Primary,
    Foreign,
    Key,
    References,
    Unique,
    Check,
    Default,
    Constraint,
    If,

    // Literals and identifiers
    /// Bare or quoted identifier. Quoted identifiers keep their exact case.
    Identifier(String),
    Number(String),
    String(String),

    // Operators
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Concat,

    // Punctuation
    LParen,
    RParen,
    Comma,
    Dot,
    Semicolon,

    Eof,
    Error(String),
}

impl TokenKind {
    /// Whether this token is one of the binary/comparison operators.
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::Ne
                | TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::Le
                | TokenKind::Ge
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::Concat
        )
    }

    /// Short human-readable name for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(s) => format!("identifier '{}'", s),
            TokenKind::Number(s) => format!("number '{}'", s),
            TokenKind::String(_) => "string literal".to_string(),
            TokenKind::Error(msg) => msg.clone(),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("{:?}", other).to_uppercase(),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Byte span plus line/column of a token's start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

/// A lexed token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}
