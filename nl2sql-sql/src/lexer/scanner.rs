//! Lexer implementation

use super::token::*;
use std::iter::Peekable;
use std::str::CharIndices;

/// Lexer for the SQL subset.
///
/// Keywords are recognized case-insensitively. `--` line comments and
/// `/* */` block comments are skipped. Single-quoted text lexes as a string
/// literal; double-quoted, backtick-quoted, and bracket-quoted text lex as
/// identifiers with their case preserved.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            pos: 0,
        }
    }

    /// Tokenize the entire source into a vector of tokens.
    /// The final token is always `Eof`.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        tokens
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let start_pos = self.pos;
        let start_line = self.line;
        let start_col = self.column;

        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some(c) => match c {
                '(' => {
                    self.advance();
                    TokenKind::LParen
                }
                ')' => {
                    self.advance();
                    TokenKind::RParen
                }
                ',' => {
                    self.advance();
                    TokenKind::Comma
                }
                '.' => {
                    self.advance();
                    if self.peek_char().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                        self.scan_number_from(start_pos)
                    } else {
                        TokenKind::Dot
                    }
                }
                ';' => {
                    self.advance();
                    TokenKind::Semicolon
                }
                '+' => {
                    self.advance();
                    TokenKind::Plus
                }
                '-' => {
                    self.advance();
                    TokenKind::Minus
                }
                '*' => {
                    self.advance();
                    TokenKind::Star
                }
                '/' => {
                    self.advance();
                    TokenKind::Slash
                }
                '%' => {
                    self.advance();
                    TokenKind::Percent
                }
                '|' => {
                    self.advance();
                    if self.peek_char() == Some('|') {
                        self.advance();
                        TokenKind::Concat
                    } else {
                        TokenKind::Error("Unexpected character: |".to_string())
                    }
                }
                '=' => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                    }
                    TokenKind::Eq
                }
                '!' => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        TokenKind::Ne
                    } else {
                        TokenKind::Error("Unexpected character: !".to_string())
                    }
                }
                '<' => {
                    self.advance();
                    match self.peek_char() {
                        Some('=') => {
                            self.advance();
                            TokenKind::Le
                        }
                        Some('>') => {
                            self.advance();
                            TokenKind::Ne
                        }
                        _ => TokenKind::Lt,
                    }
                }
                '>' => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        TokenKind::Ge
                    } else {
                        TokenKind::Gt
                    }
                }
                '\'' => self.scan_string(),
                '"' => self.scan_quoted_identifier('"'),
                '`' => self.scan_quoted_identifier('`'),
                '[' => self.scan_quoted_identifier(']'),
                c if c.is_ascii_digit() => self.scan_number_from(start_pos),
                c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(),
                c => {
                    self.advance();
                    TokenKind::Error(format!("Unexpected character: {}", c))
                }
            },
        };

        Token {
            kind,
            span: Span {
                start: start_pos,
                end: self.pos,
                line: start_line,
                column: start_col,
            },
        }
    }

    /// Scan an identifier or keyword.
    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos;

        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let ident = &self.source[start..self.pos];

        match ident.to_lowercase().as_str() {
            "select" => TokenKind::Select,
            "from" => TokenKind::From,
            "where" => TokenKind::Where,
            "join" => TokenKind::Join,
            "inner" => TokenKind::Inner,
            "left" => TokenKind::Left,
            "right" => TokenKind::Right,
            "full" => TokenKind::Full,
            "outer" => TokenKind::Outer,
            "cross" => TokenKind::Cross,
            "natural" => TokenKind::Natural,
            "on" => TokenKind::On,
            "using" => TokenKind::Using,
            "as" => TokenKind::As,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "in" => TokenKind::In,
            "exists" => TokenKind::Exists,
            "between" => TokenKind::Between,
            "like" => TokenKind::Like,
            "is" => TokenKind::Is,
            "null" => TokenKind::Null,
            "group" => TokenKind::Group,
            "by" => TokenKind::By,
            "having" => TokenKind::Having,
            "order" => TokenKind::Order,
            "asc" => TokenKind::Asc,
            "desc" => TokenKind::Desc,
            "limit" => TokenKind::Limit,
            "offset" => TokenKind::Offset,
            "union" => TokenKind::Union,
            "intersect" => TokenKind::Intersect,
            "except" => TokenKind::Except,
            "all" => TokenKind::All,
            "distinct" => TokenKind::Distinct,
            "case" => TokenKind::Case,
            "when" => TokenKind::When,
            "then" => TokenKind::Then,
            "else" => TokenKind::Else,
            "end" => TokenKind::End,
            "cast" => TokenKind::Cast,
            "with" => TokenKind::With,

            "insert" => TokenKind::Insert,
            "update" => TokenKind::Update,
            "delete" => TokenKind::Delete,
            "create" => TokenKind::Create,
            "table" => TokenKind::Table,
            "drop" => TokenKind::Drop,
            "alter" => TokenKind::Alter,

            "primary" => TokenKind::Primary,
            "foreign" => TokenKind::Foreign,
            "key" => TokenKind::Key,
            "references" => TokenKind::References,
            "unique" => TokenKind::Unique,
            "check" => TokenKind::Check,
            "default" => TokenKind::Default,
            "constraint" => TokenKind::Constraint,
            "if" => TokenKind::If,

            _ => TokenKind::Identifier(ident.to_string()),
        }
    }

    /// Scan a single-quoted string literal. `''` is an escaped quote.
    fn scan_string(&mut self) -> TokenKind {
        self.advance(); // consume opening quote
        let mut value = String::new();

        loop {
            match self.peek_char() {
                None => return TokenKind::Error("Unterminated string literal".to_string()),
                Some('\'') => {
                    self.advance();
                    if self.peek_char() == Some('\'') {
                        self.advance();
                        value.push('\'');
                    } else {
                        break;
                    }
                }
                Some('\n') => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                    value.push('\n');
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }

        TokenKind::String(value)
    }

    /// Scan a quoted identifier terminated by `close`. The opening delimiter
    /// has not been consumed yet.
    fn scan_quoted_identifier(&mut self, close: char) -> TokenKind {
        self.advance(); // consume opening delimiter
        let start = self.pos;

        loop {
            match self.peek_char() {
                None => return TokenKind::Error("Unterminated quoted identifier".to_string()),
                Some(c) if c == close => {
                    let name = self.source[start..self.pos].to_string();
                    self.advance();
                    return TokenKind::Identifier(name);
                }
                Some('\n') => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Scan a numeric literal starting at `start` (integer, decimal, or
    /// exponent form). The first character has not been consumed when called
    /// from a digit; it has when called after a leading dot.
    fn scan_number_from(&mut self, start: usize) -> TokenKind {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() || c == '.' {
                self.advance();
            } else if c == 'e' || c == 'E' {
                self.advance();
                if matches!(self.peek_char(), Some('+') | Some('-')) {
                    self.advance();
                }
            } else {
                break;
            }
        }

        TokenKind::Number(self.source[start..self.pos].to_string())
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek_char() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('\n') => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                }
                Some('-') if self.peek_next_char() == Some('-') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_next_char() == Some('*') => {
                    self.advance(); // /
                    self.advance(); // *
                    loop {
                        match self.peek_char() {
                            None => break,
                            Some('*') if self.peek_next_char() == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some('\n') => {
                                self.advance();
                                self.line += 1;
                                self.column = 1;
                            }
                            _ => {
                                self.advance();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next_char(&self) -> Option<char> {
        let mut iter = self.source[self.pos..].chars();
        iter.next();
        iter.next()
    }

    fn advance(&mut self) {
        if let Some((_, c)) = self.chars.next() {
            self.pos += c.len_utf8();
            self.column += 1;
        }
    }
}

/// Tokenize SQL text in one call.
pub fn tokenize(sql: &str) -> Vec<Token> {
    Lexer::new(sql).tokenize()
}
