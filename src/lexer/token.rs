use std::fmt;

use phf::{phf_set, Set};

pub static KEYWORDS: Set<&'static str> = phf_set! {
    "break",
    "continue",
    "def",
    "else",
    "if",
    "return",
    "while",
    "global",
};

pub static ONE_SYMBOL_TOKENS: Set<char> = phf_set! {
    ';', ':', ',', '[', ']', '(', ')', '+', '-', '<',
};

pub static WHITESPACES: Set<char> = phf_set! {
    ' ', '\n', '\r', '\t', '\u{b}', '\u{c}',
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Num,
    Id,
    Keyword,
    Symbol,
    Comment,
    Whitespace,
    Eof,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Num => "NUM",
            TokenKind::Id => "ID",
            TokenKind::Keyword => "KEYWORD",
            TokenKind::Symbol => "SYMBOL",
            TokenKind::Comment => "COMMENT",
            TokenKind::Whitespace => "WHITESPACE",
            TokenKind::Eof => "$",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }

    pub fn eof(line: usize) -> Self {
        Self::new(TokenKind::Eof, "$", line)
    }

    /// Grammar terminal text: identifiers and numbers collapse to their kind.
    pub fn terminal(&self) -> &str {
        match self.kind {
            TokenKind::Num | TokenKind::Id | TokenKind::Eof => self.kind.as_str(),
            _ => &self.lexeme,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.kind, TokenKind::Comment | TokenKind::Whitespace)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "$"),
            kind => write!(f, "({}, {})", kind.as_str(), self.lexeme),
        }
    }
}
