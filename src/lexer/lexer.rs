use std::collections::BTreeMap;

use log::trace;

use super::{Token, TokenKind, KEYWORDS, ONE_SYMBOL_TOKENS, WHITESPACES};

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LexicalErrorKind {
    #[error("Invalid input")]
    InvalidInput,
    #[error("Unclosed comment")]
    UnclosedComment,
    #[error("Unmatched comment")]
    UnmatchedComment,
    #[error("Invalid number")]
    InvalidNumber,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("({lexeme}, {kind})")]
pub struct LexicalError {
    pub lexeme: String,
    pub kind: LexicalErrorKind,
}

/// Pull-based scanner. Whitespace and comments are consumed internally, so
/// [`Lexer::next_token`] only ever yields grammar tokens and finally `$`.
#[derive(Debug)]
pub struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: usize,
    tokens: BTreeMap<usize, Vec<Token>>,
    errors: BTreeMap<usize, Vec<LexicalError>>,
    symbols: Vec<String>,
}

/// Characters allowed to end a number or identifier.
fn is_delimiter(c: char) -> bool {
    WHITESPACES.contains(&c) || ONE_SYMBOL_TOKENS.contains(&c) || matches!(c, '*' | '=' | '/' | '#')
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            index: 0,
            line: 1,
            tokens: BTreeMap::new(),
            errors: BTreeMap::new(),
            symbols: KEYWORDS_IN_ORDER.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn tokenize(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = vec![];
        loop {
            let token = lexer.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    pub fn next_token(&mut self) -> Token {
        while self.index < self.chars.len() {
            let Some(token) = self.scan() else {
                continue;
            };
            if token.is_skipped() {
                continue;
            }
            trace!("token {} on line {}", token, token.line);
            if token.kind == TokenKind::Id && !self.symbols.contains(&token.lexeme) {
                self.symbols.push(token.lexeme.clone());
            }
            self.tokens.entry(token.line).or_default().push(token.clone());
            return token;
        }
        Token::eof(self.line)
    }

    /// Tokens handed to the parser, grouped by line.
    pub fn tokens(&self) -> &BTreeMap<usize, Vec<Token>> {
        &self.tokens
    }

    pub fn errors(&self) -> &BTreeMap<usize, Vec<LexicalError>> {
        &self.errors
    }

    /// Keywords followed by every identifier in order of first appearance.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.index + ahead).copied()
    }

    fn lexeme(&self, start: usize) -> String {
        self.chars[start..self.index].iter().collect()
    }

    fn error(&mut self, line: usize, lexeme: String, kind: LexicalErrorKind) {
        trace!("lexical error {:?} at line {}: {}", kind, line, lexeme);
        self.errors
            .entry(line)
            .or_default()
            .push(LexicalError { lexeme, kind });
    }

    fn scan(&mut self) -> Option<Token> {
        let start = self.index;
        let line = self.line;
        let c = self.chars[self.index];
        self.index += 1;

        let kind = if WHITESPACES.contains(&c) {
            self.line += usize::from(c == '\n');
            while let Some(c) = self.peek(0).filter(|c| WHITESPACES.contains(c)) {
                self.line += usize::from(c == '\n');
                self.index += 1;
            }
            TokenKind::Whitespace
        } else if c.is_ascii_digit() {
            return self.scan_number(start, line);
        } else if c.is_ascii_alphabetic() {
            return self.scan_identifier(start, line);
        } else if ONE_SYMBOL_TOKENS.contains(&c) {
            TokenKind::Symbol
        } else {
            match (c, self.peek(0)) {
                ('*', Some('*')) | ('=', Some('=')) => {
                    self.index += 1;
                    TokenKind::Symbol
                }
                ('*', Some('/')) => {
                    self.index += 1;
                    self.error(line, self.lexeme(start), LexicalErrorKind::UnmatchedComment);
                    return None;
                }
                ('*', _) | ('=', _) => TokenKind::Symbol,
                ('/', Some('*')) => return self.scan_block_comment(start, line),
                ('#', _) => {
                    while self.peek(0).is_some_and(|c| c != '\n') {
                        self.index += 1;
                    }
                    TokenKind::Comment
                }
                _ => {
                    self.error(line, self.lexeme(start), LexicalErrorKind::InvalidInput);
                    return None;
                }
            }
        };

        Some(Token::new(kind, self.lexeme(start), line))
    }

    fn scan_number(&mut self, start: usize, line: usize) -> Option<Token> {
        while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
            self.index += 1;
        }
        if self.peek(0) == Some('.') {
            self.index += 1;
            if !self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                if self.peek(0).is_some() {
                    self.index += 1;
                }
                self.error(line, self.lexeme(start), LexicalErrorKind::InvalidNumber);
                return None;
            }
            while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                self.index += 1;
            }
        }
        match self.peek(0) {
            Some(c) if !is_delimiter(c) => {
                self.index += 1;
                self.error(line, self.lexeme(start), LexicalErrorKind::InvalidNumber);
                None
            }
            _ => Some(Token::new(TokenKind::Num, self.lexeme(start), line)),
        }
    }

    fn scan_identifier(&mut self, start: usize, line: usize) -> Option<Token> {
        while self.peek(0).is_some_and(|c| c.is_ascii_alphanumeric()) {
            self.index += 1;
        }
        match self.peek(0) {
            Some(c) if !is_delimiter(c) => {
                self.index += 1;
                self.error(line, self.lexeme(start), LexicalErrorKind::InvalidInput);
                None
            }
            _ => {
                let s = self.lexeme(start);
                let kind = if KEYWORDS.contains(s.as_str()) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Id
                };
                Some(Token::new(kind, s, line))
            }
        }
    }

    fn scan_block_comment(&mut self, start: usize, line: usize) -> Option<Token> {
        self.index += 1;
        while let Some(c) = self.peek(0) {
            if c == '*' && self.peek(1) == Some('/') {
                self.index += 2;
                return Some(Token::new(TokenKind::Comment, self.lexeme(start), line));
            }
            self.line += usize::from(c == '\n');
            self.index += 1;
        }
        let head: String = self.chars[start..].iter().take(7).collect();
        self.error(line, format!("{head}..."), LexicalErrorKind::UnclosedComment);
        None
    }
}

const KEYWORDS_IN_ORDER: [&str; 8] = [
    "break", "continue", "def", "else", "if", "return", "while", "global",
];
