use log::trace;

use crate::{
    codegen::{Action, Codegen},
    config::MemoryLayout,
    lexer::{Lexer, Token, TokenKind},
    Compilation,
};

use super::{
    lookup, GrammarSymbol, NodeId, NonTerminal, ParseTree, SyntaxError, SyntaxErrors, TableEntry,
    END_MARKER,
};

/// Table-driven LL(1) parser. It pulls tokens from the lexer on demand and
/// runs every semantic action against the code generator the moment the
/// action reaches the top of the grammar stack.
pub struct Parser {
    lexer: Lexer,
    codegen: Codegen,
    stack: Vec<(GrammarSymbol, Option<NodeId>)>,
    tree: ParseTree,
    errors: SyntaxErrors,
    lookahead: Token,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self::with_layout(source, MemoryLayout::default())
    }

    pub fn with_layout(source: &str, layout: MemoryLayout) -> Self {
        let tree = ParseTree::new(NonTerminal::Program.name());
        let root = tree.root();
        Self {
            lexer: Lexer::new(source),
            codegen: Codegen::new(layout),
            stack: vec![
                (GrammarSymbol::Terminal(END_MARKER), None),
                (GrammarSymbol::NonTerminal(NonTerminal::Program), Some(root)),
            ],
            tree,
            errors: SyntaxErrors::new(),
            lookahead: Token::eof(1),
        }
    }

    pub fn parse(mut self) -> Compilation {
        self.advance();
        while let Some((symbol, node)) = self.stack.pop() {
            trace!("stack top {} with lookahead {}", symbol, self.lookahead);
            let done = match symbol {
                GrammarSymbol::Action(action) => {
                    self.codegen.generate(action, &self.lookahead);
                    false
                }
                GrammarSymbol::NonTerminal(nt) => self.expand(nt, node),
                GrammarSymbol::Terminal(terminal) => self.match_terminal(terminal, node),
            };
            if done {
                break;
            }
        }
        self.finish()
    }

    fn advance(&mut self) {
        self.lookahead = self.lexer.next_token();
    }

    fn at_eof(&self) -> bool {
        self.lookahead.kind == TokenKind::Eof
    }

    fn error(&mut self, error: SyntaxError) {
        self.errors.add(self.lookahead.line, error);
    }

    fn discard(&mut self, node: Option<NodeId>) {
        if let Some(node) = node {
            self.tree.remove(node);
        }
    }

    /// Returns whether parsing has to stop.
    fn expand(&mut self, nt: NonTerminal, node: Option<NodeId>) -> bool {
        match lookup(nt, self.lookahead.terminal()) {
            None if self.at_eof() => {
                self.error(SyntaxError::UnexpectedEof);
                self.discard(node);
                // the program-level check for main still runs on truncated input
                let pending: Vec<_> = self.stack.drain(..).rev().collect();
                for (symbol, node) in pending {
                    if symbol == GrammarSymbol::Action(Action::JumpMain) {
                        self.codegen.generate(Action::JumpMain, &self.lookahead);
                    }
                    self.discard(node);
                }
                true
            }
            None => {
                let illegal = self.lookahead.terminal().to_string();
                self.error(SyntaxError::Illegal(illegal));
                self.stack.push((GrammarSymbol::NonTerminal(nt), node));
                self.advance();
                false
            }
            Some(TableEntry::Synch) => {
                self.error(SyntaxError::Missing(nt.name().to_string()));
                self.discard(node);
                false
            }
            Some(TableEntry::Production(rhs)) => {
                let parent = node.unwrap_or_else(|| self.tree.root());
                let mut expanded = Vec::with_capacity(rhs.len());
                for symbol in rhs {
                    let child = match symbol {
                        GrammarSymbol::Action(_) => None,
                        other => Some(self.tree.add_child(parent, other.to_string())),
                    };
                    expanded.push((*symbol, child));
                }
                if !rhs.iter().any(|s| !s.is_action()) {
                    self.tree.add_child(parent, "epsilon");
                }
                self.stack.extend(expanded.into_iter().rev());
                false
            }
        }
    }

    /// Returns whether parsing has to stop.
    fn match_terminal(&mut self, terminal: &'static str, node: Option<NodeId>) -> bool {
        if terminal == END_MARKER {
            if self.at_eof() {
                let root = self.tree.root();
                self.tree.add_child(root, END_MARKER);
                return true;
            }
            let illegal = self.lookahead.terminal().to_string();
            self.error(SyntaxError::Illegal(illegal));
            self.stack.push((GrammarSymbol::Terminal(terminal), node));
            self.advance();
            return false;
        }

        if terminal == self.lookahead.terminal() {
            if let Some(node) = node {
                self.tree.set_label(node, self.lookahead.to_string());
            }
            self.advance();
        } else {
            self.error(SyntaxError::Missing(terminal.to_string()));
            self.discard(node);
        }
        false
    }

    fn finish(self) -> Compilation {
        let (program_block, symbol_table, semantic_errors) = self.codegen.into_parts();
        Compilation {
            tokens: self.lexer.tokens().clone(),
            lexical_errors: self.lexer.errors().clone(),
            lexemes: self.lexer.symbols().to_vec(),
            syntax_errors: self.errors,
            parse_tree: self.tree,
            symbol_table,
            semantic_errors,
            program_block,
        }
    }
}
