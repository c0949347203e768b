pub mod analyzer;
pub mod codegen;
pub mod config;
pub mod lexer;
pub mod parser;
pub mod report;

use std::collections::BTreeMap;

use analyzer::{SemanticErrors, SymbolTable};
use codegen::ProgramBlock;
use config::MemoryLayout;
use lexer::{LexicalError, Token};
use parser::{ParseTree, Parser, SyntaxErrors};

pub const CODE_NOT_GENERATED: &str = "The code has not been generated.";

/// Everything a single pass over one source file produces.
#[derive(Clone, Debug)]
pub struct Compilation {
    pub tokens: BTreeMap<usize, Vec<Token>>,
    pub lexical_errors: BTreeMap<usize, Vec<LexicalError>>,
    /// Keywords and identifiers in order of first appearance.
    pub lexemes: Vec<String>,
    pub syntax_errors: SyntaxErrors,
    pub parse_tree: ParseTree,
    pub symbol_table: SymbolTable,
    pub semantic_errors: SemanticErrors,
    pub program_block: ProgramBlock,
}

impl Compilation {
    /// The generated program, withheld when any semantic error was raised.
    pub fn program(&self) -> Option<&ProgramBlock> {
        self.semantic_errors
            .is_empty()
            .then_some(&self.program_block)
    }

    pub fn program_text(&self) -> String {
        match self.program() {
            Some(program) => program.to_string(),
            None => CODE_NOT_GENERATED.to_string(),
        }
    }
}

pub fn compile(source: &str) -> Compilation {
    compile_with_layout(source, MemoryLayout::default())
}

pub fn compile_with_layout(source: &str, layout: MemoryLayout) -> Compilation {
    Parser::with_layout(source, layout).parse()
}
