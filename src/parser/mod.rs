mod parse_table;
mod parse_tree;
mod parser;
mod syntax_error;

pub use parse_table::{lookup, GrammarSymbol, NonTerminal, TableEntry, END_MARKER};
pub use parse_tree::*;
pub use parser::*;
pub use syntax_error::*;
