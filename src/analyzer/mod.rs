mod semantic_error;
mod symbol_table;

pub use semantic_error::*;
pub use symbol_table::*;
