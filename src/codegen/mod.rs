mod action;
mod codegen;
mod instruction;
mod program_block;
mod runtime_stack;
mod temp_manager;

pub use action::*;
pub use codegen::*;
pub use instruction::*;
pub use program_block::*;
pub use runtime_stack::*;
pub use temp_manager::*;
