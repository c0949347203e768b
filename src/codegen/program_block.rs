use std::fmt;

use log::{debug, warn};

use super::Instruction;

/// The emitted program: append-only except for backpatching reserved slots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgramBlock {
    codes: Vec<Instruction>,
}

impl ProgramBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn push(&mut self, instruction: Instruction) -> usize {
        self.codes.push(instruction);
        self.codes.len() - 1
    }

    /// Appends a placeholder and returns its index for a later [`ProgramBlock::patch`].
    pub fn reserve(&mut self) -> usize {
        self.push(Instruction::Placeholder)
    }

    pub fn patch(&mut self, index: usize, instruction: Instruction) {
        match self.codes.get_mut(index) {
            Some(slot) => {
                debug!("backpatch {}: {}", index, instruction);
                *slot = instruction;
            }
            None => warn!("backpatch of unknown quadruple {}", index),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.codes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.codes.iter()
    }

    pub fn has_placeholders(&self) -> bool {
        self.codes.iter().any(Instruction::is_placeholder)
    }
}

impl fmt::Display for ProgramBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, code) in self.codes.iter().enumerate() {
            writeln!(f, "{i}\t{code}")?;
        }
        Ok(())
    }
}
