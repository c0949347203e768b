use std::fmt;

use log::debug;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("illegal {0}")]
    Illegal(String),
    #[error("missing {0}")]
    Missing(String),
    #[error("Unexpected EOF")]
    UnexpectedEof,
}

#[derive(Clone, Debug, Default)]
pub struct SyntaxErrors {
    errors: Vec<(usize, SyntaxError)>,
}

impl SyntaxErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, line: usize, error: SyntaxError) {
        debug!("syntax error at line {}: {}", line, error);
        self.errors.push((line, error));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(usize, SyntaxError)> {
        self.errors.iter()
    }

    pub fn contains(&self, error: &SyntaxError) -> bool {
        self.errors.iter().any(|(_, e)| e == error)
    }
}

impl fmt::Display for SyntaxErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return writeln!(f, "There is no syntax error.");
        }
        for (line, error) in &self.errors {
            writeln!(f, "#{line} : syntax error, {error}")?;
        }
        Ok(())
    }
}
