use std::fmt;

use log::debug;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SemanticError {
    #[error("main function not found.")]
    MainMissing,
    #[error("'{0}' is not defined appropriately.")]
    NotDefined(String),
    #[error("Mismatch in numbers of arguments of '{0}'.")]
    ArgsMismatch(String),
    #[error("No 'while' found for 'break'.")]
    BreakOutsideLoop,
    #[error("No 'while' found for 'continue'.")]
    ContinueOutsideLoop,
    #[error("Void type in operands.")]
    VoidOperand,
    #[error("Function '{0}' has already been defined with this number of arguments.")]
    Overloading(String),
}

/// Semantic errors in the order they were raised, each with its source line.
#[derive(Clone, Debug, Default)]
pub struct SemanticErrors {
    errors: Vec<(usize, SemanticError)>,
}

impl SemanticErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, line: usize, error: SemanticError) {
        debug!("semantic error at line {}: {}", line, error);
        self.errors.push((line, error));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(usize, SemanticError)> {
        self.errors.iter()
    }

    pub fn contains(&self, error: &SemanticError) -> bool {
        self.errors.iter().any(|(_, e)| e == error)
    }
}

impl fmt::Display for SemanticErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return writeln!(f, "The input program is semantically correct.");
        }
        for (line, error) in &self.errors {
            writeln!(f, "#{line} : Semantic Error! {error}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_errors_by_line() {
        let mut errors = SemanticErrors::new();
        assert_eq!(
            errors.to_string(),
            "The input program is semantically correct.\n"
        );

        errors.add(3, SemanticError::NotDefined("x".to_string()));
        errors.add(7, SemanticError::BreakOutsideLoop);
        assert_eq!(
            errors.to_string(),
            "#3 : Semantic Error! 'x' is not defined appropriately.\n\
             #7 : Semantic Error! No 'while' found for 'break'.\n"
        );
        assert!(errors.contains(&SemanticError::BreakOutsideLoop));
    }
}
