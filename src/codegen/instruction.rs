use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Assign,
    Add,
    Sub,
    Mult,
    Eq,
    Lt,
    Jp,
    Jpf,
    Print,
}

impl Opcode {
    pub fn arity(self) -> usize {
        match self {
            Opcode::Add | Opcode::Sub | Opcode::Mult | Opcode::Eq | Opcode::Lt => 3,
            Opcode::Assign | Opcode::Jpf => 2,
            Opcode::Jp | Opcode::Print => 1,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Assign => "ASSIGN",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mult => "MULT",
            Opcode::Eq => "EQ",
            Opcode::Lt => "LT",
            Opcode::Jp => "JP",
            Opcode::Jpf => "JPF",
            Opcode::Print => "PRINT",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// `Direct` names a memory cell (or, as a jump target, a quadruple index),
/// `Immediate` is a literal and `Indirect` dereferences the cell once more.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Direct(usize),
    Immediate(String),
    Indirect(usize),
}

impl Operand {
    pub fn immediate(value: impl ToString) -> Self {
        Operand::Immediate(value.to_string())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Direct(address) => write!(f, "{address}"),
            Operand::Immediate(literal) => write!(f, "#{literal}"),
            Operand::Indirect(address) => write!(f, "@{address}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{opcode} takes {expected} operands, got {got}")]
pub struct ArityError {
    pub opcode: Opcode,
    pub expected: usize,
    pub got: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Reserved slot that a later backpatch overwrites.
    Placeholder,
    Quad { opcode: Opcode, args: Vec<Operand> },
}

impl Instruction {
    pub fn new(opcode: Opcode, args: Vec<Operand>) -> Result<Self, ArityError> {
        if args.len() != opcode.arity() {
            return Err(ArityError {
                opcode,
                expected: opcode.arity(),
                got: args.len(),
            });
        }
        Ok(Instruction::Quad { opcode, args })
    }

    /// Three-address form; the last operand receives the result.
    pub fn three(opcode: Opcode, lhs: Operand, rhs: Operand, dest: Operand) -> Self {
        assert_eq!(opcode.arity(), 3, "{opcode} is not a three-operand opcode");
        Instruction::Quad {
            opcode,
            args: vec![lhs, rhs, dest],
        }
    }

    pub fn assign(src: Operand, dest: Operand) -> Self {
        Instruction::Quad {
            opcode: Opcode::Assign,
            args: vec![src, dest],
        }
    }

    pub fn jp(target: Operand) -> Self {
        Instruction::Quad {
            opcode: Opcode::Jp,
            args: vec![target],
        }
    }

    pub fn jpf(condition: Operand, target: usize) -> Self {
        Instruction::Quad {
            opcode: Opcode::Jpf,
            args: vec![condition, Operand::Direct(target)],
        }
    }

    pub fn print(value: Operand) -> Self {
        Instruction::Quad {
            opcode: Opcode::Print,
            args: vec![value],
        }
    }

    pub fn opcode(&self) -> Option<Opcode> {
        match self {
            Instruction::Placeholder => None,
            Instruction::Quad { opcode, .. } => Some(*opcode),
        }
    }

    pub fn args(&self) -> &[Operand] {
        match self {
            Instruction::Placeholder => &[],
            Instruction::Quad { args, .. } => args,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Instruction::Placeholder)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Placeholder => write!(f, "( , , , )"),
            Instruction::Quad { opcode, args } => {
                write!(f, "({opcode}")?;
                for i in 0..3 {
                    match args.get(i) {
                        Some(arg) => write!(f, ", {arg}")?,
                        None => write!(f, ", ")?,
                    }
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_blank_slots() {
        let assign = Instruction::assign(Operand::immediate(1), Operand::Direct(1500));
        assert_eq!(assign.to_string(), "(ASSIGN, #1, 1500, )");

        let add = Instruction::three(
            Opcode::Add,
            Operand::Direct(104),
            Operand::Indirect(1500),
            Operand::Direct(1504),
        );
        assert_eq!(add.to_string(), "(ADD, 104, @1500, 1504)");
        assert_eq!(Instruction::jp(Operand::Direct(7)).to_string(), "(JP, 7, , )");
        assert_eq!(Instruction::Placeholder.to_string(), "( , , , )");
    }

    #[test]
    fn rejects_wrong_operand_count() {
        let err = Instruction::new(Opcode::Jpf, vec![Operand::Direct(1)]).unwrap_err();
        assert_eq!(err.to_string(), "JPF takes 2 operands, got 1");
        assert!(Instruction::new(Opcode::Print, vec![Operand::Direct(1)]).is_ok());
    }

    #[test]
    #[should_panic]
    fn three_operand_form_checks_opcode() {
        Instruction::three(
            Opcode::Jp,
            Operand::Direct(1),
            Operand::Direct(2),
            Operand::Direct(3),
        );
    }
}
