use super::{Instruction, Opcode, Operand, ProgramBlock, TempManager};

/// Emits the quadruples of a word-addressed stack whose pointer lives in the
/// `sp` cell. The pointer always names the first free slot.
#[derive(Clone, Debug)]
pub struct RuntimeStack {
    sp: usize,
    base: usize,
    step: usize,
}

impl RuntimeStack {
    pub fn new(sp: usize, base: usize, step: usize) -> Self {
        Self { sp, base, step }
    }

    fn pointer(&self) -> Operand {
        Operand::Direct(self.sp)
    }

    fn words(&self, slots: usize) -> Operand {
        Operand::immediate(slots * self.step)
    }

    pub fn init(&self, pb: &mut ProgramBlock) {
        pb.push(Instruction::assign(Operand::immediate(self.base), self.pointer()));
    }

    pub fn push(&self, pb: &mut ProgramBlock, value: Operand) {
        pb.push(Instruction::assign(value, Operand::Indirect(self.sp)));
        pb.push(Instruction::three(
            Opcode::Add,
            self.pointer(),
            self.words(1),
            self.pointer(),
        ));
    }

    pub fn pop(&self, pb: &mut ProgramBlock, temps: &mut TempManager) -> Operand {
        pb.push(Instruction::three(
            Opcode::Sub,
            self.pointer(),
            self.words(1),
            self.pointer(),
        ));
        let temp = temps.get_temp();
        pb.push(Instruction::assign(
            Operand::Indirect(self.sp),
            Operand::Direct(temp),
        ));
        Operand::Direct(temp)
    }

    /// Copies the slot `offset` words below the pointer into a fresh temporary.
    pub fn access(&self, pb: &mut ProgramBlock, temps: &mut TempManager, offset: usize) -> Operand {
        let slot = temps.get_temp();
        pb.push(Instruction::three(
            Opcode::Sub,
            self.pointer(),
            self.words(offset),
            Operand::Direct(slot),
        ));
        let temp = temps.get_temp();
        pb.push(Instruction::assign(
            Operand::Indirect(slot),
            Operand::Direct(temp),
        ));
        Operand::Direct(temp)
    }

    /// Drops `slots` words without reading them.
    pub fn release(&self, pb: &mut ProgramBlock, slots: usize) {
        if slots == 0 {
            return;
        }
        pb.push(Instruction::three(
            Opcode::Sub,
            self.pointer(),
            self.words(slots),
            self.pointer(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_access_reads_back_through_pointer() {
        let mut pb = ProgramBlock::new();
        let mut temps = TempManager::new(1500, 3000, 4);
        let stack = RuntimeStack::new(500, 8000, 4);

        stack.init(&mut pb);
        stack.push(&mut pb, Operand::Direct(104));
        let top = stack.access(&mut pb, &mut temps, 1);
        stack.release(&mut pb, 1);

        assert_eq!(top, Operand::Direct(1504));
        assert_eq!(
            pb.to_string(),
            "0\t(ASSIGN, #8000, 500, )\n\
             1\t(ASSIGN, 104, @500, )\n\
             2\t(ADD, 500, #4, 500)\n\
             3\t(SUB, 500, #4, 1500)\n\
             4\t(ASSIGN, @1500, 1504, )\n\
             5\t(SUB, 500, #4, 500)\n"
        );
    }

    #[test]
    fn pop_moves_pointer_first() {
        let mut pb = ProgramBlock::new();
        let mut temps = TempManager::new(1500, 3000, 4);
        let stack = RuntimeStack::new(500, 8000, 4);

        assert_eq!(stack.pop(&mut pb, &mut temps), Operand::Direct(1500));
        assert_eq!(
            pb.to_string(),
            "0\t(SUB, 500, #4, 500)\n1\t(ASSIGN, @500, 1500, )\n"
        );
    }
}
