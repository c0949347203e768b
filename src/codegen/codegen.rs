use log::{debug, warn};

use crate::{
    analyzer::{
        CallResolution, SemanticError, SemanticErrors, SymbolKind, SymbolTable, BUILTIN_OUTPUT,
    },
    config::MemoryLayout,
    lexer::Token,
};

use super::{Action, Instruction, Opcode, Operand, ProgramBlock, RuntimeStack, TempManager};

/// Entry of the semantic stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SemanticValue {
    Operand(Operand),
    /// Produced by a failed lookup; operations on it emit nothing.
    Unresolved,
    /// Result of calling a function without a return value.
    Void,
    Relop(Opcode),
    /// Quadruple index awaiting a backpatch, or a loop head.
    Index(usize),
    /// Identifier whose binding depends on what follows it.
    Name(String),
    ArrayStart(usize),
}

#[derive(Clone, Debug, Default)]
struct LoopContext {
    head: usize,
    breaks: Vec<usize>,
}

#[derive(Clone, Debug)]
struct PendingCall {
    lexeme: Option<String>,
    args: usize,
    printed: Vec<Operand>,
}

impl PendingCall {
    fn is_output(&self) -> bool {
        self.lexeme.as_deref() == Some(BUILTIN_OUTPUT)
    }
}

#[derive(Clone, Debug)]
struct FunctionFrame {
    address: usize,
    lexeme: String,
    is_main: bool,
    overloaded: bool,
    outer_loops: Vec<LoopContext>,
}

pub struct Codegen {
    program_block: ProgramBlock,
    semantic_stack: Vec<SemanticValue>,
    temps: TempManager,
    runtime_stack: RuntimeStack,
    symbol_table: SymbolTable,
    errors: SemanticErrors,
    loops: Vec<LoopContext>,
    calls: Vec<PendingCall>,
    functions: Vec<FunctionFrame>,
    main_jump: Option<usize>,
    main_exits: Vec<usize>,
    line: usize,
}

impl Codegen {
    pub fn new(layout: MemoryLayout) -> Self {
        Self {
            program_block: ProgramBlock::new(),
            semantic_stack: vec![],
            temps: TempManager::new(layout.temp_start, layout.array_start, layout.word_size),
            runtime_stack: RuntimeStack::new(
                layout.stack_pointer,
                layout.stack_base,
                layout.word_size,
            ),
            symbol_table: SymbolTable::new(layout.data_start, layout.word_size),
            errors: SemanticErrors::new(),
            loops: vec![],
            calls: vec![],
            functions: vec![],
            main_jump: None,
            main_exits: vec![],
            line: 1,
        }
    }

    pub fn program_block(&self) -> &ProgramBlock {
        &self.program_block
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }

    pub fn errors(&self) -> &SemanticErrors {
        &self.errors
    }

    pub fn semantic_stack(&self) -> &[SemanticValue] {
        &self.semantic_stack
    }

    pub fn into_parts(self) -> (ProgramBlock, SymbolTable, SemanticErrors) {
        (self.program_block, self.symbol_table, self.errors)
    }

    /// Runs one semantic action; `token` is the parser's current lookahead.
    pub fn generate(&mut self, action: Action, token: &Token) {
        self.line = token.line;
        let lexeme = token.lexeme.as_str();
        debug!("{} '{}' at line {}", action, lexeme, token.line);

        match action {
            Action::Pid => self.gen_pid(lexeme),
            Action::Pnum => self.gen_pnum(lexeme),
            Action::Psym => self.push(SemanticValue::Name(lexeme.to_string())),
            Action::AddSym => self.gen_add_sym(),
            Action::CheckSym => self.gen_check_sym(),
            Action::CheckVoid => self.gen_check_void(),
            Action::Pop => {
                self.pop();
            }
            Action::Assign => self.gen_assign(),
            Action::Add => self.gen_arithmetic(Opcode::Add),
            Action::Sub => self.gen_arithmetic(Opcode::Sub),
            Action::Mult => self.gen_arithmetic(Opcode::Mult),
            Action::Power => self.gen_power(),
            Action::CompOp => self.gen_comp_op(lexeme),
            Action::Comp => self.gen_comp(),
            Action::Index => self.gen_index(),
            Action::ArrInit => {
                let start = self.temps.array_pointer();
                self.push(SemanticValue::ArrayStart(start));
            }
            Action::Parr => self.gen_parr(),
            Action::ArrLen => self.gen_arr_len(),
            Action::Save => self.save(),
            Action::Label => self.label(),
            Action::Jpf => self.patch_conditional(0),
            Action::JpfSave => {
                self.patch_conditional(1);
                self.save();
            }
            Action::Jp => self.patch_unconditional(),
            Action::While => self.gen_while(),
            Action::Break => self.gen_break(),
            Action::Continue => self.gen_continue(),
            Action::FuncCallStart => self.gen_func_call_start(),
            Action::AddArg => self.gen_add_arg(),
            Action::FuncCallFinish => self.gen_func_call_finish(),
            Action::Pfunc => self.gen_pfunc(lexeme),
            Action::SaveFunc => self.gen_save_func(),
            Action::SetFuncStart => self.gen_set_func_start(),
            Action::Pparam => self.gen_pparam(lexeme),
            Action::FuncDefStart => self.gen_func_def_start(),
            Action::PushZero => self.push(SemanticValue::Operand(Operand::immediate(0))),
            Action::HasReturnValue => {
                if let Some(frame) = self.functions.last() {
                    self.symbol_table.mark_has_return_value(frame.address);
                }
            }
            Action::FuncDefFinish => self.gen_func_def_finish(),
            Action::PopFuncAddress => self.gen_pop_func_address(),
            Action::CheckFunc => self.gen_check_func(),
            Action::Global => self.symbol_table.declare_global(lexeme),
            Action::JumpMain => self.gen_jump_main(),
        }
    }

    fn error(&mut self, error: SemanticError) {
        self.errors.add(self.line, error);
    }

    fn emit(&mut self, instruction: Instruction) -> usize {
        self.program_block.push(instruction)
    }

    fn push(&mut self, value: SemanticValue) {
        self.semantic_stack.push(value);
    }

    fn push_operand(&mut self, operand: Operand) {
        self.semantic_stack.push(SemanticValue::Operand(operand));
    }

    fn pop(&mut self) -> SemanticValue {
        self.semantic_stack.pop().unwrap_or_else(|| {
            warn!("semantic stack underflow at line {}", self.line);
            SemanticValue::Unresolved
        })
    }

    /// Pops a value usable as an operand. A void value is reported here.
    fn pop_operand(&mut self) -> Option<Operand> {
        match self.pop() {
            SemanticValue::Operand(operand) => Some(operand),
            SemanticValue::Void => {
                self.error(SemanticError::VoidOperand);
                None
            }
            _ => None,
        }
    }

    fn pop_index(&mut self) -> Option<usize> {
        match self.pop() {
            SemanticValue::Index(index) => Some(index),
            other => {
                warn!("expected a quadruple index, found {:?}", other);
                None
            }
        }
    }

    fn new_temp(&mut self) -> Operand {
        Operand::Direct(self.temps.get_temp())
    }

    fn resolved(&mut self, lexeme: &str, address: Option<usize>) {
        match address {
            Some(address) => self.push_operand(Operand::Direct(address)),
            None => {
                self.error(SemanticError::NotDefined(lexeme.to_string()));
                self.push(SemanticValue::Unresolved);
            }
        }
    }

    fn gen_pid(&mut self, lexeme: &str) {
        let address = self.symbol_table.lookup(lexeme).map(|s| s.address);
        self.resolved(lexeme, address);
    }

    fn gen_pnum(&mut self, lexeme: &str) {
        let temp = self.new_temp();
        self.emit(Instruction::assign(Operand::immediate(lexeme), temp.clone()));
        self.push_operand(temp);
    }

    fn gen_add_sym(&mut self) {
        match self.pop() {
            SemanticValue::Name(lexeme) => {
                let address = self.symbol_table.declare_or_lookup(&lexeme, self.line);
                self.push_operand(Operand::Direct(address));
            }
            _ => self.push(SemanticValue::Unresolved),
        }
    }

    fn gen_check_sym(&mut self) {
        match self.pop() {
            SemanticValue::Name(lexeme) => self.gen_pid(&lexeme),
            _ => self.push(SemanticValue::Unresolved),
        }
    }

    fn gen_check_void(&mut self) {
        if let Some(top) = self.semantic_stack.last_mut() {
            if *top == SemanticValue::Void {
                *top = SemanticValue::Unresolved;
                self.error(SemanticError::VoidOperand);
            }
        }
    }

    fn gen_assign(&mut self) {
        let rhs = self.pop_operand();
        let lhs = self.pop_operand();
        if let (Some(lhs), Some(rhs)) = (lhs, rhs) {
            self.emit(Instruction::assign(rhs, lhs));
        }
    }

    fn gen_arithmetic(&mut self, opcode: Opcode) {
        let rhs = self.pop_operand();
        let lhs = self.pop_operand();
        let (Some(lhs), Some(rhs)) = (lhs, rhs) else {
            self.push(SemanticValue::Unresolved);
            return;
        };
        let dest = self.new_temp();
        self.emit(Instruction::three(opcode, lhs, rhs, dest.clone()));
        self.push_operand(dest);
    }

    /// `base ** exponent` as an inline counting loop.
    fn gen_power(&mut self) {
        let exponent = self.pop_operand();
        let base = self.pop_operand();
        let (Some(base), Some(exponent)) = (base, exponent) else {
            self.push(SemanticValue::Unresolved);
            return;
        };

        let acc = self.new_temp();
        let counter = self.new_temp();
        let positive = self.new_temp();
        self.emit(Instruction::assign(Operand::immediate(1), acc.clone()));
        self.emit(Instruction::assign(exponent, counter.clone()));
        let head = self.program_block.len();
        self.emit(Instruction::three(
            Opcode::Lt,
            Operand::immediate(0),
            counter.clone(),
            positive.clone(),
        ));
        let exit = self.program_block.reserve();
        self.emit(Instruction::three(Opcode::Mult, acc.clone(), base, acc.clone()));
        self.emit(Instruction::three(
            Opcode::Sub,
            counter.clone(),
            Operand::immediate(1),
            counter,
        ));
        self.emit(Instruction::jp(Operand::Direct(head)));
        let end = self.program_block.len();
        self.program_block.patch(exit, Instruction::jpf(positive, end));
        self.push_operand(acc);
    }

    fn gen_comp_op(&mut self, lexeme: &str) {
        match lexeme {
            "==" => self.push(SemanticValue::Relop(Opcode::Eq)),
            "<" => self.push(SemanticValue::Relop(Opcode::Lt)),
            _ => self.push(SemanticValue::Unresolved),
        }
    }

    fn gen_comp(&mut self) {
        let rhs = self.pop_operand();
        let relop = self.pop();
        let lhs = self.pop_operand();
        match (lhs, relop, rhs) {
            (Some(lhs), SemanticValue::Relop(opcode), Some(rhs)) => {
                let dest = self.new_temp();
                self.emit(Instruction::three(opcode, lhs, rhs, dest.clone()));
                self.push_operand(dest);
            }
            _ => self.push(SemanticValue::Unresolved),
        }
    }

    /// Address of `base[index]`, wrapped as an indirect operand.
    fn gen_index(&mut self) {
        let index = self.pop_operand();
        let base = self.pop_operand();
        let (Some(base), Some(index)) = (base, index) else {
            self.push(SemanticValue::Unresolved);
            return;
        };
        let offset = self.new_temp();
        let step = Operand::immediate(self.temps.step());
        self.emit(Instruction::three(Opcode::Mult, index, step, offset.clone()));
        let address = self.temps.get_temp();
        self.emit(Instruction::three(
            Opcode::Add,
            base,
            offset,
            Operand::Direct(address),
        ));
        self.push_operand(Operand::Indirect(address));
    }

    fn gen_parr(&mut self) {
        let value = self.pop_operand();
        let cell = self.temps.get_arr_temp();
        if let Some(value) = value {
            self.emit(Instruction::assign(value, Operand::Direct(cell)));
        }
    }

    fn gen_arr_len(&mut self) {
        let SemanticValue::ArrayStart(start) = self.pop() else {
            self.push(SemanticValue::Unresolved);
            return;
        };
        let count = (self.temps.array_pointer() - start) / self.temps.step();
        if let Some(SemanticValue::Operand(Operand::Direct(address))) = self.semantic_stack.last() {
            let address = *address;
            self.symbol_table.set_count(address, count);
        }
        self.push_operand(Operand::immediate(start));
    }

    fn save(&mut self) {
        let index = self.program_block.reserve();
        self.push(SemanticValue::Index(index));
    }

    fn label(&mut self) {
        let head = self.program_block.len();
        self.push(SemanticValue::Index(head));
        self.loops.push(LoopContext {
            head,
            breaks: vec![],
        });
    }

    /// Conditional slot from `save`: jump `extra` quadruples past the current end when false.
    fn patch_conditional(&mut self, extra: usize) {
        let index = self.pop_index();
        let condition = self.pop_operand();
        let target = self.program_block.len() + extra;
        if let Some(index) = index {
            self.patch_jpf(index, condition, target);
        }
    }

    fn patch_jpf(&mut self, index: usize, condition: Option<Operand>, target: usize) {
        let instruction = match condition {
            Some(condition) => Instruction::jpf(condition, target),
            None => Instruction::jp(Operand::Direct(target)),
        };
        self.program_block.patch(index, instruction);
    }

    fn patch_unconditional(&mut self) {
        if let Some(index) = self.pop_index() {
            let target = self.program_block.len();
            self.program_block.patch(index, Instruction::jp(Operand::Direct(target)));
        }
    }

    fn gen_while(&mut self) {
        let exit = self.pop_index();
        let condition = self.pop_operand();
        let label = self.pop_index();
        let context = self.loops.pop().unwrap_or_default();
        let head = label.unwrap_or(context.head);

        let back_jump = self.emit(Instruction::jp(Operand::Direct(head)));
        let end = back_jump + 1;
        if let Some(exit) = exit {
            self.patch_jpf(exit, condition, end);
        }
        for index in context.breaks {
            self.program_block.patch(index, Instruction::jp(Operand::Direct(end)));
        }
    }

    fn gen_break(&mut self) {
        let index = self.program_block.reserve();
        match self.loops.last_mut() {
            Some(context) => context.breaks.push(index),
            None => self.error(SemanticError::BreakOutsideLoop),
        }
    }

    fn gen_continue(&mut self) {
        match self.loops.last() {
            Some(context) => {
                let head = context.head;
                self.emit(Instruction::jp(Operand::Direct(head)));
            }
            None => self.error(SemanticError::ContinueOutsideLoop),
        }
    }

    fn gen_func_call_start(&mut self) {
        let lexeme = match self.pop() {
            SemanticValue::Operand(Operand::Direct(address)) => {
                self.symbol_table.lexeme_of(address).map(str::to_string)
            }
            _ => None,
        };
        self.calls.push(PendingCall {
            lexeme,
            args: 0,
            printed: vec![],
        });
    }

    /// Arguments go onto the runtime stack as soon as they are evaluated;
    /// `output` keeps them for its PRINT quadruples instead.
    fn gen_add_arg(&mut self) {
        let value = self.pop_operand();
        let Some(call) = self.calls.last_mut() else {
            warn!("argument outside of a call at line {}", self.line);
            return;
        };
        call.args += 1;

        if call.is_output() {
            call.printed.extend(value);
        } else if call.lexeme.is_some() {
            let value = value.unwrap_or_else(|| Operand::immediate(0));
            self.runtime_stack.push(&mut self.program_block, value);
        }
    }

    fn gen_func_call_finish(&mut self) {
        let Some(call) = self.calls.pop() else {
            self.push(SemanticValue::Unresolved);
            return;
        };
        let Some(lexeme) = call.lexeme.as_deref() else {
            self.push(SemanticValue::Unresolved);
            return;
        };

        if call.is_output() {
            for value in call.printed {
                self.emit(Instruction::print(value));
            }
            self.push(SemanticValue::Void);
            return;
        }

        let target = match self.symbol_table.resolve_call_target(lexeme, call.args) {
            CallResolution::Exact(symbol) => Some((symbol.entry, symbol.has_return_value, false)),
            CallResolution::Fallback(symbol) => Some((symbol.entry, symbol.has_return_value, true)),
            CallResolution::Unknown => None,
        };
        let Some((entry, has_return_value, mismatch)) = target else {
            self.error(SemanticError::NotDefined(lexeme.to_string()));
            self.runtime_stack.release(&mut self.program_block, call.args);
            self.push(SemanticValue::Unresolved);
            return;
        };
        if mismatch {
            self.error(SemanticError::ArgsMismatch(lexeme.to_string()));
        }

        // return address: two quadruples for the push, one for the jump
        let continuation = self.program_block.len() + 3;
        self.runtime_stack.push(&mut self.program_block, Operand::immediate(continuation));
        self.emit(Instruction::jp(Operand::Direct(entry.unwrap_or_default())));

        if has_return_value {
            let value = self.runtime_stack.pop(&mut self.program_block, &mut self.temps);
            self.runtime_stack.release(&mut self.program_block, call.args + 1);
            self.push_operand(value);
        } else {
            self.runtime_stack.release(&mut self.program_block, call.args + 2);
            self.push(SemanticValue::Void);
        }
    }

    fn gen_pfunc(&mut self, lexeme: &str) {
        let address = self
            .symbol_table
            .add_symbol(lexeme, SymbolKind::Function, self.line, true);
        self.push_operand(Operand::Direct(address));
        self.functions.push(FunctionFrame {
            address,
            lexeme: lexeme.to_string(),
            is_main: lexeme == "main",
            overloaded: false,
            outer_loops: vec![],
        });
    }

    /// The first function other than `main` is preceded by the jump to `main`.
    fn gen_save_func(&mut self) {
        let needs_jump = self.functions.last().is_some_and(|f| !f.is_main);
        if needs_jump && self.main_jump.is_none() {
            self.main_jump = Some(self.program_block.reserve());
        }
    }

    fn gen_set_func_start(&mut self) {
        let entry = self.program_block.len();
        let outer_loops = std::mem::take(&mut self.loops);
        if let Some(frame) = self.functions.last_mut() {
            frame.outer_loops = outer_loops;
            self.symbol_table.set_entry(frame.address, entry);
        }
        self.symbol_table.push_scope();
    }

    fn gen_pparam(&mut self, lexeme: &str) {
        self.symbol_table
            .add_symbol(lexeme, SymbolKind::Parameter, self.line, true);
        if let Some(frame) = self.functions.last() {
            self.symbol_table.increment_count(frame.address);
        }
    }

    /// Overload check and prologue, once the parameter list is known.
    fn gen_func_def_start(&mut self) {
        let Some(frame) = self.functions.last() else {
            return;
        };
        let (address, is_main) = (frame.address, frame.is_main);

        if !self.symbol_table.is_last_function_valid() {
            let lexeme = frame.lexeme.clone();
            self.error(SemanticError::Overloading(lexeme));
            if let Some(frame) = self.functions.last_mut() {
                frame.overloaded = true;
            }
        }

        if is_main {
            if self.main_jump.is_some() {
                self.runtime_stack.init(&mut self.program_block);
            }
            return;
        }

        // slot 1 below the pointer holds the return address, the arguments sit beneath it
        let params = self.symbol_table.parameters_of(address);
        let n = params.len();
        for (k, param) in params.into_iter().enumerate() {
            let value = self
                .runtime_stack
                .access(&mut self.program_block, &mut self.temps, 1 + n - k);
            self.emit(Instruction::assign(value, Operand::Direct(param)));
        }
    }

    fn gen_func_def_finish(&mut self) {
        let value = self.pop_operand();
        let in_function = self.functions.last().is_some_and(|f| !f.is_main);
        if !in_function {
            let exit = self.program_block.reserve();
            self.main_exits.push(exit);
            return;
        }

        let value = value.unwrap_or_else(|| Operand::immediate(0));
        self.runtime_stack.push(&mut self.program_block, value);
        let target = match self
            .runtime_stack
            .access(&mut self.program_block, &mut self.temps, 2)
        {
            Operand::Direct(address) => Operand::Indirect(address),
            other => other,
        };
        self.emit(Instruction::jp(target));
    }

    fn gen_pop_func_address(&mut self) {
        let popped = match self.pop() {
            SemanticValue::Operand(Operand::Direct(address)) => Some(address),
            _ => None,
        };
        if let Some(address) = popped.or(self.functions.last().map(|f| f.address)) {
            self.symbol_table.kill_block(address);
        }
        self.symbol_table.pop_scope();
    }

    fn gen_check_func(&mut self) {
        let Some(frame) = self.functions.pop() else {
            return;
        };
        if frame.overloaded {
            self.symbol_table.kill(frame.address);
        }
        self.loops = frame.outer_loops;
    }

    fn gen_jump_main(&mut self) {
        let main_entry = self
            .symbol_table
            .lookup_function("main")
            .and_then(|s| s.entry);
        if main_entry.is_none() {
            self.error(SemanticError::MainMissing);
        }

        if let Some(index) = self.main_jump {
            let target = main_entry.unwrap_or(self.program_block.len());
            self.program_block.patch(index, Instruction::jp(Operand::Direct(target)));
        }
        let end = self.program_block.len();
        for index in std::mem::take(&mut self.main_exits) {
            self.program_block.patch(index, Instruction::jp(Operand::Direct(end)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenKind;

    fn token(kind: TokenKind, lexeme: &str) -> Token {
        Token::new(kind, lexeme, 1)
    }

    fn run(codegen: &mut Codegen, steps: &[(Action, &str)]) {
        for (action, lexeme) in steps {
            codegen.generate(*action, &token(TokenKind::Id, lexeme));
        }
    }

    #[test]
    fn literal_assignment_goes_through_temporary() {
        let mut codegen = Codegen::new(MemoryLayout::default());
        run(
            &mut codegen,
            &[
                (Action::Psym, "x"),
                (Action::AddSym, "="),
                (Action::Pnum, "1"),
                (Action::CheckVoid, ";"),
                (Action::Assign, ";"),
            ],
        );
        assert_eq!(
            codegen.program_block().to_string(),
            "0\t(ASSIGN, #1, 1500, )\n1\t(ASSIGN, 1500, 104, )\n"
        );
        assert!(codegen.semantic_stack().is_empty());
    }

    #[test]
    fn undefined_identifier_poisons_expression() {
        let mut codegen = Codegen::new(MemoryLayout::default());
        run(
            &mut codegen,
            &[
                (Action::Psym, "x"),
                (Action::AddSym, "="),
                (Action::Pid, "y"),
                (Action::Pnum, "2"),
                (Action::Add, ";"),
                (Action::Assign, ";"),
            ],
        );
        assert!(codegen
            .errors()
            .contains(&SemanticError::NotDefined("y".to_string())));
        // only the literal was materialized
        assert_eq!(codegen.program_block().len(), 1);
    }

    #[test]
    fn if_without_else_jumps_past_body() {
        let mut codegen = Codegen::new(MemoryLayout::default());
        run(
            &mut codegen,
            &[
                (Action::Pnum, "1"),
                (Action::CompOp, "<"),
                (Action::Pnum, "2"),
                (Action::Comp, ":"),
                (Action::Save, ":"),
                (Action::Pnum, "3"),
                (Action::Pop, ";"),
                (Action::Jpf, ";"),
            ],
        );
        let pb = codegen.program_block();
        assert_eq!(pb.get(3), Some(&Instruction::jpf(Operand::Direct(1508), 5)));
        assert!(!pb.has_placeholders());
    }

    #[test]
    fn break_outside_loop_leaves_dangling_slot() {
        let mut codegen = Codegen::new(MemoryLayout::default());
        run(&mut codegen, &[(Action::Break, "break"), (Action::Continue, "continue")]);
        assert!(codegen.errors().contains(&SemanticError::BreakOutsideLoop));
        assert!(codegen.errors().contains(&SemanticError::ContinueOutsideLoop));
        assert_eq!(codegen.program_block().len(), 1);
        assert!(codegen.program_block().has_placeholders());
    }

    #[test]
    fn underflow_does_not_panic() {
        let mut codegen = Codegen::new(MemoryLayout::default());
        run(
            &mut codegen,
            &[(Action::Assign, ";"), (Action::While, ";"), (Action::Jp, ";")],
        );
        assert!(codegen.program_block().len() <= 1);
    }
}
