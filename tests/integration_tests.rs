use std::collections::HashMap;

use quadc::analyzer::SemanticError;
use quadc::codegen::{Instruction, Opcode, Operand, ProgramBlock};
use quadc::config::MemoryLayout;
use quadc::parser::SyntaxError;
use quadc::{compile, compile_with_layout, CODE_NOT_GENERATED};

/// Executes generated quadruples and collects every PRINTed value.
struct Machine<'a> {
    code: &'a ProgramBlock,
    memory: HashMap<usize, i64>,
    printed: Vec<i64>,
}

impl<'a> Machine<'a> {
    fn new(code: &'a ProgramBlock) -> Self {
        Self {
            code,
            memory: HashMap::new(),
            printed: vec![],
        }
    }

    fn load(&self, address: usize) -> i64 {
        self.memory.get(&address).copied().unwrap_or(0)
    }

    fn value(&self, operand: &Operand) -> i64 {
        match operand {
            Operand::Direct(address) => self.load(*address),
            Operand::Immediate(literal) => literal.parse().unwrap(),
            Operand::Indirect(address) => self.load(self.load(*address) as usize),
        }
    }

    fn address(&self, operand: &Operand) -> usize {
        match operand {
            Operand::Direct(address) => *address,
            Operand::Indirect(address) => self.load(*address) as usize,
            Operand::Immediate(literal) => panic!("immediate #{literal} used as a destination"),
        }
    }

    fn run(mut self) -> Vec<i64> {
        let mut pc = 0;
        let mut steps = 0;
        while let Some(instruction) = self.code.get(pc) {
            steps += 1;
            assert!(steps < 100_000, "program does not terminate");

            let Some(opcode) = instruction.opcode() else {
                panic!("reached an unpatched quadruple at {pc}");
            };
            let args = instruction.args();
            assert_eq!(args.len(), opcode.arity());
            pc += 1;
            match opcode {
                Opcode::Assign => {
                    let value = self.value(&args[0]);
                    let dest = self.address(&args[1]);
                    self.memory.insert(dest, value);
                }
                Opcode::Add | Opcode::Sub | Opcode::Mult | Opcode::Eq | Opcode::Lt => {
                    let (lhs, rhs) = (self.value(&args[0]), self.value(&args[1]));
                    let result = match opcode {
                        Opcode::Add => lhs + rhs,
                        Opcode::Sub => lhs - rhs,
                        Opcode::Mult => lhs * rhs,
                        Opcode::Eq => i64::from(lhs == rhs),
                        _ => i64::from(lhs < rhs),
                    };
                    let dest = self.address(&args[2]);
                    self.memory.insert(dest, result);
                }
                Opcode::Jp => pc = self.address(&args[0]),
                Opcode::Jpf => {
                    if self.value(&args[0]) == 0 {
                        pc = self.address(&args[1]);
                    }
                }
                Opcode::Print => {
                    let value = self.value(&args[0]);
                    self.printed.push(value);
                }
            }
        }
        self.printed
    }
}

fn run(source: &str) -> Vec<i64> {
    let compilation = compile(source);
    assert!(
        compilation.syntax_errors.is_empty(),
        "{}",
        compilation.syntax_errors
    );
    let program = compilation
        .program()
        .unwrap_or_else(|| panic!("{}", compilation.semantic_errors));
    assert!(!program.has_placeholders());
    Machine::new(program).run()
}

fn semantic_errors(source: &str) -> Vec<SemanticError> {
    let compilation = compile(source);
    assert_eq!(compilation.program_text(), CODE_NOT_GENERATED);
    compilation
        .semantic_errors
        .iter()
        .map(|(_, e)| e.clone())
        .collect()
}

#[test]
fn scalar_assignments_use_temporaries() {
    let compilation = compile("x = 1;\ny = 2;");
    assert_eq!(
        compilation.program_block.to_string(),
        "0\t(ASSIGN, #1, 1500, )\n\
         1\t(ASSIGN, 1500, 104, )\n\
         2\t(ASSIGN, #2, 1504, )\n\
         3\t(ASSIGN, 1504, 108, )\n"
    );
    // no main
    assert_eq!(
        compilation.semantic_errors.to_string(),
        "#2 : Semantic Error! main function not found.\n"
    );
    assert_eq!(compilation.program_text(), CODE_NOT_GENERATED);
}

#[test]
fn loop_control_targets() {
    let source = "def main():
    i = 0;
    while (i < 3)
        i = i + 1;
        if i == 1: continue; ;
        if i == 2: break; ;
    ;
;";
    let compilation = compile(source);
    let program = compilation.program().unwrap();
    assert_eq!(program.len(), 18);
    assert_eq!(program.get(4), Some(&Instruction::jpf(Operand::Direct(1508), 17)));
    assert_eq!(program.get(11), Some(&Instruction::jp(Operand::Direct(2))));
    assert_eq!(program.get(15), Some(&Instruction::jp(Operand::Direct(17))));
    assert_eq!(program.get(16), Some(&Instruction::jp(Operand::Direct(2))));
    assert_eq!(program.get(17), Some(&Instruction::jp(Operand::Direct(18))));
    assert!(!program.has_placeholders());
}

#[test]
fn while_with_continue_and_break() {
    let source = "def main():
    i = 0;
    s = 0;
    while (i < 10)
        i = i + 1;
        if i == 3: continue; ;
        if 7 < i: break; ;
        s = s + i;
    ;
    output(s);
;";
    assert_eq!(run(source), vec![25]);
}

#[test]
fn function_call_returns_value() {
    let source = "def f(a):
    return a + 1;
;
def main():
    output(f(41));
;";
    assert_eq!(run(source), vec![42]);
}

#[test]
fn call_sequence_layout() {
    let source = "def f(a):
    return a + 1;
;
def main():
    output(f(41));
;";
    let compilation = compile(source);
    let program = compilation.program().unwrap();
    assert_eq!(program.get(0), Some(&Instruction::jp(Operand::Direct(16))));
    assert_eq!(
        program.get(16),
        Some(&Instruction::assign(Operand::immediate(8000), Operand::Direct(500)))
    );
    assert_eq!(program.get(10).unwrap().to_string(), "(JP, @1520, , )");
    assert_eq!(program.get(22), Some(&Instruction::jp(Operand::Direct(1))));
    assert_eq!(program.get(26).unwrap().to_string(), "(PRINT, 1536, , )");
}

#[test]
fn overloads_dispatch_on_arity() {
    let source = "def f(a):
    return a;
;
def f(a, b):
    return a + b;
;
def main():
    output(f(1));
    output(f(2, 3));
;";
    assert_eq!(run(source), vec![1, 5]);
}

#[test]
fn power_is_a_counting_loop() {
    let source = "def main():
    output(2 ** 10);
    output(2 ** 0);
    output(3 * 2 ** 2);
;";
    assert_eq!(run(source), vec![1024, 1, 12]);
}

#[test]
fn arrays_are_indexed_through_base_address() {
    let source = "def main():
    a = [5, 7, 9];
    output(a[2]);
    a[0] = a[1];
    output(a[0]);
;";
    assert_eq!(run(source), vec![9, 7]);

    let compilation = compile(source);
    let a = compilation
        .symbol_table
        .iter()
        .find(|s| s.lexeme == "a")
        .unwrap();
    assert_eq!(a.count, 3);
}

#[test]
fn functions_shadow_unless_global() {
    let source = "x = 5;
def f():
    x = 9;
    return x;
;
def g():
    global x;
    x = 9;
;
def main():
    y = f();
    output(x);
    g();
    output(x);
    output(y);
;";
    assert_eq!(run(source), vec![5, 9, 9]);
}

#[test]
fn if_else_takes_one_branch() {
    let source = "def main():
    x = 3;
    if x < 2: output(1); else: output(2); ;
    if x == 3: output(3); ;
    output(4);
;";
    assert_eq!(run(source), vec![2, 3, 4]);
}

#[test]
fn return_in_main_ends_program() {
    let source = "def main():
    output(1);
    return;
    output(2);
;";
    assert_eq!(run(source), vec![1]);
}

#[test]
fn undefined_identifier() {
    let errors = semantic_errors("def main():\n x = y;\n;");
    assert_eq!(errors, vec![SemanticError::NotDefined("y".to_string())]);
}

#[test]
fn break_and_continue_outside_loop() {
    let errors = semantic_errors("def main():\n break;\n continue;\n;");
    assert_eq!(
        errors,
        vec![
            SemanticError::BreakOutsideLoop,
            SemanticError::ContinueOutsideLoop
        ]
    );
}

#[test]
fn void_result_used_as_operand() {
    let source = "def g():
    x = 1;
;
def main():
    y = g() + 1;
;";
    assert_eq!(semantic_errors(source), vec![SemanticError::VoidOperand]);
}

#[test]
fn argument_count_mismatch() {
    let source = "def f(a):
    return a;
;
def main():
    x = f(1, 2);
;";
    assert_eq!(
        semantic_errors(source),
        vec![SemanticError::ArgsMismatch("f".to_string())]
    );
}

#[test]
fn duplicate_overload_is_rejected() {
    let source = "def f(a):
    return a;
;
def f(b):
    return b;
;
def main():
    output(f(1));
;";
    let compilation = compile(source);
    assert_eq!(
        compilation.semantic_errors.to_string(),
        "#4 : Semantic Error! Function 'f' has already been defined \
         with this number of arguments.\n"
    );
    let live: Vec<_> = compilation
        .symbol_table
        .iter()
        .filter(|s| s.live && s.lexeme == "f")
        .collect();
    assert_eq!(live.len(), 1);
}

#[test]
fn syntax_errors_are_reported_per_line() {
    let compilation = compile("def main():\n x = ;\n;");
    assert!(compilation
        .syntax_errors
        .contains(&SyntaxError::Missing("C".to_string())));

    let compilation = compile("def main():\n x = 1");
    assert_eq!(
        compilation.syntax_errors.to_string(),
        "#2 : syntax error, Unexpected EOF\n"
    );
}

#[test]
fn custom_memory_layout() {
    let compilation = compile_with_layout("x = 1;", MemoryLayout::with_temp_start(2000));
    assert_eq!(
        compilation.program_block.get(0),
        Some(&Instruction::assign(Operand::immediate(1), Operand::Direct(2000)))
    );
}
