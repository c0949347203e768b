use std::fmt;

use crate::codegen::Action;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NonTerminal {
    Program,
    Statements,
    Statement,
    SimpleStmt,
    CompoundStmt,
    AssignmentCall,
    B,
    C,
    ListRest,
    ReturnStmt,
    ReturnValue,
    GlobalStmt,
    FunctionDef,
    Params,
    ParamsPrime,
    IfStmt,
    ElseBlock,
    IterationStmt,
    RelationalExpression,
    Relop,
    Expression,
    ExpressionPrime,
    Term,
    TermPrime,
    Factor,
    Power,
    Primary,
    Arguments,
    ArgumentsPrime,
    Atom,
}

impl NonTerminal {
    pub fn name(&self) -> &'static str {
        match self {
            NonTerminal::Program => "Program",
            NonTerminal::Statements => "Statements",
            NonTerminal::Statement => "Statement",
            NonTerminal::SimpleStmt => "Simple_stmt",
            NonTerminal::CompoundStmt => "Compound_stmt",
            NonTerminal::AssignmentCall => "Assignment_Call",
            NonTerminal::B => "B",
            NonTerminal::C => "C",
            NonTerminal::ListRest => "List_Rest",
            NonTerminal::ReturnStmt => "Return_stmt",
            NonTerminal::ReturnValue => "Return_Value",
            NonTerminal::GlobalStmt => "Global_stmt",
            NonTerminal::FunctionDef => "Function_def",
            NonTerminal::Params => "Params",
            NonTerminal::ParamsPrime => "Params_Prime",
            NonTerminal::IfStmt => "If_stmt",
            NonTerminal::ElseBlock => "Else_block",
            NonTerminal::IterationStmt => "Iteration_stmt",
            NonTerminal::RelationalExpression => "Relational_Expression",
            NonTerminal::Relop => "Relop",
            NonTerminal::Expression => "Expression",
            NonTerminal::ExpressionPrime => "Expression_Prime",
            NonTerminal::Term => "Term",
            NonTerminal::TermPrime => "Term_Prime",
            NonTerminal::Factor => "Factor",
            NonTerminal::Power => "Power",
            NonTerminal::Primary => "Primary",
            NonTerminal::Arguments => "Arguments",
            NonTerminal::ArgumentsPrime => "Arguments_Prime",
            NonTerminal::Atom => "Atom",
        }
    }
}

impl fmt::Display for NonTerminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Terminals are compared by their text: `ID`, `NUM`, `$` or the literal
/// keyword/symbol, matching [`Token::terminal`](crate::lexer::Token::terminal).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrammarSymbol {
    Terminal(&'static str),
    NonTerminal(NonTerminal),
    Action(Action),
}

impl GrammarSymbol {
    pub fn is_action(&self) -> bool {
        matches!(self, GrammarSymbol::Action(_))
    }
}

impl fmt::Display for GrammarSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarSymbol::Terminal(t) => f.write_str(t),
            GrammarSymbol::NonTerminal(nt) => write!(f, "{nt}"),
            GrammarSymbol::Action(action) => write!(f, "{action}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableEntry {
    /// Right-hand side, possibly without any grammar symbol (an epsilon
    /// production that may still carry actions).
    Production(&'static [GrammarSymbol]),
    Synch,
}

pub const END_MARKER: &str = "$";

use GrammarSymbol::{Action as A, NonTerminal as N, Terminal as T};
use NonTerminal::*;

const EPSILON: &[GrammarSymbol] = &[];

const PROGRAM: &[GrammarSymbol] = &[N(Statements), A(Action::JumpMain)];
const STATEMENTS: &[GrammarSymbol] = &[N(Statement), T(";"), N(Statements)];
const STATEMENT_SIMPLE: &[GrammarSymbol] = &[N(SimpleStmt)];
const STATEMENT_COMPOUND: &[GrammarSymbol] = &[N(CompoundStmt)];
const SIMPLE_BREAK: &[GrammarSymbol] = &[T("break"), A(Action::Break)];
const SIMPLE_CONTINUE: &[GrammarSymbol] = &[T("continue"), A(Action::Continue)];
const SIMPLE_ASSIGNMENT_CALL: &[GrammarSymbol] = &[N(AssignmentCall)];
const SIMPLE_RETURN: &[GrammarSymbol] = &[N(ReturnStmt)];
const SIMPLE_GLOBAL: &[GrammarSymbol] = &[N(GlobalStmt)];
const COMPOUND_FUNCTION: &[GrammarSymbol] = &[N(FunctionDef)];
const COMPOUND_IF: &[GrammarSymbol] = &[N(IfStmt)];
const COMPOUND_ITERATION: &[GrammarSymbol] = &[N(IterationStmt)];
const ASSIGNMENT_CALL: &[GrammarSymbol] = &[A(Action::Psym), T("ID"), N(B)];
const B_ASSIGN: &[GrammarSymbol] = &[
    A(Action::AddSym),
    T("="),
    N(C),
    A(Action::CheckVoid),
    A(Action::Assign),
];
const B_INDEXED_ASSIGN: &[GrammarSymbol] = &[
    A(Action::CheckSym),
    T("["),
    N(Expression),
    A(Action::Index),
    T("]"),
    T("="),
    N(C),
    A(Action::CheckVoid),
    A(Action::Assign),
];
const B_CALL: &[GrammarSymbol] = &[
    A(Action::CheckSym),
    A(Action::FuncCallStart),
    T("("),
    N(Arguments),
    T(")"),
    A(Action::FuncCallFinish),
    A(Action::Pop),
];
const C_EXPRESSION: &[GrammarSymbol] = &[N(Expression)];
const C_ARRAY: &[GrammarSymbol] = &[
    A(Action::ArrInit),
    T("["),
    N(Expression),
    A(Action::Parr),
    N(ListRest),
    T("]"),
    A(Action::ArrLen),
];
const LIST_REST: &[GrammarSymbol] = &[T(","), N(Expression), A(Action::Parr), N(ListRest)];
const RETURN_STMT: &[GrammarSymbol] = &[T("return"), N(ReturnValue), A(Action::FuncDefFinish)];
const RETURN_NOTHING: &[GrammarSymbol] = &[A(Action::PushZero)];
const RETURN_EXPRESSION: &[GrammarSymbol] = &[
    N(Expression),
    A(Action::CheckVoid),
    A(Action::HasReturnValue),
];
const GLOBAL_STMT: &[GrammarSymbol] = &[T("global"), A(Action::Global), T("ID")];
const FUNCTION_DEF: &[GrammarSymbol] = &[
    T("def"),
    A(Action::Pfunc),
    T("ID"),
    A(Action::SaveFunc),
    A(Action::SetFuncStart),
    T("("),
    N(Params),
    T(")"),
    A(Action::FuncDefStart),
    T(":"),
    N(Statements),
    A(Action::PushZero),
    A(Action::FuncDefFinish),
    A(Action::PopFuncAddress),
    A(Action::CheckFunc),
];
const PARAMS: &[GrammarSymbol] = &[A(Action::Pparam), T("ID"), N(ParamsPrime)];
const PARAMS_PRIME: &[GrammarSymbol] = &[T(","), A(Action::Pparam), T("ID"), N(ParamsPrime)];
const IF_STMT: &[GrammarSymbol] = &[
    T("if"),
    N(RelationalExpression),
    A(Action::Save),
    T(":"),
    N(Statements),
    N(ElseBlock),
];
const ELSE_NOTHING: &[GrammarSymbol] = &[A(Action::Jpf)];
const ELSE_BLOCK: &[GrammarSymbol] = &[
    T("else"),
    T(":"),
    A(Action::JpfSave),
    N(Statements),
    A(Action::Jp),
];
const ITERATION_STMT: &[GrammarSymbol] = &[
    T("while"),
    A(Action::Label),
    T("("),
    N(RelationalExpression),
    T(")"),
    A(Action::Save),
    N(Statements),
    A(Action::While),
];
const RELATIONAL_EXPRESSION: &[GrammarSymbol] = &[
    N(Expression),
    A(Action::CheckVoid),
    A(Action::CompOp),
    N(Relop),
    N(Expression),
    A(Action::CheckVoid),
    A(Action::Comp),
];
const RELOP_EQ: &[GrammarSymbol] = &[T("==")];
const RELOP_LT: &[GrammarSymbol] = &[T("<")];
const EXPRESSION: &[GrammarSymbol] = &[N(Term), N(ExpressionPrime)];
const EXPRESSION_ADD: &[GrammarSymbol] = &[
    T("+"),
    A(Action::CheckVoid),
    N(Term),
    A(Action::CheckVoid),
    A(Action::Add),
    N(ExpressionPrime),
];
const EXPRESSION_SUB: &[GrammarSymbol] = &[
    T("-"),
    A(Action::CheckVoid),
    N(Term),
    A(Action::CheckVoid),
    A(Action::Sub),
    N(ExpressionPrime),
];
const TERM: &[GrammarSymbol] = &[N(Factor), N(TermPrime)];
const TERM_MULT: &[GrammarSymbol] = &[
    T("*"),
    A(Action::CheckVoid),
    N(Factor),
    A(Action::CheckVoid),
    A(Action::Mult),
    N(TermPrime),
];
const FACTOR: &[GrammarSymbol] = &[N(Atom), N(Power)];
const POWER_PRIMARY: &[GrammarSymbol] = &[N(Primary)];
const POWER: &[GrammarSymbol] = &[
    T("**"),
    A(Action::CheckVoid),
    N(Factor),
    A(Action::CheckVoid),
    A(Action::Power),
];
const PRIMARY_INDEX: &[GrammarSymbol] = &[
    T("["),
    N(Expression),
    A(Action::Index),
    T("]"),
    N(Primary),
];
const PRIMARY_CALL: &[GrammarSymbol] = &[
    A(Action::FuncCallStart),
    T("("),
    N(Arguments),
    T(")"),
    A(Action::FuncCallFinish),
    N(Primary),
];
const ARGUMENTS: &[GrammarSymbol] = &[N(Expression), A(Action::AddArg), N(ArgumentsPrime)];
const ARGUMENTS_PRIME: &[GrammarSymbol] = &[
    T(","),
    N(Expression),
    A(Action::AddArg),
    N(ArgumentsPrime),
];
const ATOM_ID: &[GrammarSymbol] = &[A(Action::Pid), T("ID")];
const ATOM_NUM: &[GrammarSymbol] = &[A(Action::Pnum), T("NUM")];

fn production(rhs: &'static [GrammarSymbol]) -> Option<TableEntry> {
    Some(TableEntry::Production(rhs))
}

/// The LL(1) table. `None` is an empty cell: the lookahead is illegal here.
pub fn lookup(nt: NonTerminal, terminal: &str) -> Option<TableEntry> {
    const SYNCH: Option<TableEntry> = Some(TableEntry::Synch);
    let expression_follow = matches!(terminal, ";" | "]" | ")" | "," | ":" | "==" | "<");
    let term_follow = expression_follow || matches!(terminal, "+" | "-");
    let factor_follow = term_follow || terminal == "*";

    match (nt, terminal) {
        (
            Program,
            "break" | "continue" | "ID" | "return" | "global" | "def" | "if" | "while" | "$",
        ) => production(PROGRAM),

        (Statements, ";" | "else" | "$") => production(EPSILON),
        (
            Statements,
            "break" | "continue" | "ID" | "return" | "global" | "def" | "if" | "while",
        ) => production(STATEMENTS),

        (Statement, "break" | "continue" | "ID" | "return" | "global") => {
            production(STATEMENT_SIMPLE)
        }
        (Statement, "def" | "if" | "while") => production(STATEMENT_COMPOUND),

        (SimpleStmt, "break") => production(SIMPLE_BREAK),
        (SimpleStmt, "continue") => production(SIMPLE_CONTINUE),
        (SimpleStmt, "ID") => production(SIMPLE_ASSIGNMENT_CALL),
        (SimpleStmt, "return") => production(SIMPLE_RETURN),
        (SimpleStmt, "global") => production(SIMPLE_GLOBAL),

        (CompoundStmt, "def") => production(COMPOUND_FUNCTION),
        (CompoundStmt, "if") => production(COMPOUND_IF),
        (CompoundStmt, "while") => production(COMPOUND_ITERATION),

        (AssignmentCall, "ID") => production(ASSIGNMENT_CALL),

        (B, "=") => production(B_ASSIGN),
        (B, "[") => production(B_INDEXED_ASSIGN),
        (B, "(") => production(B_CALL),

        (C, "ID" | "NUM") => production(C_EXPRESSION),
        (C, "[") => production(C_ARRAY),

        (ListRest, "]") => production(EPSILON),
        (ListRest, ",") => production(LIST_REST),

        (ReturnStmt, "return") => production(RETURN_STMT),

        (ReturnValue, ";") => production(RETURN_NOTHING),
        (ReturnValue, "ID" | "NUM") => production(RETURN_EXPRESSION),

        (GlobalStmt, "global") => production(GLOBAL_STMT),

        (FunctionDef, "def") => production(FUNCTION_DEF),

        (Params, "ID") => production(PARAMS),
        (Params, ")") => production(EPSILON),
        (ParamsPrime, ",") => production(PARAMS_PRIME),
        (ParamsPrime, ")") => production(EPSILON),

        (IfStmt, "if") => production(IF_STMT),

        (ElseBlock, ";") => production(ELSE_NOTHING),
        (ElseBlock, "else") => production(ELSE_BLOCK),

        (IterationStmt, "while") => production(ITERATION_STMT),

        (RelationalExpression, "ID" | "NUM") => production(RELATIONAL_EXPRESSION),
        (RelationalExpression, ")" | ":") => SYNCH,

        (Relop, "==") => production(RELOP_EQ),
        (Relop, "<") => production(RELOP_LT),
        (Relop, "ID" | "NUM") => SYNCH,

        (Expression, "ID" | "NUM") => production(EXPRESSION),
        (Expression, _) if expression_follow => SYNCH,

        (ExpressionPrime, "+") => production(EXPRESSION_ADD),
        (ExpressionPrime, "-") => production(EXPRESSION_SUB),
        (ExpressionPrime, _) if expression_follow => production(EPSILON),

        (Term, "ID" | "NUM") => production(TERM),
        (Term, _) if term_follow => SYNCH,

        (TermPrime, "*") => production(TERM_MULT),
        (TermPrime, _) if term_follow => production(EPSILON),

        (Factor, "ID" | "NUM") => production(FACTOR),
        (Factor, _) if factor_follow => SYNCH,

        (Power, "**") => production(POWER),
        (Power, "[" | "(") => production(POWER_PRIMARY),
        (Power, _) if factor_follow => production(POWER_PRIMARY),

        (Primary, "[") => production(PRIMARY_INDEX),
        (Primary, "(") => production(PRIMARY_CALL),
        (Primary, _) if factor_follow => production(EPSILON),

        (Arguments, "ID" | "NUM") => production(ARGUMENTS),
        (Arguments, ")") => production(EPSILON),
        (ArgumentsPrime, ",") => production(ARGUMENTS_PRIME),
        (ArgumentsPrime, ")") => production(EPSILON),

        (Atom, "ID") => production(ATOM_ID),
        (Atom, "NUM") => production(ATOM_NUM),
        (Atom, "[" | "(" | "**") => SYNCH,
        (Atom, _) if factor_follow => SYNCH,

        // statement-level non-terminals resynchronize on the separator
        (
            Statement | SimpleStmt | CompoundStmt | AssignmentCall | B | C | ReturnStmt | GlobalStmt
            | FunctionDef | IfStmt | IterationStmt,
            ";",
        ) => SYNCH,

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_starts_on_any_statement() {
        for t in ["ID", "def", "while", "$"] {
            assert_eq!(lookup(Program, t), production(PROGRAM));
        }
        assert_eq!(lookup(Program, "NUM"), None);
    }

    #[test]
    fn follow_sets_choose_epsilon_or_synch() {
        assert_eq!(lookup(ExpressionPrime, ")"), production(EPSILON));
        assert_eq!(lookup(Expression, ")"), Some(TableEntry::Synch));
        assert_eq!(lookup(TermPrime, "+"), production(EPSILON));
        assert_eq!(lookup(Term, "+"), Some(TableEntry::Synch));
        assert_eq!(lookup(Expression, "+"), None);
        assert_eq!(lookup(Atom, "**"), Some(TableEntry::Synch));
        assert_eq!(lookup(Primary, "**"), None);
    }

    #[test]
    fn action_only_productions_are_epsilon() {
        let Some(TableEntry::Production(rhs)) = lookup(ReturnValue, ";") else {
            panic!("expected a production");
        };
        assert!(rhs.iter().all(GrammarSymbol::is_action));
    }
}
