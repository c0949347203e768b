use std::fmt;

/// Semantic actions embedded in the grammar's right-hand sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    // operands
    Pid,
    Pnum,
    Psym,
    AddSym,
    CheckSym,
    CheckVoid,
    Pop,

    // expressions
    Assign,
    Add,
    Sub,
    Mult,
    Power,
    CompOp,
    Comp,
    Index,

    // arrays
    ArrInit,
    Parr,
    ArrLen,

    // control flow
    Save,
    Label,
    Jpf,
    JpfSave,
    Jp,
    While,
    Break,
    Continue,

    // calls
    FuncCallStart,
    AddArg,
    FuncCallFinish,

    // definitions
    Pfunc,
    SaveFunc,
    SetFuncStart,
    Pparam,
    FuncDefStart,
    PushZero,
    HasReturnValue,
    FuncDefFinish,
    PopFuncAddress,
    CheckFunc,
    Global,
    JumpMain,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Pid => "#pid",
            Action::Pnum => "#pnum",
            Action::Psym => "#psym",
            Action::AddSym => "#add_sym",
            Action::CheckSym => "#check_sym",
            Action::CheckVoid => "#check_void",
            Action::Pop => "#pop",
            Action::Assign => "#assign",
            Action::Add => "#add",
            Action::Sub => "#sub",
            Action::Mult => "#mult",
            Action::Power => "#power",
            Action::CompOp => "#comp_op",
            Action::Comp => "#comp",
            Action::Index => "#index",
            Action::ArrInit => "#arr_init",
            Action::Parr => "#parr",
            Action::ArrLen => "#arr_len",
            Action::Save => "#save",
            Action::Label => "#label",
            Action::Jpf => "#jpf",
            Action::JpfSave => "#jpf_save",
            Action::Jp => "#jp",
            Action::While => "#while",
            Action::Break => "#break",
            Action::Continue => "#continue",
            Action::FuncCallStart => "#func_call_start",
            Action::AddArg => "#add_arg",
            Action::FuncCallFinish => "#func_call_finish",
            Action::Pfunc => "#pfunc",
            Action::SaveFunc => "#save_func",
            Action::SetFuncStart => "#set_func_start",
            Action::Pparam => "#pparam",
            Action::FuncDefStart => "#func_def_start",
            Action::PushZero => "#push_zero",
            Action::HasReturnValue => "#has_return_value",
            Action::FuncDefFinish => "#func_def_finish",
            Action::PopFuncAddress => "#pop_func_address",
            Action::CheckFunc => "#check_func",
            Action::Global => "#global",
            Action::JumpMain => "#jump_main",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
