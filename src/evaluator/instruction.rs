//! Bytecode of the slot evaluator

use crate::core::{CompareOp, OpCode};

/// One stack-machine instruction
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Instruction<B> {
    /// Push a constant
    LoadConst(B),
    /// Push the content of a slot
    LoadSlot(usize),
    /// Replace the top of the stack with `op(top)`
    Unary(OpCode),
    /// Pop `b`, pop `a`, push `op(a, b)`
    Binary(OpCode),
    /// Pop `if_false`, `if_true`, `right`, `left`; push the selected value
    Select(CompareOp),
    /// Fold the top `len` values with the tags `tags[start..start + len]`
    Chain { start: usize, len: usize },
    /// Pop into a slot
    Store(usize),
    /// Pop into an output
    Output(usize),
}

impl<B> Instruction<B> {
    /// Net change of the stack depth
    pub(crate) fn stack_effect(&self) -> isize {
        match self {
            Instruction::LoadConst(_) | Instruction::LoadSlot(_) => 1,
            Instruction::Unary(_) => 0,
            Instruction::Binary(_) | Instruction::Store(_) | Instruction::Output(_) => -1,
            Instruction::Select(_) => -3,
            Instruction::Chain { len, .. } => 1 - *len as isize,
        }
    }
}
