//! Translation of a generation bundle into slot bytecode

use super::SlotEvaluator;
use super::instruction::Instruction;
use crate::core::{Argument, ChainOp, NodeId, OpCode};
use crate::error::{CodeGenError, Result};
use crate::language::GenerationData;
use crate::traits::MathScalar;

enum Work<B> {
    Arg(Argument<B>),
    Expand(NodeId),
    Apply(NodeId),
}

/// Internal compiler state
pub(crate) struct Compiler<'d, 'a, B: MathScalar> {
    data: &'d GenerationData<'a, B>,
    instructions: Vec<Instruction<B>>,
    tags: Vec<ChainOp>,
    current_stack: usize,
    max_stack: usize,
}

impl<'d, 'a, B: MathScalar> Compiler<'d, 'a, B> {
    pub(crate) fn new(data: &'d GenerationData<'a, B>) -> Self {
        Self {
            data,
            instructions: Vec::with_capacity(data.variable_order().len() * 4),
            tags: Vec::new(),
            current_stack: 0,
            max_stack: 0,
        }
    }

    fn emit(&mut self, instr: Instruction<B>) {
        let depth = self.current_stack as isize + instr.stack_effect();
        debug_assert!(depth >= 0, "stack underflow while compiling {instr:?}");
        self.current_stack = depth.max(0) as usize;
        self.max_stack = self.max_stack.max(self.current_stack);
        self.instructions.push(instr);
    }

    fn slot_of(&self, id: NodeId) -> Result<usize> {
        self.data
            .node(id)
            .map(|n| n.slot_id())
            .ok_or(CodeGenError::ForeignNode)
    }

    /// Emit the code leaving the value of `work` on the stack.
    ///
    /// Materialized nodes are loaded from their slot, everything else is
    /// expanded in place.
    fn compile(&mut self, first: Work<B>) -> Result<()> {
        let mut work = vec![first];
        while let Some(item) = work.pop() {
            match item {
                Work::Arg(Argument::Param(value)) => self.emit(Instruction::LoadConst(value)),
                Work::Arg(Argument::Node(id)) => {
                    let slot = self.slot_of(id)?;
                    if slot != 0 {
                        self.emit(Instruction::LoadSlot(slot));
                    } else {
                        work.push(Work::Expand(id));
                    }
                }
                Work::Expand(id) => {
                    let node = self.data.node(id).ok_or(CodeGenError::ForeignNode)?;
                    work.push(Work::Apply(id));
                    work.extend(node.args().iter().rev().map(|&a| Work::Arg(a)));
                }
                Work::Apply(id) => self.apply(id)?,
            }
        }
        Ok(())
    }

    fn apply(&mut self, id: NodeId) -> Result<()> {
        let node = self.data.node(id).ok_or(CodeGenError::ForeignNode)?;
        let instr = match node.op() {
            // the target is already on the stack
            OpCode::Alias => return Ok(()),
            OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div | OpCode::Pow => {
                Instruction::Binary(node.op())
            }
            OpCode::AddSub | OpCode::MulDiv => {
                let start = self.tags.len();
                self.tags.extend_from_slice(node.chain());
                Instruction::Chain {
                    start,
                    len: node.args().len(),
                }
            }
            OpCode::UnMinus => Instruction::Unary(OpCode::UnMinus),
            op if op.is_unary_function() => Instruction::Unary(op),
            op => match op.compare_op() {
                Some(cmp) => Instruction::Select(cmp),
                None => {
                    return Err(CodeGenError::unsupported(format!(
                        "'{op}' cannot be evaluated"
                    )));
                }
            },
        };
        self.emit(instr);
        Ok(())
    }

    pub(crate) fn finish(mut self) -> Result<SlotEvaluator<B>> {
        let data = self.data;
        for &id in data.variable_order() {
            let slot = self.slot_of(id)?;
            self.compile(Work::Expand(id))?;
            self.emit(Instruction::Store(slot));
        }
        for (index, &output) in data.outputs().iter().enumerate() {
            self.compile(Work::Arg(output))?;
            self.emit(Instruction::Output(index));
        }
        debug_assert_eq!(self.current_stack, 0);

        Ok(SlotEvaluator {
            instructions: self.instructions.into_boxed_slice(),
            tags: self.tags.into_boxed_slice(),
            input_count: data.independents().len(),
            slot_count: data.max_variable_id() + 1,
            output_count: data.outputs().len(),
            stack_size: self.max_stack,
        })
    }
}
