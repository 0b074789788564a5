//! Stack-machine interpreter for compiled slot programs

use super::SlotEvaluator;
use super::instruction::Instruction;
use crate::core::ChainOp;
use crate::core::rules::{fold_binary, fold_unary};
use crate::error::{CodeGenError, Result};
use crate::traits::MathScalar;

#[inline]
fn pop<B: MathScalar>(stack: &mut Vec<B>) -> B {
    let value = stack.pop();
    debug_assert!(value.is_some(), "evaluator stack underflow");
    value.unwrap_or_else(B::nan)
}

fn fold_chain<B: MathScalar>(values: &[B], tags: &[ChainOp]) -> B {
    let mut acc = match tags.first() {
        Some(ChainOp::Mul | ChainOp::Div) => B::one(),
        _ => B::zero(),
    };
    for (&value, tag) in values.iter().zip(tags) {
        acc = match tag {
            ChainOp::Add => acc + value,
            ChainOp::Sub => acc - value,
            ChainOp::Mul => acc * value,
            ChainOp::Div => acc / value,
        };
    }
    acc
}

impl<B: MathScalar> SlotEvaluator<B> {
    /// Run the program for one point.
    ///
    /// `slots` and `stack` are scratch buffers reused between points.
    pub(crate) fn run(&self, inputs: &[B], slots: &mut Vec<B>, stack: &mut Vec<B>, out: &mut [B]) {
        slots.clear();
        slots.resize(self.slot_count, B::nan());
        slots[1..=self.input_count].copy_from_slice(inputs);
        stack.clear();

        for instr in self.instructions.iter() {
            match *instr {
                Instruction::LoadConst(value) => stack.push(value),
                Instruction::LoadSlot(slot) => stack.push(slots[slot]),
                Instruction::Unary(op) => {
                    let x = pop(stack);
                    stack.push(fold_unary(op, x));
                }
                Instruction::Binary(op) => {
                    let b = pop(stack);
                    let a = pop(stack);
                    stack.push(fold_binary(op, a, b));
                }
                Instruction::Select(cmp) => {
                    let if_false = pop(stack);
                    let if_true = pop(stack);
                    let right = pop(stack);
                    let left = pop(stack);
                    stack.push(if cmp.apply(left, right) { if_true } else { if_false });
                }
                Instruction::Chain { start, len } => {
                    let base = stack.len().saturating_sub(len);
                    let value = fold_chain(&stack[base..], &self.tags[start..start + len]);
                    stack.truncate(base);
                    stack.push(value);
                }
                Instruction::Store(slot) => slots[slot] = pop(stack),
                Instruction::Output(index) => out[index] = pop(stack),
            }
        }
    }

    /// Evaluate the outputs for one value of the independents
    pub fn evaluate(&self, inputs: &[B]) -> Result<Vec<B>> {
        if inputs.len() != self.input_count {
            return Err(CodeGenError::EvalInputMismatch {
                expected: self.input_count,
                got: inputs.len(),
            });
        }
        let mut slots = Vec::with_capacity(self.slot_count);
        let mut stack = Vec::with_capacity(self.stack_size);
        let mut out = vec![B::nan(); self.output_count];
        self.run(inputs, &mut slots, &mut stack, &mut out);
        Ok(out)
    }

    fn check_columns(&self, columns: &[&[B]]) -> Result<usize> {
        if columns.len() != self.input_count {
            return Err(CodeGenError::EvalInputMismatch {
                expected: self.input_count,
                got: columns.len(),
            });
        }
        let n_points = columns.first().map_or(1, |c| c.len());
        if columns.iter().any(|c| c.len() != n_points) {
            return Err(CodeGenError::EvalColumnLengthMismatch);
        }
        Ok(n_points)
    }

    /// Evaluate many points given column-major input data.
    ///
    /// `columns[i][p]` is independent `i` at point `p`. The result is indexed
    /// by output, then point. Without independents a single point is evaluated.
    pub fn eval_batch(&self, columns: &[&[B]]) -> Result<Vec<Vec<B>>> {
        let n_points = self.check_columns(columns)?;
        let mut results = vec![Vec::with_capacity(n_points); self.output_count];

        let mut inputs = Vec::with_capacity(self.input_count);
        let mut slots = Vec::with_capacity(self.slot_count);
        let mut stack = Vec::with_capacity(self.stack_size);
        let mut out = vec![B::nan(); self.output_count];
        for point in 0..n_points {
            inputs.clear();
            inputs.extend(columns.iter().map(|c| c[point]));
            self.run(&inputs, &mut slots, &mut stack, &mut out);
            for (column, &value) in results.iter_mut().zip(&out) {
                column.push(value);
            }
        }
        Ok(results)
    }

    /// Parallel version of [`eval_batch`](Self::eval_batch)
    #[cfg(feature = "parallel")]
    pub fn eval_batch_parallel(&self, columns: &[&[B]]) -> Result<Vec<Vec<B>>>
    where
        B: Send + Sync,
    {
        use rayon::prelude::*;

        const MIN_PARALLEL_SIZE: usize = 256;

        let n_points = self.check_columns(columns)?;
        if n_points < MIN_PARALLEL_SIZE {
            return self.eval_batch(columns);
        }

        let chunk_size = (n_points / rayon::current_num_threads()).max(64);
        let rows: Vec<Vec<B>> = (0..n_points)
            .into_par_iter()
            .with_min_len(chunk_size)
            .map_init(
                || {
                    (
                        Vec::with_capacity(self.input_count),
                        Vec::with_capacity(self.slot_count),
                        Vec::with_capacity(self.stack_size),
                    )
                },
                |(inputs, slots, stack), point| {
                    inputs.clear();
                    inputs.extend(columns.iter().map(|c| c[point]));
                    let mut out = vec![B::nan(); self.output_count];
                    self.run(inputs, slots, stack, &mut out);
                    out
                },
            )
            .collect();

        let mut results = vec![Vec::with_capacity(n_points); self.output_count];
        for row in rows {
            for (column, value) in results.iter_mut().zip(row) {
                column.push(value);
            }
        }
        Ok(results)
    }
}
