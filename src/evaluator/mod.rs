//! Numeric replay of a generation pass
//!
//! [`SlotEvaluator`] compiles a [`GenerationData`] bundle into a small stack
//! machine that honors the scheduled order and the (possibly reused) slot
//! ids exactly the way generated code would. It is the reference used to
//! check that scheduling, chain flattening and slot reuse preserve the value
//! of every output.
//!
//! # Example
//! ```
//! use symb_codegen::{CodeHandler, DefaultNameGenerator, DefaultPolicy, SlotEvaluator};
//!
//! let handler = CodeHandler::<f64>::new();
//! let u = handler.make_variables(2);
//! let z = &u[0] / 1.0 + &u[1] * &u[1];
//!
//! let names = DefaultNameGenerator::default();
//! let data = handler.generate(&[z], &DefaultPolicy, &names).unwrap();
//! let eval = SlotEvaluator::compile(&data).unwrap();
//! assert_eq!(eval.evaluate(&[2.0, 3.0]).unwrap(), vec![11.0]);
//! ```

mod compiler;
mod execution;
mod instruction;

use compiler::Compiler;
use instruction::Instruction;

use crate::core::ChainOp;
use crate::error::Result;
use crate::language::GenerationData;
use crate::traits::MathScalar;

/// Compiled program replaying a generation pass
#[derive(Debug, Clone)]
pub struct SlotEvaluator<B: MathScalar = f64> {
    instructions: Box<[Instruction<B>]>,
    tags: Box<[ChainOp]>,
    input_count: usize,
    slot_count: usize,
    output_count: usize,
    stack_size: usize,
}

impl<B: MathScalar> SlotEvaluator<B> {
    /// Compile the evaluation order of `data`.
    ///
    /// # Errors
    /// Returns an error if the bundle holds an operation without numeric
    /// semantics or refers to nodes outside its graph.
    pub fn compile(data: &GenerationData<'_, B>) -> Result<Self> {
        let eval = Compiler::new(data).finish()?;
        log::trace!(
            "compiled {} instructions, {} slots, stack depth {}",
            eval.instructions.len(),
            eval.slot_count,
            eval.stack_size
        );
        Ok(eval)
    }

    #[inline]
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    #[inline]
    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// Slots used, the unused slot 0 included
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    #[inline]
    pub fn stack_size(&self) -> usize {
        self.stack_size
    }

    #[inline]
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }
}
