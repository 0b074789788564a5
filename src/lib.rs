//! Operation-graph engine for source code generation
//!
//! Scalar computations are recorded by operating on [`Symbolic`] values
//! created by a [`CodeHandler`]. A generation pass then turns the recorded
//! graph into an ordered list of assignments that a target [`Language`]
//! renders as source code.
//!
//! # Features
//! - Constant folding and trivial identities (`x + 0`, `x * 1`, `x * 0`) at
//!   construction time
//! - Reference counting and scheduling driven by a pluggable
//!   [`MaterializationPolicy`]
//! - Flattening of add/sub and mul/div chains
//! - Temporary slot reuse with a LIFO free list
//! - Elimination of independents by solving a residual locally
//! - A slot-level [`SlotEvaluator`] that replays a pass numerically
//!
//! # Usage
//! ```
//! use symb_codegen::{CLanguage, CodeHandler, DefaultNameGenerator};
//!
//! let handler = CodeHandler::<f64>::new();
//! let x = handler.make_variables(2);
//! let shared = (&x[0] + &x[1]).sin();
//! let y = &shared * &shared;
//!
//! let source = handler
//!     .generate_code(&[y], &CLanguage::default(), &DefaultNameGenerator::default(), "square")
//!     .unwrap();
//! assert_eq!(source, "   double v[1];\n   v[0] = sin(x[0] + x[1]);\n   y[0] = v[0] * v[0];\n");
//! ```

mod core;
mod dae;
mod error;
mod evaluator;
mod handler;
mod language;
mod symbolic;
pub mod traits;

#[cfg(test)]
mod tests;

pub use crate::core::{Argument, ChainOp, CompareOp, Graph, Node, NodeId, OpCode};
pub use dae::DaeVarInfo;
pub use error::{CodeGenError, Result, SolveError};
pub use evaluator::SlotEvaluator;
pub use handler::{CodeHandler, EquationSolver, HandlerSettings, LocalSolver};
pub use language::{
    CLanguage, DefaultNameGenerator, DefaultPolicy, GenerationData, Language,
    MaterializationPolicy, VariableNameGenerator,
};
pub use symbolic::{Symbolic, Variable};
pub use traits::MathScalar;
