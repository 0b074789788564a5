use crate::core::OpCode;
use std::fmt;

/// Reasons the equation solver can refuse to isolate a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SolveError {
    /// The target does not appear in the residual
    #[error("the variable to solve for does not appear in the expression")]
    NotPresent,
    /// The target is reachable through more than one path
    #[error("the variable to solve for appears more than once in the expression")]
    MultipleOccurrences,
    /// An operation on the path to the target cannot be inverted
    #[error("unable to invert operation '{0}' while solving")]
    Unsolvable(OpCode),
}

/// Errors that can occur while building or generating code from an operation graph
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodeGenError {
    /// Two variables recorded by different handlers were combined
    #[error(
        "attempting to use several source code generation handlers in the same source code generation"
    )]
    CrossGraph,

    /// The handler that owns a variable no longer exists
    #[error("the code handler owning this variable has been dropped")]
    HandlerDropped,

    /// The variable refers to a node that is not (or no longer) part of the handler
    #[error("the node does not belong to this handler")]
    ForeignNode,

    /// The graph is borrowed by a live generation bundle
    #[error("the operation graph is in use by an active code generation")]
    GraphInUse,

    /// An ordering comparison was applied to a non-parameter value
    #[error("cannot use the '{op}' comparison operator on non parameter variables")]
    InvalidComparison { op: &'static str },

    /// A node expected to be an independent variable is not in the roster
    #[error("variable not found in the independent variable vector")]
    NotIndependent,

    /// Failure during independent-variable elimination
    #[error("elimination failed: {0}")]
    Solve(#[from] SolveError),

    /// Operation not supported by the selected backend
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Wrong number of independent values passed to an evaluator
    #[error("expected {expected} independent values, got {got}")]
    EvalInputMismatch { expected: usize, got: usize },

    /// Batch columns of different lengths
    #[error("all input columns must have the same length")]
    EvalColumnLengthMismatch,

    /// Renderer failed to write into its output
    #[error("failed to write generated source: {0}")]
    Format(#[from] fmt::Error),
}

impl CodeGenError {
    /// Create an `InvalidComparison` for the given operator symbol
    pub fn invalid_comparison(op: &'static str) -> Self {
        CodeGenError::InvalidComparison { op }
    }

    /// Create an `UnsupportedOperation` error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        CodeGenError::UnsupportedOperation(msg.into())
    }

    /// True for usage errors that can never be recovered from by retrying
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CodeGenError::CrossGraph | CodeGenError::HandlerDropped | CodeGenError::ForeignNode
        )
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, CodeGenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CodeGenError::invalid_comparison("<=");
        assert_eq!(
            err.to_string(),
            "cannot use the '<=' comparison operator on non parameter variables"
        );

        let err: CodeGenError = SolveError::Unsolvable(OpCode::Sin).into();
        assert!(err.to_string().contains("sin"));
        assert!(!err.is_fatal());
        assert!(CodeGenError::CrossGraph.is_fatal());
    }
}
