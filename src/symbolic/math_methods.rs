//! Elementary functions on [`Symbolic`] values
//!
//! Parameters are evaluated immediately; variables record a node.

use super::{Symbolic, expect_recorded};
use crate::core::{CompareOp, OpCode};
use crate::traits::MathScalar;

// ===== Macro for generating math function methods =====

macro_rules! impl_math_functions {
    ($($fn_name:ident => $op:expr),* $(,)?) => {
        impl<B: MathScalar> Symbolic<B> {
            $(
                #[track_caller]
                pub fn $fn_name(&self) -> Symbolic<B> {
                    expect_recorded(self.try_unary($op))
                }
            )*
        }
    };
}

impl_math_functions!(
    // Trigonometric
    sin => OpCode::Sin, cos => OpCode::Cos, tan => OpCode::Tan,
    asin => OpCode::Asin, acos => OpCode::Acos, atan => OpCode::Atan,
    // Hyperbolic
    sinh => OpCode::Sinh, cosh => OpCode::Cosh, tanh => OpCode::Tanh,
    // Exponential and logarithmic
    exp => OpCode::Exp, log => OpCode::Log,
    // Others
    sqrt => OpCode::Sqrt, abs => OpCode::Abs, sign => OpCode::Sign,
);

impl<B: MathScalar> Symbolic<B> {
    /// Base-10 logarithm, recorded as `log(x) / ln(10)`
    #[track_caller]
    pub fn log10(&self) -> Symbolic<B> {
        let ln = self.log();
        expect_recorded(ln.try_binary(OpCode::Div, &Symbolic::Parameter(B::LN_10())))
    }

    /// `self` raised to `exponent`
    #[track_caller]
    pub fn pow(&self, exponent: impl Into<Symbolic<B>>) -> Symbolic<B> {
        expect_recorded(self.try_binary(OpCode::Pow, &exponent.into()))
    }

    /// Conditional expression `left <cmp> right ? if_true : if_false`
    ///
    /// # Panics
    ///
    /// When the operands belong to different handlers.
    #[track_caller]
    pub fn cond_exp(
        cmp: CompareOp,
        left: &Symbolic<B>,
        right: &Symbolic<B>,
        if_true: &Symbolic<B>,
        if_false: &Symbolic<B>,
    ) -> Symbolic<B> {
        expect_recorded(Self::try_cond_exp(cmp, left, right, if_true, if_false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CodeHandler;

    #[test]
    fn test_functions_fold_parameters() {
        let p: Symbolic = 0.0.into();
        assert_eq!(p.sin(), Symbolic::Parameter(0.0));
        assert_eq!(p.exp(), Symbolic::Parameter(1.0));
        let lg = Symbolic::Parameter(100.0_f64).log10().parameter_value().unwrap();
        assert!((lg - 2.0).abs() < 1e-12);
        assert_eq!(Symbolic::Parameter(-3.0).sign(), Symbolic::Parameter(-1.0));
        assert_eq!(Symbolic::Parameter(2.0).pow(10.0), Symbolic::Parameter(1024.0));
    }

    #[test]
    fn test_functions_record_nodes() {
        let handler = CodeHandler::<f64>::new();
        let x = handler.make_variable();
        let s = x.sqrt();
        let l = x.log10();
        let p = x.pow(s.clone());

        let graph = handler.graph();
        assert_eq!(graph[s.node_id().unwrap()].op(), OpCode::Sqrt);
        assert_eq!(graph[l.node_id().unwrap()].op(), OpCode::Div);
        assert_eq!(graph[p.node_id().unwrap()].op(), OpCode::Pow);
        // x, sqrt, log, div, pow
        assert_eq!(graph.node_count(), 5);
    }
}
