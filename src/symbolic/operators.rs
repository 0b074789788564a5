//! Operator overloading for [`Symbolic`]
//!
//! Every combination of owned/borrowed symbolic operands is supported, as
//! well as `f32`/`f64` constants on either side. Operators panic when the
//! operands belong to different handlers; use [`Symbolic::try_binary`] to
//! get the error instead.

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use super::{Symbolic, expect_recorded};
use crate::core::OpCode;
use crate::traits::MathScalar;

// ===== Macro for generating operator implementations =====

macro_rules! impl_binary_ops {
    ($($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident => $op:expr);* $(;)?) => {
        $(
            impl<B: MathScalar> $trait<Symbolic<B>> for Symbolic<B> {
                type Output = Symbolic<B>;
                #[track_caller]
                fn $method(self, rhs: Symbolic<B>) -> Symbolic<B> {
                    expect_recorded(self.try_binary($op, &rhs))
                }
            }
            impl<B: MathScalar> $trait<&Symbolic<B>> for Symbolic<B> {
                type Output = Symbolic<B>;
                #[track_caller]
                fn $method(self, rhs: &Symbolic<B>) -> Symbolic<B> {
                    expect_recorded(self.try_binary($op, rhs))
                }
            }
            impl<B: MathScalar> $trait<Symbolic<B>> for &Symbolic<B> {
                type Output = Symbolic<B>;
                #[track_caller]
                fn $method(self, rhs: Symbolic<B>) -> Symbolic<B> {
                    expect_recorded(self.try_binary($op, &rhs))
                }
            }
            impl<B: MathScalar> $trait<&Symbolic<B>> for &Symbolic<B> {
                type Output = Symbolic<B>;
                #[track_caller]
                fn $method(self, rhs: &Symbolic<B>) -> Symbolic<B> {
                    expect_recorded(self.try_binary($op, rhs))
                }
            }
            impl<B: MathScalar> $assign_trait<Symbolic<B>> for Symbolic<B> {
                #[track_caller]
                fn $assign_method(&mut self, rhs: Symbolic<B>) {
                    *self = expect_recorded(self.try_binary($op, &rhs));
                }
            }
            impl<B: MathScalar> $assign_trait<&Symbolic<B>> for Symbolic<B> {
                #[track_caller]
                fn $assign_method(&mut self, rhs: &Symbolic<B>) {
                    *self = expect_recorded(self.try_binary($op, rhs));
                }
            }
        )*
    };
}

// Scalar constants on either side, for each concrete base type
macro_rules! impl_scalar_ops {
    ($scalar:ty: $($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident => $op:expr);* $(;)?) => {
        $(
            impl $trait<$scalar> for Symbolic<$scalar> {
                type Output = Symbolic<$scalar>;
                #[track_caller]
                fn $method(self, rhs: $scalar) -> Symbolic<$scalar> {
                    expect_recorded(self.try_binary($op, &Symbolic::Parameter(rhs)))
                }
            }
            impl $trait<$scalar> for &Symbolic<$scalar> {
                type Output = Symbolic<$scalar>;
                #[track_caller]
                fn $method(self, rhs: $scalar) -> Symbolic<$scalar> {
                    expect_recorded(self.try_binary($op, &Symbolic::Parameter(rhs)))
                }
            }
            impl $trait<Symbolic<$scalar>> for $scalar {
                type Output = Symbolic<$scalar>;
                #[track_caller]
                fn $method(self, rhs: Symbolic<$scalar>) -> Symbolic<$scalar> {
                    expect_recorded(Symbolic::Parameter(self).try_binary($op, &rhs))
                }
            }
            impl $trait<&Symbolic<$scalar>> for $scalar {
                type Output = Symbolic<$scalar>;
                #[track_caller]
                fn $method(self, rhs: &Symbolic<$scalar>) -> Symbolic<$scalar> {
                    expect_recorded(Symbolic::Parameter(self).try_binary($op, rhs))
                }
            }
            impl $assign_trait<$scalar> for Symbolic<$scalar> {
                #[track_caller]
                fn $assign_method(&mut self, rhs: $scalar) {
                    *self = expect_recorded(self.try_binary($op, &Symbolic::Parameter(rhs)));
                }
            }
        )*
    };
}

impl_binary_ops!(
    Add, add, AddAssign, add_assign => OpCode::Add;
    Sub, sub, SubAssign, sub_assign => OpCode::Sub;
    Mul, mul, MulAssign, mul_assign => OpCode::Mul;
    Div, div, DivAssign, div_assign => OpCode::Div;
);

impl_scalar_ops!(f64:
    Add, add, AddAssign, add_assign => OpCode::Add;
    Sub, sub, SubAssign, sub_assign => OpCode::Sub;
    Mul, mul, MulAssign, mul_assign => OpCode::Mul;
    Div, div, DivAssign, div_assign => OpCode::Div;
);

impl_scalar_ops!(f32:
    Add, add, AddAssign, add_assign => OpCode::Add;
    Sub, sub, SubAssign, sub_assign => OpCode::Sub;
    Mul, mul, MulAssign, mul_assign => OpCode::Mul;
    Div, div, DivAssign, div_assign => OpCode::Div;
);

// Negation
impl<B: MathScalar> Neg for Symbolic<B> {
    type Output = Symbolic<B>;
    #[track_caller]
    fn neg(self) -> Symbolic<B> {
        expect_recorded(self.try_unary(OpCode::UnMinus))
    }
}

impl<B: MathScalar> Neg for &Symbolic<B> {
    type Output = Symbolic<B>;
    #[track_caller]
    fn neg(self) -> Symbolic<B> {
        expect_recorded(self.try_unary(OpCode::UnMinus))
    }
}

impl<B: MathScalar> Symbolic<B> {
    /// Unary plus: the value itself, no node is created
    #[inline]
    pub fn plus(&self) -> Symbolic<B> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CodeHandler;

    #[test]
    fn test_parameter_arithmetic_folds() {
        let a: Symbolic = 6.0.into();
        let b: Symbolic = 3.0.into();
        assert_eq!(&a + &b, Symbolic::Parameter(9.0));
        assert_eq!(&a - &b, Symbolic::Parameter(3.0));
        assert_eq!(&a * &b, Symbolic::Parameter(18.0));
        assert_eq!(a / b, Symbolic::Parameter(2.0));
        assert_eq!(-Symbolic::Parameter(2.0), Symbolic::Parameter(-2.0));
    }

    #[test]
    fn test_scalar_on_both_sides() {
        let handler = CodeHandler::<f64>::new();
        let x = handler.make_variable();
        let a = 2.0 * &x;
        let b = &x - 1.0;
        let c = 1.0 / &x;
        assert!(a.is_variable() && b.is_variable() && c.is_variable());
        assert_eq!(handler.node_count(), 4);

        let graph = handler.graph();
        assert_eq!(graph[c.node_id().unwrap()].op(), OpCode::Div);
    }

    #[test]
    fn test_f32_base() {
        let handler = CodeHandler::<f32>::new();
        let x = handler.make_variable();
        let y = &x + 0.0_f32;
        assert_eq!(y, x);
        let z = 3.0_f32 * x;
        assert!(z.is_variable());
    }

    #[test]
    fn test_compound_assignment() {
        let handler = CodeHandler::<f64>::new();
        let x = handler.make_variable();

        let mut acc = Symbolic::Parameter(1.0);
        acc *= &x;
        // 1 * x is x itself
        assert_eq!(acc, x);

        acc += 2.0;
        acc -= &x;
        acc /= 4.0;
        assert_eq!(handler.node_count(), 4);
        let graph = handler.graph();
        assert_eq!(graph[acc.node_id().unwrap()].op(), OpCode::Div);
    }

    #[test]
    fn test_negation_and_plus() {
        let handler = CodeHandler::<f64>::new();
        let x = handler.make_variable();
        assert_eq!(x.plus(), x);
        let n = -&x;
        let graph = handler.graph();
        assert_eq!(graph[n.node_id().unwrap()].op(), OpCode::UnMinus);
    }

    #[test]
    #[should_panic(expected = "several source code generation handlers")]
    fn test_cross_graph_operator_panics() {
        let h1 = CodeHandler::<f64>::new();
        let h2 = CodeHandler::<f64>::new();
        let _ = h1.make_variable() + h2.make_variable();
    }
}
