//! Folding and algebraic identities applied at construction time.
//!
//! `x * 0`, `0 * x` and `0 / x` fold to zero without looking at `x`, even
//! though `x` may later evaluate to an infinity or NaN. Downstream consumers
//! rely on this folding, so it is kept as is.

use super::opcode::OpCode;
use crate::traits::{MathScalar, is_identical_one, is_identical_zero};

/// Result of a construction shortcut: no node needs to be allocated
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Shortcut<B> {
    /// Fold to a constant
    Value(B),
    /// Reuse the left operand unchanged
    Left,
    /// Reuse the right operand unchanged
    Right,
}

/// Evaluate a binary opcode on two constants
pub(crate) fn fold_binary<B: MathScalar>(op: OpCode, a: B, b: B) -> B {
    match op {
        OpCode::Add => a + b,
        OpCode::Sub => a - b,
        OpCode::Mul => a * b,
        OpCode::Div => a / b,
        OpCode::Pow => a.powf(b),
        _ => unreachable!("{op} is not a binary operation"),
    }
}

/// Evaluate a unary opcode on a constant
pub(crate) fn fold_unary<B: MathScalar>(op: OpCode, x: B) -> B {
    match op {
        OpCode::Abs => x.abs(),
        OpCode::Acos => x.acos(),
        OpCode::Asin => x.asin(),
        OpCode::Atan => x.atan(),
        OpCode::Cosh => x.cosh(),
        OpCode::Cos => x.cos(),
        OpCode::Exp => x.exp(),
        OpCode::Log => x.ln(),
        OpCode::Sinh => x.sinh(),
        OpCode::Sin => x.sin(),
        OpCode::Sqrt => x.sqrt(),
        OpCode::Tanh => x.tanh(),
        OpCode::Tan => x.tan(),
        OpCode::UnMinus => -x,
        OpCode::Sign => sign(x),
        OpCode::Alias => x,
        _ => unreachable!("{op} is not a unary operation"),
    }
}

/// `1` for positive, `0` for zero, `-1` otherwise (NaN included)
#[inline]
pub(crate) fn sign<B: MathScalar>(x: B) -> B {
    if x > B::zero() {
        B::one()
    } else if x == B::zero() {
        B::zero()
    } else {
        -B::one()
    }
}

/// Decide whether a binary operation can be resolved without a node.
///
/// `lhs` / `rhs` carry the constant value of parameter operands.
pub(crate) fn binary_shortcut<B: MathScalar>(
    op: OpCode,
    lhs: Option<B>,
    rhs: Option<B>,
) -> Option<Shortcut<B>> {
    if let (Some(a), Some(b)) = (lhs, rhs) {
        return Some(Shortcut::Value(fold_binary(op, a, b)));
    }

    match op {
        OpCode::Add => {
            if lhs.is_some_and(is_identical_zero) {
                Some(Shortcut::Right)
            } else if rhs.is_some_and(is_identical_zero) {
                Some(Shortcut::Left)
            } else {
                None
            }
        }
        OpCode::Sub => rhs.is_some_and(is_identical_zero).then_some(Shortcut::Left),
        OpCode::Mul => {
            if let Some(a) = lhs {
                if is_identical_zero(a) {
                    Some(Shortcut::Value(B::zero()))
                } else if is_identical_one(a) {
                    Some(Shortcut::Right)
                } else {
                    None
                }
            } else if let Some(b) = rhs {
                if is_identical_zero(b) {
                    Some(Shortcut::Value(B::zero()))
                } else if is_identical_one(b) {
                    Some(Shortcut::Left)
                } else {
                    None
                }
            } else {
                None
            }
        }
        OpCode::Div => {
            if lhs.is_some_and(is_identical_zero) {
                Some(Shortcut::Value(B::zero()))
            } else if rhs.is_some_and(is_identical_one) {
                Some(Shortcut::Left)
            } else {
                None
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_fold() {
        assert_eq!(
            binary_shortcut(OpCode::Sub, Some(5.0), Some(2.0)),
            Some(Shortcut::Value(3.0))
        );
        assert_eq!(
            binary_shortcut(OpCode::Pow, Some(2.0), Some(3.0)),
            Some(Shortcut::Value(8.0))
        );
    }

    #[test]
    fn test_identities() {
        let none: Option<f64> = None;
        assert_eq!(binary_shortcut(OpCode::Add, Some(0.0), none), Some(Shortcut::Right));
        assert_eq!(binary_shortcut(OpCode::Add, none, Some(0.0)), Some(Shortcut::Left));
        assert_eq!(binary_shortcut(OpCode::Sub, none, Some(0.0)), Some(Shortcut::Left));
        assert_eq!(binary_shortcut(OpCode::Sub, Some(0.0), none), None);
        assert_eq!(binary_shortcut(OpCode::Mul, Some(1.0), none), Some(Shortcut::Right));
        assert_eq!(binary_shortcut(OpCode::Mul, none, Some(1.0)), Some(Shortcut::Left));
        assert_eq!(binary_shortcut(OpCode::Div, none, Some(1.0)), Some(Shortcut::Left));
        assert_eq!(binary_shortcut(OpCode::Div, Some(1.0), none), None);
    }

    #[test]
    fn test_zero_absorbs_without_checking_other_operand() {
        let none: Option<f64> = None;
        assert_eq!(
            binary_shortcut(OpCode::Mul, Some(0.0), none),
            Some(Shortcut::Value(0.0))
        );
        assert_eq!(
            binary_shortcut(OpCode::Mul, none, Some(0.0)),
            Some(Shortcut::Value(0.0))
        );
        assert_eq!(
            binary_shortcut(OpCode::Div, Some(0.0), none),
            Some(Shortcut::Value(0.0))
        );
        // x / 0 is left alone
        assert_eq!(binary_shortcut(OpCode::Div, none, Some(0.0)), None);
    }

    #[test]
    fn test_sign() {
        assert_eq!(sign(3.0), 1.0);
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-0.0), 0.0);
        assert_eq!(sign(-2.0), -1.0);
    }
}
