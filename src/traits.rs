use num_traits::{Float, FloatConst, FromPrimitive, Signed};
use std::fmt::{Debug, Display, LowerExp};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// A trait comprising all operations required for the numeric base type
/// carried by parameters in the operation graph.
///
/// This aggregates `num_traits::Float` (providing sin, cos, exp, etc.),
/// `FloatConst` (PI, LN_10) and the formatting traits renderers rely on.
pub trait MathScalar:
    Float
    + FloatConst
    + FromPrimitive
    + Signed
    + Debug
    + Display
    + LowerExp
    + Copy
    + Clone
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
    + 'static
{
}

// Blanket implementation for any type that satisfies the bounds
impl<T> MathScalar for T where
    T: Float
        + FloatConst
        + FromPrimitive
        + Signed
        + Debug
        + Display
        + LowerExp
        + Copy
        + Clone
        + PartialEq
        + PartialOrd
        + Add<Output = T>
        + Sub<Output = T>
        + Mul<Output = T>
        + Div<Output = T>
        + Neg<Output = T>
        + AddAssign
        + SubAssign
        + MulAssign
        + DivAssign
        + 'static
{
}

// ===== Exact identity helpers =====
// Identities applied while building the graph are structural: `x + 1e-12`
// must still create a node, so these compare exactly.

/// Check if a value is exactly zero (either sign)
#[inline]
pub fn is_identical_zero<B: MathScalar>(n: B) -> bool {
    n == B::zero()
}

/// Check if a value is exactly one
#[inline]
pub fn is_identical_one<B: MathScalar>(n: B) -> bool {
    n == B::one()
}

/// Two parameters are identical when they compare equal as values
#[inline]
pub fn is_identical_equal<B: MathScalar>(a: B, b: B) -> bool {
    a == b
}
