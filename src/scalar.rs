//! The [`Scalar`] trait the objective and constraint formulas are written against.
//!
//! Functions written as `fn f<T: Scalar>(x: &[T]) -> T` run unchanged with plain
//! `f64` (values only), [`Dual`](crate::Dual) (tape replay with tangents) and
//! [`BReverse`](crate::BReverse) (tape recording).

use std::fmt::{Debug, Display};
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use num_traits::{One, Zero};

/// Arithmetic plus the handful of elementary functions the kinematic model and
/// the obstacle duality rows need.
pub trait Scalar:
    Copy
    + Debug
    + Display
    + Default
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
{
    /// Lift a plain float to this scalar (constant, zero derivative).
    fn from_f(val: f64) -> Self;

    /// Extract the primal value.
    fn value(&self) -> f64;

    fn sin(self) -> Self;
    fn cos(self) -> Self;
    fn tan(self) -> Self;
    fn powi(self, n: i32) -> Self;

    /// True when every component (primal and any tangent) is zero.
    ///
    /// Reverse sweeps use this to skip dead adjoints without dropping
    /// tangent contributions.
    #[inline]
    fn is_all_zero(&self) -> bool {
        self.value() == 0.0
    }
}

impl Scalar for f64 {
    #[inline]
    fn from_f(val: f64) -> Self {
        val
    }

    #[inline]
    fn value(&self) -> f64 {
        *self
    }

    #[inline]
    fn sin(self) -> Self {
        f64::sin(self)
    }

    #[inline]
    fn cos(self) -> Self {
        f64::cos(self)
    }

    #[inline]
    fn tan(self) -> Self {
        f64::tan(self)
    }

    #[inline]
    fn powi(self, n: i32) -> Self {
        f64::powi(self, n)
    }
}
