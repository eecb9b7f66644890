use std::fmt::{self, Display};

use num_traits::{One, Zero};

use crate::scalar::Scalar;

/// Forward-mode dual number: a value paired with its tangent (derivative).
///
/// `Dual { re, eps }` represents `re + eps·ε` where `ε² = 0`. The tape replays
/// itself over `Dual` to push one direction through the recorded trace, which
/// is how Jacobian columns and Hessian-vector products are produced.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Dual {
    /// Primal (real) value.
    pub re: f64,
    /// Tangent (derivative) value.
    pub eps: f64,
}

impl Display for Dual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}ε", self.re, self.eps)
    }
}

impl Dual {
    /// Create a new dual number.
    #[inline]
    pub fn new(re: f64, eps: f64) -> Self {
        Dual { re, eps }
    }

    /// Create a constant (zero derivative).
    #[inline]
    pub fn constant(re: f64) -> Self {
        Dual { re, eps: 0.0 }
    }

    /// Create a variable (unit derivative) for differentiation.
    #[inline]
    pub fn variable(re: f64) -> Self {
        Dual { re, eps: 1.0 }
    }

    /// Apply the chain rule: given `f(self.re)` and `f'(self.re)`, produce the dual result.
    #[inline]
    fn chain(self, f_val: f64, f_deriv: f64) -> Self {
        Dual {
            re: f_val,
            eps: self.eps * f_deriv,
        }
    }
}

impl Zero for Dual {
    #[inline]
    fn zero() -> Self {
        Dual::constant(0.0)
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.re == 0.0 && self.eps == 0.0
    }
}

impl One for Dual {
    #[inline]
    fn one() -> Self {
        Dual::constant(1.0)
    }
}

impl Scalar for Dual {
    #[inline]
    fn from_f(val: f64) -> Self {
        Dual::constant(val)
    }

    #[inline]
    fn value(&self) -> f64 {
        self.re
    }

    #[inline]
    fn sin(self) -> Self {
        self.chain(self.re.sin(), self.re.cos())
    }

    #[inline]
    fn cos(self) -> Self {
        self.chain(self.re.cos(), -self.re.sin())
    }

    #[inline]
    fn tan(self) -> Self {
        let t = self.re.tan();
        self.chain(t, 1.0 + t * t)
    }

    #[inline]
    fn powi(self, n: i32) -> Self {
        let val = self.re.powi(n);
        let deriv = f64::from(n) * self.re.powi(n - 1);
        self.chain(val, deriv)
    }

    #[inline]
    fn is_all_zero(&self) -> bool {
        self.re == 0.0 && self.eps == 0.0
    }
}
