//! Operator, `num_traits` and [`Scalar`] implementations for [`BReverse`].
//!
//! Each operator records an opcode to the active bytecode tape. Operations
//! whose operands are all untracked constants are computed directly and
//! never touch the tape.

use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use num_traits::{One, Zero};

use crate::breverse::BReverse;
use crate::bytecode_tape;
use crate::opcode::{OpCode, UNUSED};
use crate::scalar::Scalar;

/// Record a binary op, promoting constants as needed.
#[inline]
fn brev_binary_op(lhs: BReverse, rhs: BReverse, op: OpCode, value: f64) -> BReverse {
    if lhs.is_constant() && rhs.is_constant() {
        return BReverse::constant(value);
    }
    let index = bytecode_tape::with_active_btape(|t| {
        let li = lhs.ensure_on_tape(t);
        let ri = rhs.ensure_on_tape(t);
        t.push_op(op, li, ri, value)
    });
    BReverse { value, index }
}

/// Record a unary op.
#[inline]
fn brev_unary_op(x: BReverse, op: OpCode, value: f64) -> BReverse {
    if x.is_constant() {
        return BReverse::constant(value);
    }
    let index = bytecode_tape::with_active_btape(|t| t.push_op(op, x.index, UNUSED, value));
    BReverse { value, index }
}

// ──────────────────────────────────────────────
//  BReverse ↔ BReverse operators
// ──────────────────────────────────────────────

impl Add for BReverse {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        brev_binary_op(self, rhs, OpCode::Add, self.value + rhs.value)
    }
}

impl Sub for BReverse {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        brev_binary_op(self, rhs, OpCode::Sub, self.value - rhs.value)
    }
}

impl Mul for BReverse {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        brev_binary_op(self, rhs, OpCode::Mul, self.value * rhs.value)
    }
}

impl Div for BReverse {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        brev_binary_op(self, rhs, OpCode::Div, self.value / rhs.value)
    }
}

impl Neg for BReverse {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        brev_unary_op(self, OpCode::Neg, -self.value)
    }
}

// Assign variants delegate to the binary ops.
impl AddAssign for BReverse {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for BReverse {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for BReverse {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

// ──────────────────────────────────────────────
//  num_traits
// ──────────────────────────────────────────────

impl Zero for BReverse {
    #[inline]
    fn zero() -> Self {
        BReverse::constant(0.0)
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.value == 0.0
    }
}

impl One for BReverse {
    #[inline]
    fn one() -> Self {
        BReverse::constant(1.0)
    }
}

// ──────────────────────────────────────────────
//  Scalar: elementary functions push opcodes
// ──────────────────────────────────────────────

impl Scalar for BReverse {
    #[inline]
    fn from_f(val: f64) -> Self {
        BReverse::constant(val)
    }

    #[inline]
    fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    fn sin(self) -> Self {
        brev_unary_op(self, OpCode::Sin, self.value.sin())
    }

    #[inline]
    fn cos(self) -> Self {
        brev_unary_op(self, OpCode::Cos, self.value.cos())
    }

    #[inline]
    fn tan(self) -> Self {
        brev_unary_op(self, OpCode::Tan, self.value.tan())
    }

    #[inline]
    fn powi(self, n: i32) -> Self {
        let value = self.value.powi(n);
        if self.is_constant() {
            return BReverse::constant(value);
        }
        let index = bytecode_tape::with_active_btape(|t| t.push_powi(self.index, n, value));
        BReverse { value, index }
    }
}
