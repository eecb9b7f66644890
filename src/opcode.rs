//! Bytecode opcodes for the bytecode tape.
//!
//! Each opcode represents an elementary operation. The [`eval_forward`] and
//! [`reverse_partials`] functions evaluate / differentiate a single opcode, and
//! both are generic over [`Scalar`] so the same table drives plain replay
//! (`f64`) and tangent replay ([`Dual`](crate::Dual)).

use crate::scalar::Scalar;

/// Sentinel used in `arg_indices[1]` for unary ops (the second argument slot is unused).
pub const UNUSED: u32 = u32::MAX;

/// Elementary operation codes for the bytecode tape.
///
/// Binary ops use both `arg_indices` slots; unary ops use slot 0 only
/// (slot 1 = [`UNUSED`], except for [`OpCode::Powi`] which stores the `i32`
/// exponent reinterpreted as `u32` in slot 1).
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpCode {
    // ── Structural ──
    /// Input variable (leaf node).
    Input,
    /// Scalar constant.
    Const,

    // ── Binary arithmetic ──
    Add,
    Sub,
    Mul,
    Div,

    // ── Unary ──
    Neg,
    /// Integer power. Exponent stored in `arg_indices[1]` as `exp as u32`.
    Powi,

    // ── Trig ──
    Sin,
    Cos,
    Tan,
}

impl OpCode {
    /// Whether the op reads a second tape operand from `arg_indices[1]`.
    #[inline]
    pub fn is_binary(self) -> bool {
        matches!(self, OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div)
    }
}

/// Evaluate a single opcode in the forward direction.
///
/// For binary ops, `a` and `b` are the two operand values. For unary ops, `a`
/// is the operand value and `b` is ignored, except [`OpCode::Powi`] where `b`
/// carries the exponent (see [`powi_exp_decode`]).
#[inline]
pub fn eval_forward<T: Scalar>(op: OpCode, a: T, b: T) -> T {
    match op {
        OpCode::Input | OpCode::Const => {
            // values are already set during tape setup
            unreachable!("Input/Const should not be re-evaluated via eval_forward")
        }

        OpCode::Add => a + b,
        OpCode::Sub => a - b,
        OpCode::Mul => a * b,
        OpCode::Div => a / b,

        OpCode::Neg => -a,
        OpCode::Powi => a.powi(powi_exp_decode(b)),

        OpCode::Sin => a.sin(),
        OpCode::Cos => a.cos(),
        OpCode::Tan => a.tan(),
    }
}

/// Compute reverse-mode partial derivatives for a single opcode.
///
/// Returns `(∂result/∂arg0, ∂result/∂arg1)`. For unary ops the second partial
/// is zero. `a`, `b` are the operand values and `r` is the result value.
///
/// Called with `Dual` operands this yields partials whose tangent carries the
/// second-order information needed by forward-over-reverse.
#[inline]
pub fn reverse_partials<T: Scalar>(op: OpCode, a: T, b: T, r: T) -> (T, T) {
    let zero = T::zero();
    let one = T::one();
    match op {
        OpCode::Input | OpCode::Const => (zero, zero),

        OpCode::Add => (one, one),
        OpCode::Sub => (one, -one),
        OpCode::Mul => (b, a),
        OpCode::Div => {
            let inv = one / b;
            (inv, -a * inv * inv)
        }

        OpCode::Neg => (-one, zero),
        OpCode::Powi => {
            let exp = powi_exp_decode(b);
            (T::from_f(f64::from(exp)) * a.powi(exp - 1), zero)
        }

        OpCode::Sin => (a.cos(), zero),
        OpCode::Cos => (-a.sin(), zero),
        // sec² = 1 + tan², reusing the recorded result.
        OpCode::Tan => (one + r * r, zero),
    }
}

/// Recover a `powi` exponent from the value slot used for replay.
///
/// During recording the exponent `n: i32` is stored as `n as u32` in
/// `arg_indices[1]`; replay loops hand it back as `T::from_f(n as f64)`.
#[inline]
pub fn powi_exp_decode<T: Scalar>(b: T) -> i32 {
    b.value() as i32
}

/// Encode a `powi` exponent as a value that can be stored in `arg_indices[1]`.
#[inline]
pub fn powi_exp_encode(exp: i32) -> u32 {
    exp as u32
}

/// Decode the raw `arg_indices[1]` slot of a `Powi` op back into the exponent.
#[inline]
pub fn powi_exp_from_slot(slot: u32) -> i32 {
    slot as i32
}
