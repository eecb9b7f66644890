//! Bytecode tape for re-evaluable reverse-mode AD.
//!
//! The tape stores opcodes rather than precomputed multipliers, so it can be
//! re-evaluated at different inputs without re-recording. One recording of
//! the objective and the constraint vector serves every later gradient,
//! Jacobian and Hessian query of a problem instance.
//!
//! # Limitations
//!
//! The tape records one execution path. If the recorded function contains
//! branches (`if x > 0 { ... } else { ... }`), re-evaluating at inputs that
//! take a different branch produces incorrect results. The distance-approach
//! formulas are branch-free.

use crate::opcode::{self, OpCode, UNUSED};
use crate::scalar::Scalar;

mod forward;
mod reverse;
mod sparse;
mod tangent;
mod thread_local;

pub use self::thread_local::{with_active_btape, BtapeGuard};

/// Sentinel index for constant entries (not tracked).
pub const CONSTANT: u32 = u32::MAX;

/// A multi-output bytecode tape that can be re-evaluated at different inputs.
///
/// Created via [`crate::api::record_multi`]. Inputs always occupy tape
/// entries `0..num_inputs`.
#[derive(Clone, Debug)]
pub struct BytecodeTape {
    pub(crate) opcodes: Vec<OpCode>,
    pub(crate) arg_indices: Vec<[u32; 2]>,
    pub(crate) values: Vec<f64>,
    pub(crate) num_inputs: u32,
    pub(crate) num_variables: u32,
    pub(crate) output_indices: Vec<u32>,
}

impl BytecodeTape {
    /// Create an empty bytecode tape.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a bytecode tape with pre-allocated capacity.
    pub fn with_capacity(est_ops: usize) -> Self {
        BytecodeTape {
            opcodes: Vec::with_capacity(est_ops),
            arg_indices: Vec::with_capacity(est_ops),
            values: Vec::with_capacity(est_ops),
            num_inputs: 0,
            num_variables: 0,
            output_indices: Vec::new(),
        }
    }

    /// Register a new input variable. Returns its index.
    ///
    /// Inputs must be registered before any constant or operation.
    #[inline]
    pub fn new_input(&mut self, value: f64) -> u32 {
        debug_assert_eq!(
            self.num_inputs, self.num_variables,
            "inputs must precede every other tape entry"
        );
        let idx = self.num_variables;
        self.num_variables += 1;
        self.num_inputs += 1;
        self.opcodes.push(OpCode::Input);
        self.arg_indices.push([UNUSED, UNUSED]);
        self.values.push(value);
        idx
    }

    /// Register a scalar constant. Returns its index.
    #[inline]
    pub fn push_const(&mut self, value: f64) -> u32 {
        let idx = self.num_variables;
        self.num_variables += 1;
        self.opcodes.push(OpCode::Const);
        self.arg_indices.push([UNUSED, UNUSED]);
        self.values.push(value);
        idx
    }

    /// Record an operation. Returns the result index.
    ///
    /// **Constant folding**: if all operands point to `Const` entries, the
    /// operation is replaced by a single `Const` with the computed value.
    ///
    /// **Algebraic simplification**: identity patterns (`x + 0 → x`,
    /// `x * 1 → x`, `x / 1 → x`) are short-circuited. Absorbing patterns
    /// (`x * 0`) fold to a constant only when the recorded value is zero, so
    /// NaN/Inf operands keep their node.
    #[inline]
    pub fn push_op(&mut self, op: OpCode, arg0: u32, arg1: u32, value: f64) -> u32 {
        let arg0_const = self.opcodes[arg0 as usize] == OpCode::Const;
        let arg1_const = arg1 == UNUSED || self.opcodes[arg1 as usize] == OpCode::Const;
        if arg0_const && arg1_const {
            return self.push_const(value);
        }

        if (arg0_const || arg1_const) && arg1 != UNUSED {
            if let Some(idx) = self.try_algebraic_simplify(op, arg0, arg1, arg0_const, value) {
                return idx;
            }
        }

        let idx = self.num_variables;
        self.num_variables += 1;
        self.opcodes.push(op);
        self.arg_indices.push([arg0, arg1]);
        self.values.push(value);
        idx
    }

    /// Try to simplify a binary op where exactly one argument is a known constant.
    #[inline(never)]
    fn try_algebraic_simplify(
        &mut self,
        op: OpCode,
        arg0: u32,
        arg1: u32,
        arg0_const: bool,
        value: f64,
    ) -> Option<u32> {
        let (konst, other) = if arg0_const {
            (self.values[arg0 as usize], arg1)
        } else {
            (self.values[arg1 as usize], arg0)
        };
        match op {
            OpCode::Add if konst == 0.0 => Some(other),
            OpCode::Sub if !arg0_const && konst == 0.0 => Some(other),
            OpCode::Mul if konst == 1.0 => Some(other),
            OpCode::Mul if konst == 0.0 && value == 0.0 => Some(self.push_const(value)),
            OpCode::Div if !arg0_const && konst == 1.0 => Some(other),
            _ => None,
        }
    }

    /// Record a powi operation. The `i32` exponent is stored in `arg_indices[1]`.
    #[inline]
    pub fn push_powi(&mut self, arg0: u32, exp: i32, value: f64) -> u32 {
        if self.opcodes[arg0 as usize] == OpCode::Const {
            return self.push_const(value);
        }
        if exp == 1 {
            return arg0;
        }

        let idx = self.num_variables;
        self.num_variables += 1;
        self.opcodes.push(OpCode::Powi);
        self.arg_indices.push([arg0, opcode::powi_exp_encode(exp)]);
        self.values.push(value);
        idx
    }

    /// Mark the output variables, in order.
    pub fn set_outputs(&mut self, indices: &[u32]) {
        self.output_indices = indices.to_vec();
    }

    /// Number of output variables.
    #[inline]
    pub fn num_outputs(&self) -> usize {
        self.output_indices.len()
    }

    /// Indices of all output entries in the tape buffer.
    #[inline]
    pub fn output_indices(&self) -> &[u32] {
        &self.output_indices
    }

    /// Output values (available after `forward()` or the recording pass).
    pub fn output_values(&self) -> Vec<f64> {
        self.output_indices
            .iter()
            .map(|&idx| self.values[idx as usize])
            .collect()
    }

    /// Number of input variables.
    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.num_inputs as usize
    }

    /// Number of tape entries (inputs + constants + operations).
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.opcodes.len()
    }

    /// Read the two operands of entry `i` from `vals`.
    ///
    /// `Powi` hands its exponent back through the second slot; unary ops get zero.
    #[inline]
    pub(crate) fn operands<T: Scalar>(&self, i: usize, vals: &[T]) -> (T, T) {
        let op = self.opcodes[i];
        let [a_idx, b_idx] = self.arg_indices[i];
        let a = vals[a_idx as usize];
        let b = if op == OpCode::Powi {
            T::from_f(f64::from(opcode::powi_exp_from_slot(b_idx)))
        } else if b_idx != UNUSED {
            vals[b_idx as usize]
        } else {
            T::zero()
        };
        (a, b)
    }
}

impl Default for BytecodeTape {
    fn default() -> Self {
        Self::new()
    }
}
