use crate::dual::Dual;
use crate::opcode::{self, OpCode, UNUSED};
use crate::scalar::Scalar;

impl super::BytecodeTape {
    // ── Forward-over-reverse (second-order) ──

    /// Forward sweep with tangent-carrying numbers. Reads opcodes and constants
    /// from `self`, writing results into `buf`. Does not mutate the tape.
    pub fn forward_tangent<T: Scalar>(&self, inputs: &[T], buf: &mut Vec<T>) {
        assert_eq!(
            inputs.len(),
            self.num_inputs as usize,
            "wrong number of inputs"
        );

        let n = self.num_variables as usize;
        buf.clear();
        buf.resize(n, T::zero());
        buf[..inputs.len()].copy_from_slice(inputs);

        for i in inputs.len()..self.opcodes.len() {
            buf[i] = match self.opcodes[i] {
                OpCode::Input => unreachable!("inputs precede every other tape entry"),
                OpCode::Const => T::from_f(self.values[i]),
                op => {
                    let (a, b) = self.operands(i, &buf[..]);
                    opcode::eval_forward(op, a, b)
                }
            };
        }
    }

    /// Reverse sweep with tangent-carrying adjoints, seeded with one weight per
    /// output. Uses values from [`forward_tangent`](Self::forward_tangent).
    ///
    /// With `Dual` values seeded along `v`, the input adjoints hold
    /// `∇(wᵀF)` in `re` and `∇²(wᵀF)·v` in `eps`.
    pub fn reverse_tangent_seeded<T: Scalar>(
        &self,
        tangent_vals: &[T],
        weights: &[f64],
        buf: &mut Vec<T>,
    ) {
        assert_eq!(
            weights.len(),
            self.output_indices.len(),
            "seeds length must match number of outputs"
        );

        let n = self.num_variables as usize;
        buf.clear();
        buf.resize(n, T::zero());
        for (&out_idx, &w) in self.output_indices.iter().zip(weights) {
            buf[out_idx as usize] += T::from_f(w);
        }

        for i in (self.num_inputs as usize..self.opcodes.len()).rev() {
            match self.opcodes[i] {
                OpCode::Input | OpCode::Const => continue,
                op => {
                    let adj = buf[i];
                    if adj.is_all_zero() {
                        continue;
                    }
                    buf[i] = T::zero();

                    let [a_idx, b_idx] = self.arg_indices[i];
                    let (a, b) = self.operands(i, tangent_vals);
                    let r = tangent_vals[i];
                    let (da, db) = opcode::reverse_partials(op, a, b, r);

                    buf[a_idx as usize] += da * adj;
                    if b_idx != UNUSED && op.is_binary() {
                        buf[b_idx as usize] += db * adj;
                    }
                }
            }
        }
    }

    /// Hessian-vector product of the weighted output sum `wᵀF` via forward-over-reverse.
    ///
    /// Fills `grad` with `∇(wᵀF)(x)` and `hv` with `∇²(wᵀF)(x)·v`. The tape is not
    /// mutated; the three buffers are reused across calls.
    #[allow(clippy::too_many_arguments)]
    pub fn weighted_hvp_with_bufs(
        &self,
        x: &[f64],
        v: &[f64],
        weights: &[f64],
        dual_input_buf: &mut Vec<Dual>,
        dual_vals_buf: &mut Vec<Dual>,
        adjoint_buf: &mut Vec<Dual>,
    ) {
        let n = self.num_inputs as usize;
        assert_eq!(x.len(), n, "wrong number of inputs");
        assert_eq!(v.len(), n, "wrong number of directions");

        dual_input_buf.clear();
        dual_input_buf.extend(x.iter().zip(v).map(|(&xi, &vi)| Dual::new(xi, vi)));

        self.forward_tangent(&dual_input_buf[..], dual_vals_buf);
        self.reverse_tangent_seeded(&dual_vals_buf[..], weights, adjoint_buf);
    }

    /// Hessian-vector product of the weighted output sum `wᵀF`.
    ///
    /// Returns `(∇(wᵀF), ∇²(wᵀF)·v)`.
    pub fn weighted_hvp(&self, x: &[f64], v: &[f64], weights: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let mut dual_input_buf = Vec::new();
        let mut dual_vals_buf = Vec::new();
        let mut adjoint_buf = Vec::new();
        self.weighted_hvp_with_bufs(
            x,
            v,
            weights,
            &mut dual_input_buf,
            &mut dual_vals_buf,
            &mut adjoint_buf,
        );
        let n = self.num_inputs as usize;
        let grad = adjoint_buf[..n].iter().map(|d| d.re).collect();
        let hv = adjoint_buf[..n].iter().map(|d| d.eps).collect();
        (grad, hv)
    }
}
