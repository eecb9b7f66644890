use crate::opcode::{self, OpCode, UNUSED};

impl super::BytecodeTape {
    /// Core reverse sweep over primal values already on the tape.
    ///
    /// Expects `adjoints` to be pre-seeded by the caller (length = `num_variables`).
    fn reverse_sweep_core(&self, adjoints: &mut [f64]) {
        for i in (self.num_inputs as usize..self.opcodes.len()).rev() {
            let adj = adjoints[i];
            if adj == 0.0 {
                continue;
            }

            match self.opcodes[i] {
                OpCode::Input | OpCode::Const => continue,
                op => {
                    adjoints[i] = 0.0;
                    let [a_idx, b_idx] = self.arg_indices[i];
                    let (a, b) = self.operands(i, &self.values);
                    let r = self.values[i];
                    let (da, db) = opcode::reverse_partials(op, a, b, r);

                    adjoints[a_idx as usize] += da * adj;
                    if b_idx != UNUSED && op.is_binary() {
                        adjoints[b_idx as usize] += db * adj;
                    }
                }
            }
        }
    }

    /// Reverse sweep with weighted seeds for every output.
    ///
    /// Computes `∑_i weights[i] · ∂output_i/∂x`, a vector-Jacobian product.
    /// Uses the primal values of the most recent [`forward`](Self::forward).
    pub fn reverse_seeded(&self, weights: &[f64]) -> Vec<f64> {
        assert_eq!(
            weights.len(),
            self.output_indices.len(),
            "seeds length must match number of outputs"
        );

        let mut adjoints = vec![0.0; self.num_variables as usize];
        for (&out_idx, &w) in self.output_indices.iter().zip(weights) {
            adjoints[out_idx as usize] += w;
        }
        self.reverse_sweep_core(&mut adjoints);
        adjoints.truncate(self.num_inputs as usize);
        adjoints
    }

    /// Gradient of a single output with respect to all inputs, written into `grad`.
    ///
    /// Uses the primal values of the most recent [`forward`](Self::forward);
    /// `adjoint_buf` is reused across calls to avoid allocation.
    pub fn output_gradient_with_buf(
        &self,
        output: usize,
        adjoint_buf: &mut Vec<f64>,
        grad: &mut [f64],
    ) {
        let ni = self.num_inputs as usize;
        assert_eq!(grad.len(), ni, "gradient buffer has wrong length");

        adjoint_buf.clear();
        adjoint_buf.resize(self.num_variables as usize, 0.0);
        adjoint_buf[self.output_indices[output] as usize] = 1.0;
        self.reverse_sweep_core(adjoint_buf);
        grad.copy_from_slice(&adjoint_buf[..ni]);
    }
}
