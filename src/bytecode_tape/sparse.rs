use std::ops::Range;

use crate::dual::Dual;
use crate::sparse::{JacobianSparsityPattern, SparsityPattern};

impl super::BytecodeTape {
    /// Detect the structural sparsity pattern of the Hessian of any weighted
    /// sum of the outputs.
    ///
    /// Walks the tape forward propagating input-dependency bitsets.
    pub fn detect_hessian_sparsity(&self) -> SparsityPattern {
        crate::sparse::detect_sparsity_impl(
            &self.opcodes,
            &self.arg_indices,
            self.num_inputs as usize,
            self.num_variables as usize,
        )
    }

    /// Detect the structural sparsity pattern of the Jacobian of the outputs in
    /// `outputs`. Row `k` of the pattern is output `outputs.start + k`.
    pub fn detect_jacobian_sparsity(&self, outputs: Range<usize>) -> JacobianSparsityPattern {
        crate::sparse::detect_jacobian_sparsity_impl(
            &self.opcodes,
            &self.arg_indices,
            self.num_inputs as usize,
            self.num_variables as usize,
            &self.output_indices[outputs],
        )
    }

    /// Sparse Jacobian of the outputs in `outputs` via forward-mode column
    /// compression, with a precomputed pattern and [`column_coloring`].
    ///
    /// `jac_values[k]` receives the entry at `(pattern.rows[k], pattern.cols[k])`.
    ///
    /// [`column_coloring`]: crate::sparse::column_coloring
    pub fn sparse_jacobian_with_pattern(
        &self,
        x: &[f64],
        outputs: Range<usize>,
        pattern: &JacobianSparsityPattern,
        colors: &[u32],
        num_colors: u32,
        jac_values: &mut [f64],
    ) {
        let n = self.num_inputs as usize;
        assert_eq!(x.len(), n, "wrong number of inputs");
        assert_eq!(jac_values.len(), pattern.nnz(), "value buffer has wrong length");

        let out_indices = &self.output_indices[outputs];

        let mut dual_input_buf: Vec<Dual> = Vec::with_capacity(n);
        let mut dual_vals_buf: Vec<Dual> = Vec::new();

        for color in 0..num_colors {
            // tangent = 1 for inputs with this color
            dual_input_buf.clear();
            dual_input_buf.extend(
                (0..n).map(|i| Dual::new(x[i], if colors[i] == color { 1.0 } else { 0.0 })),
            );

            self.forward_tangent(&dual_input_buf[..], &mut dual_vals_buf);

            for (k, (&row, &col)) in pattern.rows.iter().zip(pattern.cols.iter()).enumerate() {
                if colors[col as usize] == color {
                    jac_values[k] = dual_vals_buf[out_indices[row as usize] as usize].eps;
                }
            }
        }
    }

    /// Sparse Hessian of `wᵀF` with a precomputed pattern and [`greedy_coloring`].
    ///
    /// Each color costs one forward-over-reverse sweep. `hess_values[k]`
    /// receives the entry at `(pattern.rows[k], pattern.cols[k])`.
    ///
    /// [`greedy_coloring`]: crate::sparse::greedy_coloring
    pub fn sparse_hessian_with_pattern(
        &self,
        x: &[f64],
        weights: &[f64],
        pattern: &SparsityPattern,
        colors: &[u32],
        num_colors: u32,
        hess_values: &mut [f64],
    ) {
        let n = self.num_inputs as usize;
        assert_eq!(x.len(), n, "wrong number of inputs");
        assert_eq!(hess_values.len(), pattern.nnz(), "value buffer has wrong length");

        hess_values.fill(0.0);

        let mut dual_input_buf: Vec<Dual> = Vec::with_capacity(n);
        let mut dual_vals_buf = Vec::new();
        let mut adjoint_buf = Vec::new();
        let mut v = vec![0.0; n];

        for color in 0..num_colors {
            for (vi, &c) in v.iter_mut().zip(colors) {
                *vi = if c == color { 1.0 } else { 0.0 };
            }

            self.weighted_hvp_with_bufs(
                x,
                &v,
                weights,
                &mut dual_input_buf,
                &mut dual_vals_buf,
                &mut adjoint_buf,
            );

            for (k, (&row, &col)) in pattern.rows.iter().zip(pattern.cols.iter()).enumerate() {
                if colors[col as usize] == color {
                    hess_values[k] = adjoint_buf[row as usize].eps;
                }
            }
        }
    }
}
