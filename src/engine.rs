//! Record-once, replay-many derivative engine.
//!
//! The objective and every constraint row are recorded on one multi-output
//! tape with outputs `[f, g_0, …, g_{m-1}]`. Gradient, constraint Jacobian
//! and Hessian of the Lagrangian are then obtained by replaying that tape.

use crate::api::record_multi;
use crate::bytecode_tape::BytecodeTape;
use crate::error::{EvalError, TapeError};
use crate::formulation::Formulation;
use crate::sparse::{self, JacobianSparsityPattern, SparsityPattern};

/// State of the cached forward sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CachedPoint {
    /// No sweep since construction or the last invalidation.
    Empty,
    /// Tape values hold a finite sweep at the current point.
    Valid,
    /// The current point produced a non-finite output.
    Rejected,
}

/// Tape plus the sparsity patterns and colorings derived from it.
#[derive(Debug, Clone)]
pub struct DerivativeEngine {
    tape: BytecodeTape,
    num_variables: usize,
    num_constraints: usize,
    jac_pattern: JacobianSparsityPattern,
    jac_colors: Vec<u32>,
    jac_num_colors: u32,
    jac_structure: Vec<(usize, usize)>,
    hess_pattern: SparsityPattern,
    hess_colors: Vec<u32>,
    hess_num_colors: u32,
    hess_structure: Vec<(usize, usize)>,
    cached: CachedPoint,
    forward_sweeps: usize,
    adjoint_buf: Vec<f64>,
    weights_buf: Vec<f64>,
}

impl DerivativeEngine {
    /// Record `formulation` at `x` and derive both sparsity patterns.
    pub fn generate(formulation: &Formulation, x: &[f64]) -> Result<Self, TapeError> {
        let num_variables = formulation.num_variables();
        let num_constraints = formulation.num_constraints();
        debug_assert_eq!(x.len(), num_variables);

        let (tape, _) = record_multi(|v| formulation.outputs(v), x);

        if tape.num_outputs() != 1 + num_constraints {
            return Err(TapeError::OutputCount {
                expected: 1 + num_constraints,
                got: tape.num_outputs(),
            });
        }
        if let Some(entry) = tape.first_non_finite() {
            return Err(TapeError::NonFinite { entry });
        }

        let jac_pattern = tape.detect_jacobian_sparsity(1..1 + num_constraints);
        let (jac_colors, jac_num_colors) = sparse::column_coloring(&jac_pattern);
        let jac_structure = coo_pairs(&jac_pattern.rows, &jac_pattern.cols);

        let hess_pattern = tape.detect_hessian_sparsity();
        let (hess_colors, hess_num_colors) = sparse::greedy_coloring(&hess_pattern);
        let hess_structure = coo_pairs(&hess_pattern.rows, &hess_pattern.cols);

        tracing::info!(
            ops = tape.num_ops(),
            nnz_jac = jac_pattern.nnz(),
            nnz_hess = hess_pattern.nnz(),
            jac_colors = jac_num_colors,
            hess_colors = hess_num_colors,
            "tape generated"
        );

        Ok(Self {
            tape,
            num_variables,
            num_constraints,
            jac_pattern,
            jac_colors,
            jac_num_colors,
            jac_structure,
            hess_pattern,
            hess_colors,
            hess_num_colors,
            hess_structure,
            // the recording pass left the tape values at x, but the solver
            // always opens with new_x = true
            cached: CachedPoint::Empty,
            forward_sweeps: 0,
            adjoint_buf: Vec::new(),
            weights_buf: Vec::new(),
        })
    }

    /// The recorded tape.
    pub fn tape(&self) -> &BytecodeTape {
        &self.tape
    }

    /// Ordered Jacobian nonzero positions `(row, col)`.
    pub fn jacobian_structure(&self) -> &[(usize, usize)] {
        &self.jac_structure
    }

    /// Ordered lower-triangle Hessian nonzero positions `(row, col)`, `row ≥ col`.
    pub fn hessian_structure(&self) -> &[(usize, usize)] {
        &self.hess_structure
    }

    /// Forward-tangent sweeps per Jacobian evaluation.
    pub fn jacobian_colors(&self) -> u32 {
        self.jac_num_colors
    }

    /// Hessian-vector products per Hessian evaluation.
    pub fn hessian_colors(&self) -> u32 {
        self.hess_num_colors
    }

    /// Number of forward sweeps run since generation.
    pub fn forward_sweeps(&self) -> usize {
        self.forward_sweeps
    }

    /// Bring the tape values to `x`, reusing the last sweep unless `new_x`.
    fn ensure_point(&mut self, x: &[f64], new_x: bool) -> Result<(), EvalError> {
        check_len("x", self.num_variables, x.len())?;

        if new_x || self.cached == CachedPoint::Empty {
            if x.iter().any(|v| !v.is_finite()) {
                self.cached = CachedPoint::Rejected;
            } else {
                self.tape.forward(x);
                self.forward_sweeps += 1;
                self.cached = if self.tape.outputs_finite() {
                    CachedPoint::Valid
                } else {
                    CachedPoint::Rejected
                };
            }
        }

        match self.cached {
            CachedPoint::Valid => Ok(()),
            _ => {
                tracing::debug!("evaluation point rejected: non-finite value");
                Err(EvalError::NonFinite {
                    what: "objective or constraint",
                })
            }
        }
    }

    /// Objective value at `x`.
    pub fn objective(&mut self, x: &[f64], new_x: bool) -> Result<f64, EvalError> {
        self.ensure_point(x, new_x)?;
        Ok(self.tape.values[self.tape.output_indices[0] as usize])
    }

    /// Constraint values at `x`, written into `g`.
    pub fn constraints(&mut self, x: &[f64], new_x: bool, g: &mut [f64]) -> Result<(), EvalError> {
        check_len("constraint", self.num_constraints, g.len())?;
        self.ensure_point(x, new_x)?;
        for (gi, &idx) in g.iter_mut().zip(&self.tape.output_indices[1..]) {
            *gi = self.tape.values[idx as usize];
        }
        Ok(())
    }

    /// Objective gradient at `x` by one reverse sweep.
    pub fn gradient(&mut self, x: &[f64], new_x: bool, grad: &mut [f64]) -> Result<(), EvalError> {
        check_len("gradient", self.num_variables, grad.len())?;
        self.ensure_point(x, new_x)?;
        self.tape.output_gradient_with_buf(0, &mut self.adjoint_buf, grad);
        check_finite("gradient", grad)
    }

    /// Jacobian values at `x`, in [`jacobian_structure`](Self::jacobian_structure) order.
    pub fn jacobian_values(
        &mut self,
        x: &[f64],
        new_x: bool,
        values: &mut [f64],
    ) -> Result<(), EvalError> {
        check_len("jacobian", self.jac_structure.len(), values.len())?;
        self.ensure_point(x, new_x)?;
        self.tape.sparse_jacobian_with_pattern(
            x,
            1..1 + self.num_constraints,
            &self.jac_pattern,
            &self.jac_colors,
            self.jac_num_colors,
            values,
        );
        check_finite("jacobian", values)
    }

    /// Values of the Hessian of `obj_factor·f + Σ lambda_i·g_i` at `x`, in
    /// [`hessian_structure`](Self::hessian_structure) order.
    pub fn hessian_values(
        &mut self,
        x: &[f64],
        new_x: bool,
        obj_factor: f64,
        lambda: &[f64],
        values: &mut [f64],
    ) -> Result<(), EvalError> {
        check_len("multiplier", self.num_constraints, lambda.len())?;
        check_len("hessian", self.hess_structure.len(), values.len())?;
        self.ensure_point(x, new_x)?;

        self.weights_buf.clear();
        self.weights_buf.push(obj_factor);
        self.weights_buf.extend_from_slice(lambda);
        if self.weights_buf.iter().any(|w| !w.is_finite()) {
            return Err(EvalError::NonFinite {
                what: "lagrangian weights",
            });
        }

        self.tape.sparse_hessian_with_pattern(
            x,
            &self.weights_buf,
            &self.hess_pattern,
            &self.hess_colors,
            self.hess_num_colors,
            values,
        );
        check_finite("hessian", values)
    }
}

fn coo_pairs(rows: &[u32], cols: &[u32]) -> Vec<(usize, usize)> {
    rows.iter()
        .zip(cols)
        .map(|(&r, &c)| (r as usize, c as usize))
        .collect()
}

fn check_len(what: &'static str, expected: usize, got: usize) -> Result<(), EvalError> {
    if expected != got {
        return Err(EvalError::BufferLength {
            what,
            expected,
            got,
        });
    }
    Ok(())
}

fn check_finite(what: &'static str, values: &[f64]) -> Result<(), EvalError> {
    if values.iter().any(|v| !v.is_finite()) {
        tracing::debug!(what, "evaluation point rejected: non-finite derivative");
        return Err(EvalError::NonFinite { what });
    }
    Ok(())
}
