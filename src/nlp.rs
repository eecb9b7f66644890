//! Callback interface an external NLP solver drives.

use crate::bounds::Bounds;
use crate::error::NlpError;
use crate::solution::SolverStatus;

/// Index base of the structure lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStyle {
    Zero,
    One,
}

/// Sizes reported by the structural query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NlpInfo {
    /// Number of decision variables.
    pub n: usize,
    /// Number of constraint rows.
    pub m: usize,
    /// Jacobian nonzeros.
    pub nnz_jac: usize,
    /// Lower-triangle Hessian nonzeros.
    pub nnz_hess: usize,
    pub index_style: IndexStyle,
}

/// Trait for problems an NLP solver can drive.
///
/// The solver calls [`describe_structure`](Self::describe_structure) first,
/// then bounds and the starting point, then evaluations in any order, and
/// [`finalize`](Self::finalize) exactly once. `new_x` tells whether `x`
/// changed since the previous callback. Methods take `&mut self` to allow
/// caching per point.
pub trait NlpProblem {
    /// Sizes and index style. Builds the derivative tape on first call.
    fn describe_structure(&mut self) -> Result<NlpInfo, NlpError>;

    /// Variable bounds and constraint bounds.
    fn bounds(&self) -> Result<(Bounds, Bounds), NlpError>;

    /// Initial iterate.
    fn starting_point(&self) -> Result<Vec<f64>, NlpError>;

    /// Objective value.
    fn objective(&mut self, x: &[f64], new_x: bool) -> Result<f64, NlpError>;

    /// Dense objective gradient, length n.
    fn gradient(&mut self, x: &[f64], new_x: bool, grad: &mut [f64]) -> Result<(), NlpError>;

    /// Dense constraint vector, length m.
    fn constraints(&mut self, x: &[f64], new_x: bool, g: &mut [f64]) -> Result<(), NlpError>;

    /// Ordered Jacobian nonzero positions.
    fn jacobian_structure(&self) -> Result<&[(usize, usize)], NlpError>;

    /// Jacobian values in [`jacobian_structure`](Self::jacobian_structure) order.
    fn jacobian_values(
        &mut self,
        x: &[f64],
        new_x: bool,
        values: &mut [f64],
    ) -> Result<(), NlpError>;

    /// Ordered lower-triangle Hessian nonzero positions.
    fn hessian_structure(&self) -> Result<&[(usize, usize)], NlpError>;

    /// Hessian of `obj_factor·f + Σ lambda_i·g_i` in
    /// [`hessian_structure`](Self::hessian_structure) order.
    fn hessian_values(
        &mut self,
        x: &[f64],
        new_x: bool,
        obj_factor: f64,
        lambda: &[f64],
        values: &mut [f64],
    ) -> Result<(), NlpError>;

    /// Record the final iterate. Valid for any termination status.
    fn finalize(
        &mut self,
        status: SolverStatus,
        x: &[f64],
        multipliers: &[f64],
        objective: f64,
    ) -> Result<(), NlpError>;
}
