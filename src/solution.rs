//! Solver termination status and the immutable solution record.

use std::fmt;

use nalgebra::DMatrix;

use crate::formulation::Formulation;
use crate::problem::{CONTROL_DIM, FOOTPRINT_FACES, STATE_DIM};

/// Why the external solver stopped. Stored verbatim, never reinterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverStatus {
    Success,
    AcceptablePoint,
    MaxIterations,
    CpuTimeExceeded,
    StopAtTinyStep,
    LocalInfeasibility,
    UserRequestedStop,
    DivergingIterates,
    RestorationFailure,
    ErrorInStepComputation,
    InvalidNumberDetected,
    InternalError,
}

impl SolverStatus {
    /// Whether the solver reported convergence.
    pub fn is_success(self) -> bool {
        matches!(self, SolverStatus::Success | SolverStatus::AcceptablePoint)
    }
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolverStatus::Success => "solve succeeded",
            SolverStatus::AcceptablePoint => "solved to acceptable level",
            SolverStatus::MaxIterations => "maximum iterations exceeded",
            SolverStatus::CpuTimeExceeded => "cpu time exceeded",
            SolverStatus::StopAtTinyStep => "search direction too small",
            SolverStatus::LocalInfeasibility => "converged to a locally infeasible point",
            SolverStatus::UserRequestedStop => "stopped by user request",
            SolverStatus::DivergingIterates => "iterates diverging",
            SolverStatus::RestorationFailure => "restoration phase failed",
            SolverStatus::ErrorInStepComputation => "error in step computation",
            SolverStatus::InvalidNumberDetected => "invalid number detected",
            SolverStatus::InternalError => "internal error",
        };
        f.write_str(s)
    }
}

/// Final iterate reshaped into trajectories, column per stage.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionRecord {
    pub status: SolverStatus,
    pub objective: f64,
    /// `4 × (N+1)`: x, y, phi, v.
    pub states: DMatrix<f64>,
    /// `2 × N`: steer, a.
    pub controls: DMatrix<f64>,
    /// `1 × (N+1)`: actual stage durations `ts · scaling`.
    pub times: DMatrix<f64>,
    /// `Σe × (N+1)`.
    pub dual_l: DMatrix<f64>,
    /// `4·obstacles × (N+1)`.
    pub dual_n: DMatrix<f64>,
    /// The iterate as passed to finalization, after projecting fixed variables.
    pub x: Vec<f64>,
    /// Constraint multipliers as passed to finalization.
    pub multipliers: Vec<f64>,
}

impl SolutionRecord {
    /// Reshape `x` according to the formulation's layout.
    ///
    /// Variables whose lower and upper bounds coincide are set to that bound.
    pub(crate) fn extract(
        formulation: &Formulation,
        status: SolverStatus,
        x: &[f64],
        multipliers: &[f64],
        objective: f64,
    ) -> Self {
        let lay = formulation.layout();
        let n = lay.horizon();
        let bounds = formulation.variable_bounds();

        let x: Vec<f64> = x
            .iter()
            .zip(bounds.lower.iter().zip(&bounds.upper))
            .map(|(&v, (&lo, &hi))| if lo == hi { lo } else { v })
            .collect();

        let states = DMatrix::from_fn(STATE_DIM, n + 1, |i, k| x[lay.state(k, i)]);
        let controls = DMatrix::from_fn(CONTROL_DIM, n, |i, k| x[lay.control(k, i)]);
        let ts = formulation.ts();
        let times = DMatrix::from_fn(1, n + 1, |_, k| ts * x[lay.time(k)]);

        let obstacles = formulation.obstacles();
        let stages = lay.dual_dims().stages;
        let mut dual_l = DMatrix::zeros(obstacles.total_edges(), stages);
        let mut dual_n = DMatrix::zeros(FOOTPRINT_FACES * obstacles.len(), stages);
        for k in 0..stages {
            let mut edge_row = 0;
            for (j, obstacle) in obstacles.iter().enumerate() {
                for e in 0..obstacle.num_edges() {
                    dual_l[(edge_row + e, k)] = x[lay.dual_l(k, j, e)];
                }
                edge_row += obstacle.num_edges();
                for f in 0..FOOTPRINT_FACES {
                    dual_n[(FOOTPRINT_FACES * j + f, k)] = x[lay.dual_n(k, j, f)];
                }
            }
        }

        Self {
            status,
            objective,
            states,
            controls,
            times,
            dual_l,
            dual_n,
            x,
            multipliers: multipliers.to_vec(),
        }
    }
}
