//! Problem data supplied by the caller.

use nalgebra::{DMatrix, DVector, Vector2, Vector4};

use crate::error::ConfigError;
use crate::geometry::{ObstacleSet, VehicleGeometry};

/// Number of state components `(x, y, phi, v)`.
pub const STATE_DIM: usize = 4;
/// Number of control components `(steer, a)`.
pub const CONTROL_DIM: usize = 2;
/// Faces of the rectangular vehicle footprint.
pub const FOOTPRINT_FACES: usize = 4;

/// Axis-aligned map extent the interior states must stay within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XyBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl XyBounds {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }
}

/// Everything a problem instance is built from besides the configuration.
///
/// Matrices are column-per-stage: `warm_states` is `4 × (N+1)`,
/// `warm_controls` is `2 × N`, `warm_dual_l` is `Σe × (N+1)` and
/// `warm_dual_n` is `4·obstacles × (N+1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemData {
    /// Number of stage transitions N.
    pub horizon: usize,
    /// Nominal stage duration [s].
    pub ts: f64,
    pub vehicle: VehicleGeometry,
    pub warm_states: DMatrix<f64>,
    pub warm_controls: DMatrix<f64>,
    pub warm_dual_l: DMatrix<f64>,
    pub warm_dual_n: DMatrix<f64>,
    pub start_state: Vector4<f64>,
    pub end_state: Vector4<f64>,
    /// Last executed `(steer, a)`.
    pub last_control: Vector2<f64>,
    pub xy_bounds: XyBounds,
    /// Stacked obstacle normals, `Σe × 2`.
    pub obstacles_a: DMatrix<f64>,
    /// Stacked obstacle offsets, `Σe`.
    pub obstacles_b: DVector<f64>,
    pub edge_counts: Vec<usize>,
    pub obstacle_count: usize,
}

impl ProblemData {
    /// Check every shape against the horizon and obstacle layout, and split
    /// the stacked obstacle rows.
    pub fn validate(&self) -> Result<ObstacleSet, ConfigError> {
        if self.horizon == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        if !self.ts.is_finite() || self.ts <= 0.0 {
            return Err(ConfigError::InvalidStageDuration(self.ts));
        }
        self.vehicle.validate()?;

        let obstacles = ObstacleSet::from_stacked(
            &self.obstacles_a,
            &self.obstacles_b,
            &self.edge_counts,
            self.obstacle_count,
        )?;

        let stages = self.horizon + 1;
        check_shape("warm_states", &self.warm_states, STATE_DIM, stages)?;
        check_shape("warm_controls", &self.warm_controls, CONTROL_DIM, self.horizon)?;
        check_shape("warm_dual_l", &self.warm_dual_l, obstacles.total_edges(), stages)?;
        check_shape(
            "warm_dual_n",
            &self.warm_dual_n,
            FOOTPRINT_FACES * obstacles.len(),
            stages,
        )?;

        let mut boundary = self.start_state.iter().chain(self.end_state.iter());
        if boundary.any(|v| !v.is_finite()) {
            return Err(ConfigError::NonFinite {
                what: "start/end state",
            });
        }
        if self.last_control.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::NonFinite {
                what: "last control",
            });
        }

        let b = &self.xy_bounds;
        if !(b.x_min <= b.x_max && b.y_min <= b.y_max) {
            return Err(ConfigError::InvalidXyBounds);
        }

        Ok(obstacles)
    }
}

fn check_shape(
    what: &'static str,
    m: &DMatrix<f64>,
    rows: usize,
    cols: usize,
) -> Result<(), ConfigError> {
    if m.nrows() != rows || m.ncols() != cols {
        return Err(ConfigError::Shape {
            what,
            rows,
            cols,
            got_rows: m.nrows(),
            got_cols: m.ncols(),
        });
    }
    if m.iter().any(|v| !v.is_finite()) {
        return Err(ConfigError::NonFinite { what });
    }
    Ok(())
}
