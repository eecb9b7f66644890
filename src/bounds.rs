//! Variable bounds, constraint bounds and the starting point.

use crate::formulation::Formulation;
use crate::layout::OBSTACLE_ROWS;
use crate::problem::{CONTROL_DIM, FOOTPRINT_FACES, STATE_DIM};

/// Magnitude solvers treat as infinite (anything at or beyond `1e19`).
pub const BOUND_INF: f64 = 2e19;

/// Lower and upper bound vectors of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    fn filled(len: usize, lower: f64, upper: f64) -> Self {
        Self {
            lower: vec![lower; len],
            upper: vec![upper; len],
        }
    }

    #[inline]
    fn set(&mut self, i: usize, lower: f64, upper: f64) {
        self.lower[i] = lower;
        self.upper[i] = upper;
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Whether `lower[i] ≤ x[i] ≤ upper[i]` for every index.
    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.len()
            && x
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .all(|(&v, (&lo, &hi))| lo <= v && v <= hi)
    }
}

impl Formulation {
    /// Per-variable bounds. Stage 0 and stage N are pinned to the start and
    /// end states.
    pub fn variable_bounds(&self) -> Bounds {
        let cfg = &self.config;
        let lay = &self.layout;
        let n = lay.horizon();
        let mut b = Bounds::filled(lay.num_variables(), -BOUND_INF, BOUND_INF);

        let xy = &self.xy_bounds;
        for k in 1..n {
            b.set(lay.state(k, 0), xy.x_min, xy.x_max);
            b.set(lay.state(k, 1), xy.y_min, xy.y_max);
            b.set(lay.state(k, 2), -BOUND_INF, BOUND_INF);
            b.set(lay.state(k, 3), -cfg.max_speed_reverse, cfg.max_speed_forward);
        }
        for i in 0..STATE_DIM {
            b.set(lay.state(0, i), self.start_state[i], self.start_state[i]);
            b.set(lay.state(n, i), self.end_state[i], self.end_state[i]);
        }

        for k in 0..n {
            b.set(lay.control(k, 0), -cfg.max_steer_angle, cfg.max_steer_angle);
            b.set(
                lay.control(k, 1),
                -cfg.max_acceleration_reverse,
                cfg.max_acceleration_forward,
            );
        }

        let (t_lo, t_hi) = cfg.time_scaling_bounds();
        for k in 0..lay.time_vars() {
            b.set(lay.time_start() + k, t_lo, t_hi);
        }

        let dual = lay.dual_dims();
        for k in 0..dual.stages {
            for (j, obstacle) in self.obstacles.iter().enumerate() {
                for e in 0..obstacle.num_edges() {
                    b.set(lay.dual_l(k, j, e), 0.0, cfg.max_lambda);
                }
                for f in 0..dual.faces {
                    b.set(lay.dual_n(k, j, f), 0.0, cfg.max_miu);
                }
            }
        }

        b
    }

    /// Per-row constraint bounds, in row order.
    pub fn constraint_bounds(&self) -> Bounds {
        let cfg = &self.config;
        let rows = &self.rows;
        let n = self.layout.horizon();
        // dynamics and stitching rows stay at [0, 0]
        let mut b = Bounds::filled(rows.num_constraints(), 0.0, 0.0);
        let distance = cfg.safety_distance_bounds();

        for k in 0..n {
            b.set(rows.steer_rate(k), -cfg.max_steer_rate, cfg.max_steer_rate);
        }

        for k in 0..=n {
            for j in 0..self.obstacles.len() {
                b.set(rows.obstacle(k, j, 0), -BOUND_INF, 1.0);
                b.set(rows.obstacle(k, j, 1), 0.0, 0.0);
                b.set(rows.obstacle(k, j, 2), 0.0, 0.0);
                b.set(rows.obstacle(k, j, OBSTACLE_ROWS - 1), distance.0, distance.1);
            }
        }

        b
    }

    /// Warm-start iterate with every time-scaling variable at 1.
    ///
    /// Lies within [`variable_bounds`](Self::variable_bounds) whenever the
    /// warm start respects the limits, since the scaling range contains 1.
    pub fn starting_point(&self) -> Vec<f64> {
        let lay = &self.layout;
        let n = lay.horizon();
        let mut x = vec![0.0; lay.num_variables()];

        for k in 0..=n {
            for i in 0..STATE_DIM {
                x[lay.state(k, i)] = self.warm_states[(i, k)];
            }
        }
        for k in 0..n {
            for i in 0..CONTROL_DIM {
                x[lay.control(k, i)] = self.warm_controls[(i, k)];
            }
        }
        for k in 0..lay.time_vars() {
            x[lay.time_start() + k] = 1.0;
        }

        let dual = lay.dual_dims();
        for k in 0..dual.stages {
            let mut edge_row = 0;
            for (j, obstacle) in self.obstacles.iter().enumerate() {
                for e in 0..obstacle.num_edges() {
                    x[lay.dual_l(k, j, e)] = self.warm_dual_l[(edge_row + e, k)];
                }
                edge_row += obstacle.num_edges();
                for f in 0..dual.faces {
                    x[lay.dual_n(k, j, f)] = self.warm_dual_n[(FOOTPRINT_FACES * j + f, k)];
                }
            }
        }

        x
    }
}
