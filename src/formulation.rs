//! Objective and constraint formulas of the distance-approach NLP.
//!
//! The formulas are generic over [`Scalar`] and run unchanged with `f64`
//! (values) and [`BReverse`](crate::BReverse) (tape recording). Everything
//! the formulas need is owned by [`Formulation`], so it can be evaluated
//! and tested without a solver.

use nalgebra::{DMatrix, Vector2, Vector4};

use crate::config::{DistanceApproachConfig, TimeScaling};
use crate::error::ConfigError;
use crate::geometry::{ObstacleSet, VehicleGeometry};
use crate::layout::{ConstraintLayout, DualDims, IndexLayout};
use crate::problem::{ProblemData, XyBounds, CONTROL_DIM, FOOTPRINT_FACES, STATE_DIM};
use crate::scalar::Scalar;

/// A validated problem instance: data, configuration and layouts.
#[derive(Debug, Clone)]
pub struct Formulation {
    pub(crate) config: DistanceApproachConfig,
    pub(crate) vehicle: VehicleGeometry,
    pub(crate) obstacles: ObstacleSet,
    pub(crate) layout: IndexLayout,
    pub(crate) rows: ConstraintLayout,
    pub(crate) ts: f64,
    pub(crate) warm_states: DMatrix<f64>,
    pub(crate) warm_controls: DMatrix<f64>,
    pub(crate) warm_dual_l: DMatrix<f64>,
    pub(crate) warm_dual_n: DMatrix<f64>,
    pub(crate) start_state: Vector4<f64>,
    pub(crate) end_state: Vector4<f64>,
    pub(crate) last_control: Vector2<f64>,
    pub(crate) xy_bounds: XyBounds,
}

impl Formulation {
    /// Validate `data` and `config` and compute both layouts.
    pub fn new(data: ProblemData, config: DistanceApproachConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let obstacles = data.validate()?;

        let horizon = data.horizon;
        let time_vars = match config.time_scaling {
            TimeScaling::PerStage => horizon + 1,
            TimeScaling::Shared => 1,
        };
        let layout = IndexLayout::new(
            horizon,
            STATE_DIM,
            CONTROL_DIM,
            time_vars,
            &obstacles.edge_counts(),
            obstacles.len(),
            DualDims {
                stages: horizon + 1,
                faces: FOOTPRINT_FACES,
            },
        );
        let rows = ConstraintLayout::new(horizon, STATE_DIM, obstacles.len(), config.hard_stitching);

        Ok(Self {
            config,
            vehicle: data.vehicle,
            obstacles,
            layout,
            rows,
            ts: data.ts,
            warm_states: data.warm_states,
            warm_controls: data.warm_controls,
            warm_dual_l: data.warm_dual_l,
            warm_dual_n: data.warm_dual_n,
            start_state: data.start_state,
            end_state: data.end_state,
            last_control: data.last_control,
            xy_bounds: data.xy_bounds,
        })
    }

    pub fn layout(&self) -> &IndexLayout {
        &self.layout
    }

    pub fn constraint_layout(&self) -> &ConstraintLayout {
        &self.rows
    }

    pub fn config(&self) -> &DistanceApproachConfig {
        &self.config
    }

    pub fn obstacles(&self) -> &ObstacleSet {
        &self.obstacles
    }

    /// Nominal stage duration.
    pub fn ts(&self) -> f64 {
        self.ts
    }

    /// Number of decision variables.
    pub fn num_variables(&self) -> usize {
        self.layout.num_variables()
    }

    /// Number of constraint rows.
    pub fn num_constraints(&self) -> usize {
        self.rows.num_constraints()
    }

    /// Objective followed by every constraint row: `[f, g_0, …, g_{m-1}]`.
    pub fn outputs<T: Scalar>(&self, x: &[T]) -> Vec<T> {
        let mut out = Vec::with_capacity(1 + self.num_constraints());
        out.push(self.objective(x));
        out.resize(1 + self.num_constraints(), T::zero());
        self.constraints(x, &mut out[1..]);
        out
    }

    /// Weighted penalty objective.
    pub fn objective<T: Scalar>(&self, x: &[T]) -> T {
        debug_assert_eq!(x.len(), self.num_variables());
        let cfg = &self.config;
        let lay = &self.layout;
        let n = lay.horizon();
        let c = T::from_f;
        let ts = c(self.ts);

        let mut obj = T::zero();

        // state tracking against the warm start
        let state_weights = [
            cfg.weight_state_x,
            cfg.weight_state_y,
            cfg.weight_state_phi,
            cfg.weight_state_v,
        ];
        for k in 0..=n {
            for (i, &w) in state_weights.iter().enumerate() {
                let err = x[lay.state(k, i)] - c(self.warm_states[(i, k)]);
                obj += c(w) * err.powi(2);
            }
        }

        // control magnitude
        for k in 0..n {
            obj += c(cfg.weight_input_steer) * x[lay.control(k, 0)].powi(2);
            obj += c(cfg.weight_input_a) * x[lay.control(k, 1)].powi(2);
        }

        // stitching against the last executed control
        let dt0 = ts * x[lay.time(0)];
        let steer_jump = (x[lay.control(0, 0)] - c(self.last_control[0])) / dt0;
        let a_jump = (x[lay.control(0, 1)] - c(self.last_control[1])) / dt0;
        obj += c(cfg.weight_stitching_steer) * steer_jump.powi(2);
        obj += c(cfg.weight_stitching_a) * a_jump.powi(2);

        // control rate
        for k in 1..n {
            let dt = ts * x[lay.time(k)];
            let steer_rate = (x[lay.control(k, 0)] - x[lay.control(k - 1, 0)]) / dt;
            let a_rate = (x[lay.control(k, 1)] - x[lay.control(k - 1, 1)]) / dt;
            obj += c(cfg.weight_rate_steer) * steer_rate.powi(2);
            obj += c(cfg.weight_rate_a) * a_rate.powi(2);
        }

        // time regularization
        let tv = lay.time_vars();
        if tv > 1 {
            for k in 0..tv - 1 {
                let d1 = x[lay.time(k + 1)] - x[lay.time(k)];
                obj += c(cfg.weight_first_order_time) * d1.powi(2);
            }
            for k in 0..tv.saturating_sub(2) {
                let d2 = x[lay.time(k + 2)] - c(2.0) * x[lay.time(k + 1)] + x[lay.time(k)];
                obj += c(cfg.weight_second_order_time) * d2.powi(2);
            }
        }
        for k in 0..=n {
            obj += c(cfg.weight_total_time) * x[lay.time(k)];
        }

        obj
    }

    /// Constraint rows, written into `g` (length `num_constraints`).
    pub fn constraints<T: Scalar>(&self, x: &[T], g: &mut [T]) {
        debug_assert_eq!(x.len(), self.num_variables());
        debug_assert_eq!(g.len(), self.num_constraints());
        self.dynamics_rows(x, g);
        self.steer_rate_rows(x, g);
        self.obstacle_rows(x, g);
        if self.rows.has_stitching() {
            for i in 0..CONTROL_DIM {
                g[self.rows.stitching(i)] =
                    x[self.layout.control(0, i)] - T::from_f(self.last_control[i]);
            }
        }
    }

    /// Midpoint-corrected kinematic bicycle, written as `next − predicted = 0`.
    fn dynamics_rows<T: Scalar>(&self, x: &[T], g: &mut [T]) {
        let lay = &self.layout;
        let c = T::from_f;
        let half = c(0.5);
        let wheelbase = c(self.vehicle.wheelbase);

        for k in 0..lay.horizon() {
            let px = x[lay.state(k, 0)];
            let py = x[lay.state(k, 1)];
            let phi = x[lay.state(k, 2)];
            let v = x[lay.state(k, 3)];
            let steer = x[lay.control(k, 0)];
            let a = x[lay.control(k, 1)];
            let dt = c(self.ts) * x[lay.time(k)];

            let tan_steer = steer.tan();
            let v_mid = v + dt * a * half;
            let heading = phi + dt * v * tan_steer * half / wheelbase;

            let predicted = [
                px + dt * v_mid * heading.cos(),
                py + dt * v_mid * heading.sin(),
                phi + dt * v_mid * tan_steer / wheelbase,
                v + dt * a,
            ];
            for (i, p) in predicted.into_iter().enumerate() {
                g[self.rows.dynamics(k, i)] = x[lay.state(k + 1, i)] - p;
            }
        }
    }

    /// Steering change per unit time; stage 0 is relative to the last executed steer.
    fn steer_rate_rows<T: Scalar>(&self, x: &[T], g: &mut [T]) {
        let lay = &self.layout;
        let ts = T::from_f(self.ts);
        for k in 0..lay.horizon() {
            let prev = if k == 0 {
                T::from_f(self.last_control[0])
            } else {
                x[lay.control(k - 1, 0)]
            };
            g[self.rows.steer_rate(k)] = (x[lay.control(k, 0)] - prev) / (ts * x[lay.time(k)]);
        }
    }

    /// Separating-hyperplane rows for every (stage, obstacle).
    ///
    /// With `τ = Aᵀl` and the footprint `G p ≤ g` in the body frame:
    /// `‖τ‖² ≤ 1`, `Gᵀn + R(phi)ᵀτ = 0` and
    /// `−gᵀn + (A t − b)ᵀl ≥ d_min`, where `t` is the footprint centre.
    fn obstacle_rows<T: Scalar>(&self, x: &[T], g: &mut [T]) {
        let lay = &self.layout;
        let c = T::from_f;
        let offset = c(self.vehicle.center_offset());
        let half_extents = self.vehicle.half_extents();

        for k in 0..=lay.horizon() {
            let px = x[lay.state(k, 0)];
            let py = x[lay.state(k, 1)];
            let phi = x[lay.state(k, 2)];
            let (sin_phi, cos_phi) = (phi.sin(), phi.cos());
            let cx = px + cos_phi * offset;
            let cy = py + sin_phi * offset;

            for (j, obstacle) in self.obstacles.iter().enumerate() {
                let mut tau_x = T::zero();
                let mut tau_y = T::zero();
                let mut b_dot_l = T::zero();
                for e in 0..obstacle.num_edges() {
                    let l = x[lay.dual_l(k, j, e)];
                    tau_x += c(obstacle.a[(e, 0)]) * l;
                    tau_y += c(obstacle.a[(e, 1)]) * l;
                    b_dot_l += c(obstacle.b[e]) * l;
                }

                let nv = |f: usize| x[lay.dual_n(k, j, f)];
                let mut g_dot_n = T::zero();
                for (f, &h) in half_extents.iter().enumerate() {
                    g_dot_n += c(h) * nv(f);
                }

                g[self.rows.obstacle(k, j, 0)] = tau_x.powi(2) + tau_y.powi(2);
                g[self.rows.obstacle(k, j, 1)] =
                    nv(0) - nv(2) + cos_phi * tau_x + sin_phi * tau_y;
                g[self.rows.obstacle(k, j, 2)] =
                    nv(1) - nv(3) - sin_phi * tau_x + cos_phi * tau_y;
                g[self.rows.obstacle(k, j, 3)] = -g_dot_n + cx * tau_x + cy * tau_y - b_dot_l;
            }
        }
    }
}
