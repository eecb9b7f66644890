#![allow(dead_code)]

use distance_approach::{
    DistanceApproachConfig, DistanceApproachProblem, ProblemData, VehicleGeometry, XyBounds,
};
use nalgebra::{DMatrix, DVector, Vector2, Vector4};

pub const CONFIG_JSON: &str = r#"{
    "weight_state_x": 1.0,
    "weight_state_y": 1.0,
    "weight_state_phi": 0.5,
    "weight_state_v": 0.2,
    "weight_input_steer": 2.0,
    "weight_input_a": 1.0,
    "weight_rate_steer": 3.0,
    "weight_rate_a": 1.5,
    "weight_stitching_steer": 1.0,
    "weight_stitching_a": 0.5,
    "weight_first_order_time": 4.0,
    "weight_second_order_time": 2.0,
    "weight_total_time": 1.0,
    "max_steer_angle": 0.6,
    "max_steer_rate": 0.8,
    "max_speed_forward": 2.0,
    "max_speed_reverse": 1.0,
    "max_acceleration_forward": 2.0,
    "max_acceleration_reverse": 2.0,
    "min_time_sample_scaling": 0.5,
    "max_time_sample_scaling": 1.5,
    "max_lambda": 100.0,
    "max_miu": 100.0,
    "min_safety_distance": 0.05,
    "use_fix_time": false,
    "time_scaling": "per_stage",
    "hard_stitching": false
}"#;

pub fn config() -> DistanceApproachConfig {
    serde_json::from_str(CONFIG_JSON).unwrap()
}

/// Box obstacle `[4, 6] × [2, 4]` and a triangle above the start.
pub fn obstacles() -> (DMatrix<f64>, DVector<f64>, Vec<usize>) {
    #[rustfmt::skip]
    let a = DMatrix::from_row_slice(7, 2, &[
        1.0, 0.0,
        0.0, 1.0,
        -1.0, 0.0,
        0.0, -1.0,
        0.0, -1.0,
        1.0, 0.5,
        -1.0, 0.5,
    ]);
    let b = DVector::from_column_slice(&[6.0, 4.0, -4.0, -2.0, -5.0, 4.5, 2.5]);
    (a, b, vec![4, 3])
}

pub fn vehicle() -> VehicleGeometry {
    VehicleGeometry::from_edges(Vector4::new(3.89, 0.9, 1.04, 0.9), 2.8)
}

/// Straight drive from the origin to `(6, 0)` over `horizon` stages.
pub fn data(horizon: usize) -> ProblemData {
    let (a, b, edge_counts) = obstacles();
    let stages = horizon + 1;
    let total_edges: usize = edge_counts.iter().sum();
    let obstacle_count = edge_counts.len();

    let start = Vector4::new(0.0, 0.0, 0.0, 0.0);
    let end = Vector4::new(6.0, 0.0, 0.0, 0.0);
    let warm_states = DMatrix::from_fn(4, stages, |i, k| {
        let s = k as f64 / horizon as f64;
        match i {
            0 => 6.0 * s,
            3 if k > 0 && k < horizon => 1.0,
            _ => 0.0,
        }
    });
    let warm_controls = DMatrix::from_fn(2, horizon, |i, _| if i == 0 { 0.05 } else { 0.1 });

    ProblemData {
        horizon,
        ts: 0.5,
        vehicle: vehicle(),
        warm_states,
        warm_controls,
        warm_dual_l: DMatrix::from_element(total_edges, stages, 0.1),
        warm_dual_n: DMatrix::from_element(4 * obstacle_count, stages, 0.2),
        start_state: start,
        end_state: end,
        last_control: Vector2::new(0.02, -0.1),
        xy_bounds: XyBounds::new(-10.0, 10.0, -10.0, 10.0),
        obstacles_a: a,
        obstacles_b: b,
        edge_counts,
        obstacle_count,
    }
}

pub fn problem(horizon: usize) -> DistanceApproachProblem {
    DistanceApproachProblem::new(data(horizon), config()).unwrap()
}

pub fn problem_with(horizon: usize, config: DistanceApproachConfig) -> DistanceApproachProblem {
    DistanceApproachProblem::new(data(horizon), config).unwrap()
}

/// A generic point near the warm start: every entry nudged by a distinct
/// amount, time scalings kept away from zero.
pub fn perturbed(x: &[f64], time_range: std::ops::Range<usize>) -> Vec<f64> {
    x.iter()
        .enumerate()
        .map(|(i, &v)| {
            let nudge = 0.05 * ((i as f64) * 1.7).sin();
            if time_range.contains(&i) {
                1.0 + nudge
            } else {
                v + nudge
            }
        })
        .collect()
}

/// Central finite difference of `f` along coordinate `j`.
pub fn central_diff(f: impl Fn(&[f64]) -> Vec<f64>, x: &[f64], j: usize, h: f64) -> Vec<f64> {
    let mut xp = x.to_vec();
    let mut xm = x.to_vec();
    xp[j] += h;
    xm[j] -= h;
    f(&xp)
        .iter()
        .zip(f(&xm))
        .map(|(p, m)| (p - m) / (2.0 * h))
        .collect()
}
