use distance_approach::{
    DistanceApproachConfig, DistanceApproachProblem, ProblemData, TimeScaling, VehicleGeometry,
    XyBounds,
};
use nalgebra::{DMatrix, DVector, Vector2, Vector4};

// ─── Configuration ─────────────────────────────────────────────────────────

pub fn config(time_scaling: TimeScaling) -> DistanceApproachConfig {
    DistanceApproachConfig {
        weight_state_x: 1.0,
        weight_state_y: 1.0,
        weight_state_phi: 0.5,
        weight_state_v: 0.2,
        weight_input_steer: 2.0,
        weight_input_a: 1.0,
        weight_rate_steer: 3.0,
        weight_rate_a: 1.5,
        weight_stitching_steer: 1.0,
        weight_stitching_a: 0.5,
        weight_first_order_time: 4.0,
        weight_second_order_time: 2.0,
        weight_total_time: 1.0,
        max_steer_angle: 0.6,
        max_steer_rate: 0.8,
        max_speed_forward: 2.0,
        max_speed_reverse: 1.0,
        max_acceleration_forward: 2.0,
        max_acceleration_reverse: 2.0,
        min_time_sample_scaling: 0.5,
        max_time_sample_scaling: 1.5,
        max_lambda: 100.0,
        max_miu: 100.0,
        min_safety_distance: 0.05,
        max_safety_distance: None,
        use_fix_time: false,
        time_scaling,
        hard_stitching: false,
    }
}

// ─── Parking scene ─────────────────────────────────────────────────────────
// Reverse into a bay between two parked cars; a kerb line closes the back.
// Each box is four half-spaces, the kerb is one.

fn boxes() -> (Vec<[f64; 4]>, f64) {
    // [x_min, x_max, y_min, y_max] of the parked cars, kerb at y = -3
    (vec![[-6.0, -1.5, -3.0, 0.0], [1.5, 6.0, -3.0, 0.0]], -3.0)
}

pub fn obstacles() -> (DMatrix<f64>, DVector<f64>, Vec<usize>) {
    let (cars, kerb) = boxes();
    let mut a_rows = Vec::new();
    let mut b = Vec::new();
    let mut edge_counts = Vec::new();
    for [x_min, x_max, y_min, y_max] in cars {
        a_rows.extend_from_slice(&[1.0, 0.0, 0.0, 1.0, -1.0, 0.0, 0.0, -1.0]);
        b.extend_from_slice(&[x_max, y_max, -x_min, -y_min]);
        edge_counts.push(4);
    }
    a_rows.extend_from_slice(&[0.0, -1.0]);
    b.push(-kerb);
    edge_counts.push(1);

    let total = b.len();
    (
        DMatrix::from_row_slice(total, 2, &a_rows),
        DVector::from_vec(b),
        edge_counts,
    )
}

pub fn data(horizon: usize) -> ProblemData {
    let (a, b, edge_counts) = obstacles();
    let stages = horizon + 1;
    let total_edges: usize = edge_counts.iter().sum();
    let obstacle_count = edge_counts.len();

    let start = Vector4::new(-4.0, 3.0, 0.0, 0.0);
    let end = Vector4::new(0.0, -1.5, std::f64::consts::FRAC_PI_2, 0.0);
    let warm_states = DMatrix::from_fn(4, stages, |i, k| {
        let s = k as f64 / horizon as f64;
        start[i] + s * (end[i] - start[i])
    });

    ProblemData {
        horizon,
        ts: 0.5,
        vehicle: VehicleGeometry::from_edges(Vector4::new(3.89, 0.9, 1.04, 0.9), 2.8),
        warm_states,
        warm_controls: DMatrix::from_element(2, horizon, 0.05),
        warm_dual_l: DMatrix::from_element(total_edges, stages, 0.1),
        warm_dual_n: DMatrix::from_element(4 * obstacle_count, stages, 0.1),
        start_state: start,
        end_state: end,
        last_control: Vector2::zeros(),
        xy_bounds: XyBounds::new(-10.0, 10.0, -5.0, 10.0),
        obstacles_a: a,
        obstacles_b: b,
        edge_counts,
        obstacle_count,
    }
}

pub fn problem(horizon: usize, time_scaling: TimeScaling) -> DistanceApproachProblem {
    DistanceApproachProblem::new(data(horizon), config(time_scaling))
        .expect("bench scene is valid")
}
