mod common;

use std::collections::HashSet;

use approx::assert_relative_eq;
use distance_approach::{
    ConfigError, DistanceApproachConfig, DistanceApproachProblem, Formulation, IndexStyle,
    NlpProblem, TimeScaling, UsageError, BOUND_INF,
};
use nalgebra::{DMatrix, DVector};

// ── Construction ──

#[test]
fn config_round_trips_through_json() {
    let config = common::config();
    let json = serde_json::to_string(&config).unwrap();
    let back: DistanceApproachConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(config, back);
    assert_eq!(config.time_scaling, TimeScaling::PerStage);
}

#[test]
fn scenario_c_obstacle_count_mismatch_fails_construction() {
    let mut data = common::data(4);
    data.obstacle_count = 3;
    let err = DistanceApproachProblem::new(data, common::config()).unwrap_err();
    assert_eq!(
        err,
        ConfigError::ObstacleCountMismatch {
            count: 3,
            edge_counts: 2
        }
    );
}

#[test]
fn zero_horizon_fails_construction() {
    let mut data = common::data(2);
    data.horizon = 0;
    assert_eq!(
        DistanceApproachProblem::new(data, common::config()).unwrap_err(),
        ConfigError::ZeroHorizon
    );
}

#[test]
fn warm_start_shape_must_match_horizon() {
    let mut data = common::data(4);
    data.warm_controls = DMatrix::zeros(2, 5);
    assert!(matches!(
        DistanceApproachProblem::new(data, common::config()),
        Err(ConfigError::Shape {
            what: "warm_controls",
            ..
        })
    ));
}

#[test]
fn stacked_obstacle_rows_must_match_edge_counts() {
    let mut data = common::data(4);
    data.obstacles_b = DVector::zeros(6);
    assert!(matches!(
        DistanceApproachProblem::new(data, common::config()),
        Err(ConfigError::Shape {
            what: "obstacle b",
            ..
        })
    ));
}

#[test]
fn non_positive_time_scaling_fails_construction() {
    let mut config = common::config();
    config.min_time_sample_scaling = 0.0;
    assert!(matches!(
        DistanceApproachProblem::new(common::data(3), config),
        Err(ConfigError::InvalidTimeScaling { .. })
    ));

    let mut config = common::config();
    config.max_time_sample_scaling = 0.9;
    assert!(matches!(
        DistanceApproachProblem::new(common::data(3), config),
        Err(ConfigError::InvalidTimeScaling { .. })
    ));
}

#[test]
fn negative_weight_fails_construction() {
    let mut config = common::config();
    config.weight_rate_a = -1.0;
    assert!(matches!(
        DistanceApproachProblem::new(common::data(3), config),
        Err(ConfigError::InvalidWeight {
            name: "weight_rate_a",
            ..
        })
    ));
}

#[test]
fn safety_distance_cap_bounds_distance_rows() {
    let mut config = common::config();
    config.max_safety_distance = Some(2.0);
    let formulation = Formulation::new(common::data(3), config).unwrap();
    let b = formulation.constraint_bounds();
    let rows = formulation.constraint_layout();
    for k in 0..=3 {
        for j in 0..2 {
            let row = rows.obstacle(k, j, 3);
            assert_eq!((b.lower[row], b.upper[row]), (0.05, 2.0));
        }
    }

    for max in [0.01, f64::INFINITY, f64::NAN] {
        let mut config = common::config();
        config.max_safety_distance = Some(max);
        assert!(matches!(
            DistanceApproachProblem::new(common::data(3), config),
            Err(ConfigError::InvalidSafetyDistance { .. })
        ));
    }
}

// ── Structure ──

#[test]
fn describe_structure_reports_sizes() {
    let mut problem = common::problem(4);
    let info = problem.describe_structure().unwrap();

    // 4·5 + 2·4 + 5 + 5·7 + 5·4·2
    assert_eq!(info.n, 20 + 8 + 5 + 35 + 40);
    // 16 dynamics + 4 steering + 4·2·5 obstacle rows
    assert_eq!(info.m, 16 + 4 + 40);
    assert_eq!(info.index_style, IndexStyle::Zero);
    assert_eq!(info.nnz_jac, problem.jacobian_structure().unwrap().len());
    assert_eq!(info.nnz_hess, problem.hessian_structure().unwrap().len());
}

#[test]
fn structure_is_stable_across_queries_and_points() {
    let mut problem = common::problem(3);
    let info = problem.describe_structure().unwrap();
    let jac = problem.jacobian_structure().unwrap().to_vec();
    let hess = problem.hessian_structure().unwrap().to_vec();

    let x = problem.starting_point().unwrap();
    let mut values = vec![0.0; info.nnz_jac];
    problem.jacobian_values(&x, true, &mut values).unwrap();

    assert_eq!(problem.describe_structure().unwrap(), info);
    assert_eq!(problem.jacobian_structure().unwrap(), jac.as_slice());
    assert_eq!(problem.hessian_structure().unwrap(), hess.as_slice());

    // a second instance recorded from a different warm start
    let mut data = common::data(3);
    data.warm_controls.fill(-0.2);
    data.warm_dual_l.fill(0.0);
    let mut other = DistanceApproachProblem::new(data, common::config()).unwrap();
    other.describe_structure().unwrap();
    assert_eq!(other.jacobian_structure().unwrap(), jac.as_slice());
    assert_eq!(other.hessian_structure().unwrap(), hess.as_slice());
}

#[test]
fn hessian_structure_is_lower_triangle_without_duplicates() {
    let mut problem = common::problem(4);
    let info = problem.describe_structure().unwrap();
    let hess = problem.hessian_structure().unwrap();

    assert!(hess.iter().all(|&(r, c)| r >= c && r < info.n));
    let unique: HashSet<_> = hess.iter().collect();
    assert_eq!(unique.len(), hess.len());

    let jac = problem.jacobian_structure().unwrap();
    assert!(jac.iter().all(|&(r, c)| r < info.m && c < info.n));
    let unique: HashSet<_> = jac.iter().collect();
    assert_eq!(unique.len(), jac.len());
}

#[test]
fn value_buffers_have_problem_sizes() {
    let mut problem = common::problem(3);
    let info = problem.describe_structure().unwrap();
    let x = problem.starting_point().unwrap();
    assert_eq!(x.len(), info.n);

    let mut grad = vec![0.0; info.n];
    let mut g = vec![0.0; info.m];
    problem.gradient(&x, true, &mut grad).unwrap();
    problem.constraints(&x, false, &mut g).unwrap();

    let mut short = vec![0.0; info.m - 1];
    assert!(problem.constraints(&x, false, &mut short).is_err());
}

// ── Bounds and starting point ──

#[test]
fn starting_point_lies_within_bounds() {
    for time_scaling in [TimeScaling::PerStage, TimeScaling::Shared] {
        let mut config = common::config();
        config.time_scaling = time_scaling;
        let mut problem = common::problem_with(4, config);
        problem.describe_structure().unwrap();

        let (vars, _) = problem.bounds().unwrap();
        let x = problem.starting_point().unwrap();
        assert!(vars.contains(&x));
    }
}

#[test]
fn boundary_states_are_pinned() {
    let data = common::data(4);
    let start = data.start_state;
    let end = data.end_state;
    let formulation = Formulation::new(data, common::config()).unwrap();
    let bounds = formulation.variable_bounds();
    let lay = formulation.layout();

    for i in 0..4 {
        assert_eq!(bounds.lower[lay.state(0, i)], start[i]);
        assert_eq!(bounds.upper[lay.state(0, i)], start[i]);
        assert_eq!(bounds.lower[lay.state(4, i)], end[i]);
        assert_eq!(bounds.upper[lay.state(4, i)], end[i]);
    }
    assert_eq!(bounds.lower[lay.state(2, 2)], -BOUND_INF);
    assert_eq!(bounds.upper[lay.state(2, 3)], 2.0);
    assert_eq!(bounds.lower[lay.state(2, 3)], -1.0);
}

#[test]
fn scenario_b_fixed_time_collapses_time_bounds() {
    let mut config = common::config();
    config.use_fix_time = true;
    let mut problem = common::problem_with(4, config);
    problem.describe_structure().unwrap();

    let (vars, _) = problem.bounds().unwrap();
    let x = problem.starting_point().unwrap();
    let lay = problem.formulation().layout();
    for k in 0..lay.time_vars() {
        let t = lay.time_start() + k;
        assert_eq!((vars.lower[t], vars.upper[t]), (1.0, 1.0));
        assert_eq!(x[t], 1.0);
    }
}

#[test]
fn constraint_bounds_follow_row_kinds() {
    let mut config = common::config();
    config.hard_stitching = true;
    let formulation = Formulation::new(common::data(3), config).unwrap();
    let b = formulation.constraint_bounds();
    let rows = formulation.constraint_layout();

    assert_eq!((b.lower[rows.dynamics(1, 2)], b.upper[rows.dynamics(1, 2)]), (0.0, 0.0));
    assert_eq!((b.lower[rows.steer_rate(0)], b.upper[rows.steer_rate(0)]), (-0.8, 0.8));
    assert_eq!(b.upper[rows.obstacle(2, 1, 0)], 1.0);
    assert_eq!(b.lower[rows.obstacle(2, 1, 0)], -BOUND_INF);
    assert_eq!((b.lower[rows.obstacle(2, 1, 1)], b.upper[rows.obstacle(2, 1, 1)]), (0.0, 0.0));
    assert_eq!(b.lower[rows.obstacle(2, 1, 3)], 0.05);
    assert_eq!(b.upper[rows.obstacle(2, 1, 3)], BOUND_INF);
    assert_eq!((b.lower[rows.stitching(1)], b.upper[rows.stitching(1)]), (0.0, 0.0));
}

// ── Formulas ──

#[test]
fn warm_start_satisfies_dynamics_when_consistent() {
    // zero controls and zero speed: the vehicle stays put
    let mut data = common::data(2);
    data.warm_states.fill(0.0);
    data.warm_controls.fill(0.0);
    data.end_state.fill(0.0);
    let formulation = Formulation::new(data, common::config()).unwrap();
    let x = formulation.starting_point();
    let mut g = vec![0.0; formulation.num_constraints()];
    formulation.constraints(&x, &mut g);

    for k in 0..2 {
        for i in 0..4 {
            assert_relative_eq!(g[formulation.constraint_layout().dynamics(k, i)], 0.0);
        }
    }
}

#[test]
fn stitching_rows_measure_the_control_jump() {
    let mut config = common::config();
    config.hard_stitching = true;
    let data = common::data(3);
    let last = data.last_control;
    let formulation = Formulation::new(data, config).unwrap();
    let x = formulation.starting_point();
    let mut g = vec![0.0; formulation.num_constraints()];
    formulation.constraints(&x, &mut g);

    let rows = formulation.constraint_layout();
    assert_relative_eq!(g[rows.stitching(0)], 0.05 - last[0]);
    assert_relative_eq!(g[rows.stitching(1)], 0.1 - last[1]);
    // steering rate of stage 0 is relative to the last executed steer
    assert_relative_eq!(g[rows.steer_rate(0)], (0.05 - last[0]) / 0.5, max_relative = 1e-12);
}

#[test]
fn dynamics_rows_follow_midpoint_bicycle() {
    let formulation = Formulation::new(common::data(3), common::config()).unwrap();
    let lay = formulation.layout();
    let mut x = formulation.starting_point();
    for (i, v) in [1.0, -0.5, 0.3, 1.2].into_iter().enumerate() {
        x[lay.state(1, i)] = v;
    }
    for (i, v) in [2.0, 0.0, 0.5, 1.5].into_iter().enumerate() {
        x[lay.state(2, i)] = v;
    }
    x[lay.control(1, 0)] = 0.2;
    x[lay.control(1, 1)] = 0.4;
    x[lay.time(1)] = 1.2;
    let mut g = vec![0.0; formulation.num_constraints()];
    formulation.constraints(&x, &mut g);

    // dt = 0.6, v_mid = 1.32, heading = 0.3 + 0.6·1.2·tan(0.2)/5.6,
    // propagated state (1.750270197863, −0.246309972214, 0.357337981472, 1.44)
    let rows = formulation.constraint_layout();
    let expected = [
        2.0 - 1.7502701978632076,
        0.0 + 0.24630997221352385,
        0.5 - 0.35733798147245305,
        1.5 - 1.44,
    ];
    for (i, e) in expected.into_iter().enumerate() {
        assert_relative_eq!(g[rows.dynamics(1, i)], e, epsilon = 1e-12);
    }
}

#[test]
fn distance_row_measures_gap_to_box_edge() {
    // vehicle at the origin facing +x; only the `x ≥ 4` face of the box is active
    let mut data = common::data(3);
    data.warm_states.column_mut(1).fill(0.0);
    data.warm_dual_l.column_mut(1).fill(0.0);
    data.warm_dual_n.column_mut(1).fill(0.0);
    data.warm_dual_l[(2, 1)] = 1.0;
    data.warm_dual_n[(0, 1)] = 1.0;
    let formulation = Formulation::new(data, common::config()).unwrap();
    let x = formulation.starting_point();
    let mut g = vec![0.0; formulation.num_constraints()];
    formulation.constraints(&x, &mut g);

    let rows = formulation.constraint_layout();
    assert_relative_eq!(g[rows.obstacle(1, 0, 0)], 1.0);
    assert_relative_eq!(g[rows.obstacle(1, 0, 1)], 0.0);
    assert_relative_eq!(g[rows.obstacle(1, 0, 2)], 0.0);
    // the front bumper sits 3.89 ahead of the rear axle
    assert_relative_eq!(g[rows.obstacle(1, 0, 3)], 4.0 - 3.89, epsilon = 1e-12);
}

#[test]
fn scenario_d_solution_before_finalize_is_a_usage_error() {
    let mut problem = common::problem(3);
    assert_eq!(problem.solution().unwrap_err(), UsageError::NotFinalized);
    problem.describe_structure().unwrap();
    assert_eq!(problem.solution().unwrap_err(), UsageError::NotFinalized);
}
