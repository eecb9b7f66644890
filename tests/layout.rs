mod common;

use std::collections::HashSet;

use distance_approach::{
    ConstraintLayout, DualDims, Formulation, IndexLayout, TimeScaling,
};
use nalgebra::{DMatrix, DVector};
use proptest::prelude::*;

#[test]
fn scenario_a_sizes() {
    // horizon 2, one obstacle with four edges, one shared time variable
    let layout = IndexLayout::new(2, 4, 2, 1, &[4], 1, DualDims { stages: 1, faces: 1 });
    assert_eq!(layout.num_variables(), 4 * 3 + 2 * 2 + 1 + 4 + 1);
    assert_eq!(layout.num_variables(), 22);

    let rows = ConstraintLayout::new(2, 4, 1, false);
    // 8 dynamics rows come first
    assert_eq!(rows.steer_rate_start(), 8);
    assert_eq!(rows.obstacle_start(), 8 + 2);
    assert_eq!(rows.num_constraints(), 8 + 2 + 4 * 3);
}

#[test]
fn segments_follow_declared_order() {
    let layout = IndexLayout::new(3, 4, 2, 4, &[4, 3], 2, DualDims { stages: 4, faces: 4 });
    assert_eq!(layout.state(0, 0), 0);
    assert_eq!(layout.state(3, 3), 15);
    assert_eq!(layout.control(0, 0), 16);
    assert_eq!(layout.time(0), 22);
    assert_eq!(layout.time(3), 25);
    assert_eq!(layout.dual_l(0, 0, 0), 26);
    assert_eq!(layout.dual_l(0, 1, 0), 30);
    assert_eq!(layout.dual_l(1, 0, 0), 33);
    assert_eq!(layout.dual_n(0, 0, 0), 26 + 4 * 7);
    assert_eq!(layout.dual_n(3, 1, 3) + 1, layout.num_variables());
}

#[test]
fn shared_time_variable_serves_every_stage() {
    let layout = IndexLayout::new(5, 4, 2, 1, &[4], 1, DualDims { stages: 6, faces: 4 });
    let t = layout.time(0);
    assert!((0..=5).all(|k| layout.time(k) == t));
}

#[test]
fn stitching_rows_extend_the_constraint_vector() {
    let without = ConstraintLayout::new(4, 4, 2, false);
    let with = ConstraintLayout::new(4, 4, 2, true);
    assert!(!without.has_stitching());
    assert!(with.has_stitching());
    assert_eq!(with.num_constraints(), without.num_constraints() + 2);
    assert_eq!(with.stitching(0), without.num_constraints());
}

fn all_variable_indices(layout: &IndexLayout, edge_counts: &[usize]) -> Vec<usize> {
    let n = layout.horizon();
    let dual = layout.dual_dims();
    let mut idx = Vec::new();
    for k in 0..=n {
        idx.extend((0..layout.state_dim()).map(|i| layout.state(k, i)));
    }
    for k in 0..n {
        idx.extend((0..layout.control_dim()).map(|i| layout.control(k, i)));
    }
    idx.extend((0..layout.time_vars()).map(|k| layout.time_start() + k));
    for k in 0..dual.stages {
        for (j, &e) in edge_counts.iter().enumerate() {
            idx.extend((0..e).map(|ei| layout.dual_l(k, j, ei)));
        }
        for j in 0..edge_counts.len() {
            idx.extend((0..dual.faces).map(|f| layout.dual_n(k, j, f)));
        }
    }
    idx
}

proptest! {
    #[test]
    fn variable_count_matches_closed_form(
        horizon in 1usize..12,
        edge_counts in prop::collection::vec(1usize..7, 0..5),
        time_vars in 1usize..3,
        stages in 1usize..4,
        faces in 1usize..5,
    ) {
        let obstacles = edge_counts.len();
        let layout = IndexLayout::new(
            horizon, 4, 2, time_vars, &edge_counts, obstacles, DualDims { stages, faces },
        );
        let total_edges: usize = edge_counts.iter().sum();
        let expected = 4 * (horizon + 1)
            + 2 * horizon
            + time_vars
            + stages * total_edges
            + stages * faces * obstacles;
        prop_assert_eq!(layout.num_variables(), expected);
    }

    #[test]
    fn indices_cover_the_decision_vector_exactly_once(
        horizon in 1usize..8,
        edge_counts in prop::collection::vec(1usize..6, 0..4),
    ) {
        let obstacles = edge_counts.len();
        let layout = IndexLayout::new(
            horizon, 4, 2, horizon + 1, &edge_counts, obstacles,
            DualDims { stages: horizon + 1, faces: 4 },
        );
        let idx = all_variable_indices(&layout, &edge_counts);
        let unique: HashSet<usize> = idx.iter().copied().collect();
        prop_assert_eq!(idx.len(), layout.num_variables());
        prop_assert_eq!(unique.len(), layout.num_variables());
        prop_assert!(idx.iter().all(|&i| i < layout.num_variables()));
    }

    #[test]
    fn problem_sizes_match_closed_form(
        horizon in 1usize..10,
        edge_counts in prop::collection::vec(3usize..6, 1..4),
        shared in any::<bool>(),
        hard_stitching in any::<bool>(),
    ) {
        let obstacles = edge_counts.len();
        let total_edges: usize = edge_counts.iter().sum();
        let stages = horizon + 1;

        let mut data = common::data(horizon);
        data.obstacles_a = DMatrix::from_fn(total_edges, 2, |r, c| if (r + c) % 2 == 0 { 1.0 } else { -1.0 });
        data.obstacles_b = DVector::from_element(total_edges, 1.0);
        data.warm_dual_l = DMatrix::from_element(total_edges, stages, 0.1);
        data.warm_dual_n = DMatrix::from_element(4 * obstacles, stages, 0.1);
        data.edge_counts = edge_counts;
        data.obstacle_count = obstacles;

        let mut config = common::config();
        config.time_scaling = if shared { TimeScaling::Shared } else { TimeScaling::PerStage };
        config.hard_stitching = hard_stitching;

        let formulation = Formulation::new(data, config).unwrap();
        let time_vars = if shared { 1 } else { stages };
        prop_assert_eq!(
            formulation.num_variables(),
            4 * stages + 2 * horizon + time_vars + stages * total_edges + stages * 4 * obstacles
        );
        prop_assert_eq!(
            formulation.num_constraints(),
            4 * horizon + horizon + 4 * obstacles * stages + if hard_stitching { 2 } else { 0 }
        );
    }
}
