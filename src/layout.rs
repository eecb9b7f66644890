//! Decision-vector and constraint-row layout.
//!
//! The decision vector is `[states | controls | time | l | n]`, stage-major
//! inside each block. The constraint vector is
//! `[dynamics | steering rate | obstacle rows | stitching]`.

/// Shape of the dual-variable blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DualDims {
    /// Number of stages carrying their own multipliers.
    pub stages: usize,
    /// Multipliers per obstacle in the `n` block (footprint faces).
    pub faces: usize,
}

/// Segment offsets of the flat decision vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLayout {
    horizon: usize,
    state_dim: usize,
    control_dim: usize,
    time_vars: usize,
    dual: DualDims,
    obstacle_count: usize,
    total_edges: usize,
    edge_offsets: Vec<usize>,
    control_start: usize,
    time_start: usize,
    l_start: usize,
    n_start: usize,
    num_variables: usize,
}

impl IndexLayout {
    /// Compute every segment offset once.
    ///
    /// `edge_counts.len()` must equal `obstacle_count`; the constructor of the
    /// problem checks this before building a layout.
    pub fn new(
        horizon: usize,
        state_dim: usize,
        control_dim: usize,
        time_vars: usize,
        edge_counts: &[usize],
        obstacle_count: usize,
        dual: DualDims,
    ) -> Self {
        debug_assert_eq!(edge_counts.len(), obstacle_count);

        let mut edge_offsets = Vec::with_capacity(edge_counts.len());
        let mut total_edges = 0;
        for &e in edge_counts {
            edge_offsets.push(total_edges);
            total_edges += e;
        }

        let control_start = state_dim * (horizon + 1);
        let time_start = control_start + control_dim * horizon;
        let l_start = time_start + time_vars;
        let n_start = l_start + dual.stages * total_edges;
        let num_variables = n_start + dual.stages * dual.faces * obstacle_count;

        Self {
            horizon,
            state_dim,
            control_dim,
            time_vars,
            dual,
            obstacle_count,
            total_edges,
            edge_offsets,
            control_start,
            time_start,
            l_start,
            n_start,
            num_variables,
        }
    }

    /// Length of the decision vector.
    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    pub fn control_dim(&self) -> usize {
        self.control_dim
    }

    pub fn time_vars(&self) -> usize {
        self.time_vars
    }

    pub fn dual_dims(&self) -> DualDims {
        self.dual
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacle_count
    }

    pub fn total_edges(&self) -> usize {
        self.total_edges
    }

    /// State component `i` of stage `k` (`k ≤ horizon`).
    #[inline]
    pub fn state(&self, k: usize, i: usize) -> usize {
        debug_assert!(k <= self.horizon && i < self.state_dim);
        k * self.state_dim + i
    }

    /// Control component `i` of stage `k` (`k < horizon`).
    #[inline]
    pub fn control(&self, k: usize, i: usize) -> usize {
        debug_assert!(k < self.horizon && i < self.control_dim);
        self.control_start + k * self.control_dim + i
    }

    /// Time-scaling variable of stage `k`. Every stage maps to the same
    /// variable when there is only one.
    #[inline]
    pub fn time(&self, k: usize) -> usize {
        debug_assert!(self.time_vars > 0);
        if self.time_vars == 1 {
            self.time_start
        } else {
            debug_assert!(k < self.time_vars);
            self.time_start + k
        }
    }

    /// Multiplier of edge `e` of obstacle `j` at dual stage `k`.
    #[inline]
    pub fn dual_l(&self, k: usize, j: usize, e: usize) -> usize {
        debug_assert!(k < self.dual.stages && j < self.obstacle_count);
        self.l_start + k * self.total_edges + self.edge_offsets[j] + e
    }

    /// Multiplier of face `f` for obstacle `j` at dual stage `k`.
    #[inline]
    pub fn dual_n(&self, k: usize, j: usize, f: usize) -> usize {
        debug_assert!(k < self.dual.stages && j < self.obstacle_count && f < self.dual.faces);
        self.n_start + (k * self.obstacle_count + j) * self.dual.faces + f
    }

    /// Start of the time block.
    pub fn time_start(&self) -> usize {
        self.time_start
    }

    /// Start of the `l` block.
    pub fn l_start(&self) -> usize {
        self.l_start
    }

    /// Start of the `n` block.
    pub fn n_start(&self) -> usize {
        self.n_start
    }
}

/// Row offsets of the constraint blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintLayout {
    horizon: usize,
    state_dim: usize,
    obstacle_count: usize,
    steer_rate_start: usize,
    obstacle_start: usize,
    stitching_start: usize,
    num_constraints: usize,
}

/// Rows per (stage, obstacle): norm, two footprint equalities, distance.
pub const OBSTACLE_ROWS: usize = 4;

/// Rows of the optional stitching block (one per control component).
pub const STITCHING_ROWS: usize = 2;

impl ConstraintLayout {
    pub fn new(
        horizon: usize,
        state_dim: usize,
        obstacle_count: usize,
        hard_stitching: bool,
    ) -> Self {
        let steer_rate_start = state_dim * horizon;
        let obstacle_start = steer_rate_start + horizon;
        let stitching_start = obstacle_start + OBSTACLE_ROWS * obstacle_count * (horizon + 1);
        let num_constraints = stitching_start + if hard_stitching { STITCHING_ROWS } else { 0 };
        Self {
            horizon,
            state_dim,
            obstacle_count,
            steer_rate_start,
            obstacle_start,
            stitching_start,
            num_constraints,
        }
    }

    /// Length of the constraint vector.
    pub fn num_constraints(&self) -> usize {
        self.num_constraints
    }

    /// Dynamics row for state component `i` of transition `k → k+1`.
    #[inline]
    pub fn dynamics(&self, k: usize, i: usize) -> usize {
        debug_assert!(k < self.horizon && i < self.state_dim);
        k * self.state_dim + i
    }

    /// Steering-rate row of control stage `k`.
    #[inline]
    pub fn steer_rate(&self, k: usize) -> usize {
        debug_assert!(k < self.horizon);
        self.steer_rate_start + k
    }

    /// Obstacle row `r` (`0..OBSTACLE_ROWS`) of stage `k` and obstacle `j`.
    #[inline]
    pub fn obstacle(&self, k: usize, j: usize, r: usize) -> usize {
        debug_assert!(k <= self.horizon && j < self.obstacle_count && r < OBSTACLE_ROWS);
        self.obstacle_start + (k * self.obstacle_count + j) * OBSTACLE_ROWS + r
    }

    /// Whether the stitching rows are present.
    pub fn has_stitching(&self) -> bool {
        self.num_constraints > self.stitching_start
    }

    /// Stitching row for control component `i`.
    #[inline]
    pub fn stitching(&self, i: usize) -> usize {
        debug_assert!(self.has_stitching() && i < STITCHING_ROWS);
        self.stitching_start + i
    }

    pub fn steer_rate_start(&self) -> usize {
        self.steer_rate_start
    }

    pub fn obstacle_start(&self) -> usize {
        self.obstacle_start
    }

    pub fn stitching_start(&self) -> usize {
        self.stitching_start
    }
}
