//! Vehicle footprint and obstacle half-space systems.

use nalgebra::{DMatrix, DVector, Vector4};

use crate::error::ConfigError;

/// Rectangular vehicle footprint measured from the rear-axle reference point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleGeometry {
    /// Distance to the front edge [m]
    pub front_edge: f64,
    /// Distance to the right edge [m]
    pub right_edge: f64,
    /// Distance to the back edge [m]
    pub back_edge: f64,
    /// Distance to the left edge [m]
    pub left_edge: f64,
    /// Wheelbase [m]
    pub wheelbase: f64,
}

impl VehicleGeometry {
    /// Build from the `[front, right, back, left]` edge-distance vector.
    pub fn from_edges(edges: Vector4<f64>, wheelbase: f64) -> Self {
        Self {
            front_edge: edges[0],
            right_edge: edges[1],
            back_edge: edges[2],
            left_edge: edges[3],
            wheelbase,
        }
    }

    /// Footprint length.
    pub fn length(&self) -> f64 {
        self.front_edge + self.back_edge
    }

    /// Footprint width.
    pub fn width(&self) -> f64 {
        self.left_edge + self.right_edge
    }

    /// Right-hand side of the footprint half-space system `G p ≤ g` in the
    /// body frame centred on the footprint, with faces ordered
    /// front, left, back, right.
    pub fn half_extents(&self) -> [f64; 4] {
        let half_l = 0.5 * self.length();
        let half_w = 0.5 * self.width();
        [half_l, half_w, half_l, half_w]
    }

    /// Longitudinal offset from the reference point to the footprint centre.
    pub fn center_offset(&self) -> f64 {
        0.5 * (self.front_edge + self.back_edge) - self.back_edge
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let edges = [
            ("front_edge", self.front_edge),
            ("right_edge", self.right_edge),
            ("back_edge", self.back_edge),
            ("left_edge", self.left_edge),
        ];
        for (name, value) in edges {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidLimit { name, value });
            }
        }
        if self.length() <= 0.0 || self.width() <= 0.0 {
            return Err(ConfigError::InvalidLimit {
                name: "footprint",
                value: self.length().min(self.width()),
            });
        }
        if !self.wheelbase.is_finite() || self.wheelbase <= 0.0 {
            return Err(ConfigError::InvalidLimit {
                name: "wheelbase",
                value: self.wheelbase,
            });
        }
        Ok(())
    }
}

/// Convex obstacle `{p : A p ≤ b}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    /// Edge normals, one row per edge (`e × 2`).
    pub a: DMatrix<f64>,
    /// Edge offsets (`e`).
    pub b: DVector<f64>,
}

impl Obstacle {
    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.b.len()
    }
}

/// Ordered obstacle collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObstacleSet {
    obstacles: Vec<Obstacle>,
}

impl ObstacleSet {
    /// Split stacked half-space rows into obstacles.
    ///
    /// `a` is `Σe × 2` and `b` is `Σe`, rows of all obstacles concatenated in
    /// order; `edge_counts[j]` rows belong to obstacle `j`.
    pub fn from_stacked(
        a: &DMatrix<f64>,
        b: &DVector<f64>,
        edge_counts: &[usize],
        obstacle_count: usize,
    ) -> Result<Self, ConfigError> {
        if edge_counts.len() != obstacle_count {
            return Err(ConfigError::ObstacleCountMismatch {
                count: obstacle_count,
                edge_counts: edge_counts.len(),
            });
        }
        if let Some(obstacle) = edge_counts.iter().position(|&e| e == 0) {
            return Err(ConfigError::EmptyObstacle { obstacle });
        }

        let total: usize = edge_counts.iter().sum();
        if a.nrows() != total || a.ncols() != 2 {
            return Err(ConfigError::Shape {
                what: "obstacle A",
                rows: total,
                cols: 2,
                got_rows: a.nrows(),
                got_cols: a.ncols(),
            });
        }
        if b.len() != total {
            return Err(ConfigError::Shape {
                what: "obstacle b",
                rows: total,
                cols: 1,
                got_rows: b.len(),
                got_cols: 1,
            });
        }
        if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
            return Err(ConfigError::NonFinite { what: "obstacle half-space" });
        }

        let mut start = 0;
        let obstacles = edge_counts
            .iter()
            .map(|&e| {
                let obstacle = Obstacle {
                    a: a.rows(start, e).into_owned(),
                    b: b.rows(start, e).into_owned(),
                };
                start += e;
                obstacle
            })
            .collect();

        Ok(Self { obstacles })
    }

    /// Number of obstacles.
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    /// Whether there are no obstacles.
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Edge count of every obstacle, in order.
    pub fn edge_counts(&self) -> Vec<usize> {
        self.obstacles.iter().map(Obstacle::num_edges).collect()
    }

    /// Total number of edges.
    pub fn total_edges(&self) -> usize {
        self.obstacles.iter().map(Obstacle::num_edges).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Obstacle> {
        self.obstacles.iter()
    }
}

impl<'a> IntoIterator for &'a ObstacleSet {
    type Item = &'a Obstacle;
    type IntoIter = std::slice::Iter<'a, Obstacle>;

    fn into_iter(self) -> Self::IntoIter {
        self.obstacles.iter()
    }
}
