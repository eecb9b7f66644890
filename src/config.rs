//! Distance-approach configuration
//!
//! Objective weights, physical limits and formulation modes. There are no
//! built-in defaults: every value comes from the caller.

use serde::{Deserialize, Serialize};

use crate::bounds::BOUND_INF;
use crate::error::ConfigError;

/// Layout of the time-scaling decision variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeScaling {
    /// One scaling variable per stage (horizon + 1 variables).
    PerStage,
    /// A single scaling variable shared by every stage.
    Shared,
}

/// Main distance-approach configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistanceApproachConfig {
    /// State tracking weight on x against the warm start
    pub weight_state_x: f64,
    /// State tracking weight on y against the warm start
    pub weight_state_y: f64,
    /// State tracking weight on heading against the warm start
    pub weight_state_phi: f64,
    /// State tracking weight on speed against the warm start
    pub weight_state_v: f64,
    /// Control magnitude weight on steering
    pub weight_input_steer: f64,
    /// Control magnitude weight on acceleration
    pub weight_input_a: f64,
    /// Control rate weight on steering
    pub weight_rate_steer: f64,
    /// Control rate weight on acceleration
    pub weight_rate_a: f64,
    /// Stitching weight on steering against the last executed command
    pub weight_stitching_steer: f64,
    /// Stitching weight on acceleration against the last executed command
    pub weight_stitching_a: f64,
    /// First-order time-scaling regularization
    pub weight_first_order_time: f64,
    /// Second-order time-scaling regularization
    pub weight_second_order_time: f64,
    /// Weight on the sum of time-scaling variables
    pub weight_total_time: f64,

    /// Steering angle limit [rad]
    pub max_steer_angle: f64,
    /// Steering rate limit [rad/s]
    pub max_steer_rate: f64,
    /// Forward speed limit [m/s]
    pub max_speed_forward: f64,
    /// Reverse speed limit [m/s]
    pub max_speed_reverse: f64,
    /// Forward acceleration limit [m/s²]
    pub max_acceleration_forward: f64,
    /// Reverse acceleration limit [m/s²]
    pub max_acceleration_reverse: f64,
    /// Lower bound on the time-scaling variables
    pub min_time_sample_scaling: f64,
    /// Upper bound on the time-scaling variables
    pub max_time_sample_scaling: f64,
    /// Upper bound on the obstacle-edge multipliers
    pub max_lambda: f64,
    /// Upper bound on the footprint-face multipliers
    pub max_miu: f64,
    /// Minimum signed distance between footprint and obstacle [m]
    pub min_safety_distance: f64,
    /// Optional upper bound on the distance rows; unbounded when absent
    #[serde(default)]
    pub max_safety_distance: Option<f64>,

    /// Pin every time-scaling variable to 1
    pub use_fix_time: bool,
    /// Time-scaling variable layout
    pub time_scaling: TimeScaling,
    /// Add equality rows tying the first control to the last executed one
    pub hard_stitching: bool,
}

impl DistanceApproachConfig {
    /// Check weights, limits and the time-scaling range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("weight_state_x", self.weight_state_x),
            ("weight_state_y", self.weight_state_y),
            ("weight_state_phi", self.weight_state_phi),
            ("weight_state_v", self.weight_state_v),
            ("weight_input_steer", self.weight_input_steer),
            ("weight_input_a", self.weight_input_a),
            ("weight_rate_steer", self.weight_rate_steer),
            ("weight_rate_a", self.weight_rate_a),
            ("weight_stitching_steer", self.weight_stitching_steer),
            ("weight_stitching_a", self.weight_stitching_a),
            ("weight_first_order_time", self.weight_first_order_time),
            ("weight_second_order_time", self.weight_second_order_time),
            ("weight_total_time", self.weight_total_time),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }

        let limits = [
            ("max_steer_angle", self.max_steer_angle),
            ("max_steer_rate", self.max_steer_rate),
            ("max_speed_forward", self.max_speed_forward),
            ("max_speed_reverse", self.max_speed_reverse),
            ("max_acceleration_forward", self.max_acceleration_forward),
            ("max_acceleration_reverse", self.max_acceleration_reverse),
            ("max_lambda", self.max_lambda),
            ("max_miu", self.max_miu),
        ];
        for (name, value) in limits {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidLimit { name, value });
            }
        }

        if !self.min_safety_distance.is_finite() {
            return Err(ConfigError::NonFinite {
                what: "min_safety_distance",
            });
        }
        if let Some(max) = self.max_safety_distance {
            if !max.is_finite() || max < self.min_safety_distance {
                return Err(ConfigError::InvalidSafetyDistance {
                    min: self.min_safety_distance,
                    max,
                });
            }
        }

        let (min, max) = (self.min_time_sample_scaling, self.max_time_sample_scaling);
        if !(min.is_finite() && max.is_finite()) || min <= 0.0 || min > 1.0 || max < 1.0 {
            return Err(ConfigError::InvalidTimeScaling { min, max });
        }

        Ok(())
    }

    /// Bounds applied to every distance row.
    pub fn safety_distance_bounds(&self) -> (f64, f64) {
        (
            self.min_safety_distance,
            self.max_safety_distance.unwrap_or(BOUND_INF),
        )
    }

    /// Bounds applied to every time-scaling variable.
    pub fn time_scaling_bounds(&self) -> (f64, f64) {
        if self.use_fix_time {
            (1.0, 1.0)
        } else {
            (self.min_time_sample_scaling, self.max_time_sample_scaling)
        }
    }
}
