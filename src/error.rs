//! Error types.
//!
//! Construction and tape generation fail hard; everything a solver callback
//! can hit at a bad iterate is recoverable and leaves the problem usable.

use thiserror::Error;

/// Inconsistent problem data or configuration, detected at construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("horizon must be at least 1")]
    ZeroHorizon,
    #[error("nominal stage duration must be positive and finite, got {0}")]
    InvalidStageDuration(f64),
    #[error("obstacle count {count} does not match edge-count array of length {edge_counts}")]
    ObstacleCountMismatch { count: usize, edge_counts: usize },
    #[error("obstacle {obstacle} has no edges")]
    EmptyObstacle { obstacle: usize },
    #[error("{what} has shape {got_rows}x{got_cols}, expected {rows}x{cols}")]
    Shape {
        what: &'static str,
        rows: usize,
        cols: usize,
        got_rows: usize,
        got_cols: usize,
    },
    #[error("{what} must be finite")]
    NonFinite { what: &'static str },
    #[error("{name} must be a non-negative finite weight, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },
    #[error("{name} must be positive and finite, got {value}")]
    InvalidLimit { name: &'static str, value: f64 },
    #[error("time-scaling range [{min}, {max}] must satisfy 0 < min <= 1 <= max")]
    InvalidTimeScaling { min: f64, max: f64 },
    #[error("safety distance range [{min}, {max}] must be finite with min <= max")]
    InvalidSafetyDistance { min: f64, max: f64 },
    #[error("xy bounds must satisfy min <= max on both axes")]
    InvalidXyBounds,
}

/// Tape generation failed; the formulation is malformed at the recording point.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TapeError {
    #[error("recorded value at tape entry {entry} is not finite")]
    NonFinite { entry: usize },
    #[error("tape has {got} outputs, expected {expected}")]
    OutputCount { expected: usize, got: usize },
}

/// A single evaluation was rejected. The solver may retry at another point.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("{what} is not finite at the evaluation point")]
    NonFinite { what: &'static str },
    #[error("{what} buffer has length {got}, expected {expected}")]
    BufferLength {
        what: &'static str,
        expected: usize,
        got: usize,
    },
}

/// A callback was issued out of lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("structure has not been declared")]
    StructureNotDeclared,
    #[error("problem is already finalized")]
    AlreadyFinalized,
    #[error("solution is not available before finalization")]
    NotFinalized,
}

/// Everything an [`NlpProblem`](crate::NlpProblem) callback can return.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NlpError {
    #[error(transparent)]
    Tape(#[from] TapeError),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error(transparent)]
    Usage(#[from] UsageError),
}

impl NlpError {
    /// Whether the solver may continue with another point.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, NlpError::Eval(_))
    }
}
