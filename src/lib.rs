//! NLP problem adapter for distance-approach trajectory optimization.
//!
//! A [`DistanceApproachProblem`] turns a warm-start trajectory, static convex
//! obstacles and vehicle parameters into a nonlinear program, and answers the
//! callbacks of an external solver through [`NlpProblem`]. Derivatives come
//! from a bytecode tape recorded once and replayed at every iterate.

pub mod adapter;
pub mod api;
pub mod bounds;
pub mod breverse;
pub mod bytecode_tape;
pub mod config;
pub mod dual;
pub mod engine;
pub mod error;
pub mod formulation;
pub mod geometry;
pub mod layout;
pub mod nlp;
pub mod opcode;
pub mod problem;
pub mod scalar;
pub mod solution;
pub mod sparse;
mod traits;

pub use adapter::{DistanceApproachProblem, Lifecycle};
pub use api::record_multi;
pub use bounds::{Bounds, BOUND_INF};
pub use breverse::BReverse;
pub use bytecode_tape::BytecodeTape;
pub use config::{DistanceApproachConfig, TimeScaling};
pub use dual::Dual;
pub use engine::DerivativeEngine;
pub use error::{ConfigError, EvalError, NlpError, TapeError, UsageError};
pub use formulation::Formulation;
pub use geometry::{Obstacle, ObstacleSet, VehicleGeometry};
pub use layout::{ConstraintLayout, DualDims, IndexLayout};
pub use nlp::{IndexStyle, NlpInfo, NlpProblem};
pub use problem::{ProblemData, XyBounds};
pub use scalar::Scalar;
pub use solution::{SolutionRecord, SolverStatus};
pub use sparse::{JacobianSparsityPattern, SparsityPattern};
