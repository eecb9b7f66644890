pub mod breverse_ops;
pub mod dual_ops;
