//! Mathematical utilities: cubic-spline resampling.

pub mod spline;

pub use spline::*;
