//! Diagonal variance estimation.
//!
//! The legacy pipeline models measurement uncertainty as a fixed fraction of
//! the measured value rather than a measured covariance. That heuristic
//! lives behind a small strategy trait so a real covariance estimate can
//! replace it without touching the engine.

use serde::{Deserialize, Serialize};

/// Strategy producing a per-bin variance from measured values.
pub trait ErrorModel {
    fn variance(&self, data: &[f64]) -> Vec<f64>;
}

/// `variance[i] = (fraction * data[i])^2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractionalError(pub f64);

impl ErrorModel for FractionalError {
    fn variance(&self, data: &[f64]) -> Vec<f64> {
        data.iter().map(|&v| (self.0 * v) * (self.0 * v)).collect()
    }
}
