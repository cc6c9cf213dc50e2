//! Crate-wide error taxonomy.
//!
//! Construction-time failures abort module creation outright; no partial or
//! degraded module is ever handed to the sampler. Evaluation-time failures
//! abort that single evaluation and surface to the caller; they are never
//! converted into a default or zero likelihood, which would corrupt the
//! inference.

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// A construction parameter is missing, inconsistent, or unusable.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A tabular file could not be read, or violates the expected schema.
    #[error("table {path}: {message}")]
    FileFormat { path: String, message: String },

    /// A resample target lies outside the tabulated theory support.
    #[error("resample target k = {target} outside theory support [{min}, {max}]")]
    OutOfDomain { target: f64, min: f64, max: f64 },

    /// Too few theory points for a stable cubic fit.
    #[error("cubic spline needs at least {needed} points, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The configured wavenumber window selects no data bins.
    #[error("fit window [{kmin}, {kmax}] selects no data bins")]
    EmptyFitRegion { kmin: f64, kmax: f64 },

    /// A basis term has no corresponding coefficient value at evaluation time.
    #[error("no value supplied for counterterm '{0}'")]
    MissingCoefficient(String),
}

impl FitError {
    /// Build a [`FitError::FileFormat`] for the given table path.
    pub fn file_format(path: &Path, message: impl Into<String>) -> Self {
        FitError::FileFormat {
            path: path.display().to_string(),
            message: message.into(),
        }
    }
}
