//! The fitting/scoring engine shared by every likelihood module.
//!
//! Responsibilities:
//!
//! - select the fitted wavenumber window (`window`)
//! - estimate diagonal variances (`variance`)
//! - turn theory + data tables into precomputed `CurveSet`s (`curve_set`)
//! - combine counterterms and accumulate the Gaussian log-likelihood
//!   (`gaussian`)

pub mod curve_set;
pub mod gaussian;
pub mod variance;
pub mod window;

pub use curve_set::*;
pub use gaussian::*;
pub use variance::*;
pub use window::*;
