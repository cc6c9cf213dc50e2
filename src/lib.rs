//! `eft-likes` library crate.
//!
//! Gaussian log-likelihood modules scoring EFT predictions for galaxy
//! clustering power spectra against measured data, for use inside a
//! cosmological parameter-sampling pipeline.
//!
//! The crate is organized so that:
//!
//! - the scoring engine (`fit`) is shared by every likelihood module and
//!   testable on its own
//! - file ingest (`io`) and resampling (`math`) stay separate from the
//!   likelihood math
//! - the hosting framework is reached only through the narrow traits in
//!   `like::block`

pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod like;
pub mod math;
