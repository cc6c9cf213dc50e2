//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - the declarative basis-term description (`BasisTerm`)
//! - growth-factor rescaling (`counterterm_rescale`)
//! - observable enums (`Multipole`, `Observable`)
//! - per-module configuration structs (`DdFitConfig`, `RsdFitConfig`, ...)

pub mod types;

pub use types::*;
