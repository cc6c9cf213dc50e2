//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so the
//! hosting framework can deserialize module configuration from its own
//! parameter files and so CurveSets can be inspected in tests.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// Wavenumber column in theory tables.
pub const THEORY_K: &str = "k";

/// Wavenumber column in measured tables.
pub const DATA_K: &str = "k/h";

/// One counterterm basis column of a theory table.
///
/// `column` names the raw curve in the file; `name` is the coefficient the
/// sampler supplies at evaluation time to scale it; `rescale` is an optional
/// growth-factor divisor applied once when the curve is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisTerm {
    pub column: String,
    pub name: String,
    pub rescale: Option<f64>,
}

impl BasisTerm {
    pub fn new(column: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            name: name.into(),
            rescale: None,
        }
    }

    pub fn rescaled(column: impl Into<String>, name: impl Into<String>, rescale: f64) -> Self {
        Self {
            column: column.into(),
            name: name.into(),
            rescale: Some(rescale),
        }
    }
}

/// Rescale divisor converting a raw theory counterterm column into the
/// normalization convention of the reported `c_i` coefficients.
///
/// `rescale = -D_term / (2 * D_linear^2)`. The basis curve is divided by
/// this factor at load time, so a zero or non-finite factor must fail at
/// construction.
pub fn counterterm_rescale(d_linear: f64, d_term: f64) -> Result<f64, FitError> {
    let rescale = -d_term / (2.0 * d_linear * d_linear);
    if !rescale.is_finite() || rescale == 0.0 {
        return Err(FitError::Configuration(format!(
            "counterterm rescale must be finite and nonzero (D_linear = {d_linear}, D_term = {d_term})"
        )));
    }
    Ok(rescale)
}

/// Legendre multipoles of the redshift-space power spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Multipole {
    P0,
    P2,
    P4,
}

impl Multipole {
    pub const ALL: [Multipole; 3] = [Multipole::P0, Multipole::P2, Multipole::P4];

    /// Column tag used for this multipole in theory and data tables.
    pub fn tag(self) -> &'static str {
        match self {
            Multipole::P0 => "P0",
            Multipole::P2 => "P2",
            Multipole::P4 => "P4",
        }
    }
}

/// Observables a redshift bin can contribute to the global likelihood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Observable {
    Real,
    P0,
    P2,
    P4,
}

impl Observable {
    /// Every observable counted exactly once.
    pub const CORRECTED: [Observable; 4] = [
        Observable::Real,
        Observable::P0,
        Observable::P2,
        Observable::P4,
    ];

    /// Accumulation list reproducing the historical global fit, which summed
    /// the quadrupole twice and never the hexadecapole. Kept selectable so
    /// the two behaviors can be compared; do not use for new fits.
    pub const LEGACY: [Observable; 4] = [
        Observable::Real,
        Observable::P0,
        Observable::P2,
        Observable::P2,
    ];
}

fn default_dd_namespace() -> String {
    "dd_counterterms".to_string()
}

fn default_rsd_namespace() -> String {
    "rsd_counterterms".to_string()
}

fn default_zdep_namespace() -> String {
    "zdep_counterterms".to_string()
}

fn default_global_namespace() -> String {
    "EFT_counterterms".to_string()
}

fn default_multipole_error() -> f64 {
    0.20
}

fn default_realspace_error() -> f64 {
    0.05
}

fn default_accumulate() -> Vec<Observable> {
    Observable::CORRECTED.to_vec()
}

pub(crate) fn ensure_window(kmin: f64, kmax: f64) -> Result<(), FitError> {
    if !(kmin.is_finite() && kmax.is_finite()) || kmin > kmax {
        return Err(FitError::Configuration(format!(
            "fit window [{kmin}, {kmax}] must be finite with kmin <= kmax"
        )));
    }
    Ok(())
}

pub(crate) fn ensure_fraction(value: f64, what: &str) -> Result<(), FitError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(FitError::Configuration(format!(
            "{what} must be a positive finite fraction, got {value}"
        )));
    }
    Ok(())
}

/// Configuration for the fixed-redshift real-space fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdFitConfig {
    pub fit_kmin: f64,
    pub fit_kmax: f64,
    pub realspace_theory: PathBuf,
    pub realspace_data: PathBuf,
    /// Fractional error assigned to each measured bin.
    pub realspace_error: f64,
    pub d_linear: f64,
    pub d_zdelta: f64,
    /// Section under which the sampler publishes the counterterm values.
    #[serde(default = "default_dd_namespace")]
    pub namespace: String,
}

impl DdFitConfig {
    pub(crate) fn validate(&self) -> Result<(), FitError> {
        ensure_window(self.fit_kmin, self.fit_kmax)?;
        ensure_fraction(self.realspace_error, "realspace_error")
    }
}

/// Configuration for the redshift-space multipole fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsdFitConfig {
    pub fit_kmin: f64,
    pub fit_kmax: f64,
    /// Growth rate used to derive the `c_mu6` coefficient.
    pub f: f64,
    pub multipole_theory: PathBuf,
    pub multipole_data: PathBuf,
    pub d_linear: f64,
    pub d_mu0: f64,
    pub d_mu2: f64,
    pub d_mu4: f64,
    pub d_mu6: f64,
    #[serde(default = "default_multipole_error")]
    pub multipole_error: f64,
    /// Anchor the fit with the real-space spectrum.
    #[serde(default)]
    pub use_realspace: bool,
    #[serde(default)]
    pub realspace_theory: Option<PathBuf>,
    #[serde(default)]
    pub realspace_data: Option<PathBuf>,
    #[serde(default = "default_realspace_error")]
    pub realspace_error: f64,
    #[serde(default)]
    pub d_zdelta: Option<f64>,
    #[serde(default = "default_rsd_namespace")]
    pub namespace: String,
}

impl RsdFitConfig {
    pub(crate) fn validate(&self) -> Result<(), FitError> {
        ensure_window(self.fit_kmin, self.fit_kmax)?;
        ensure_fraction(self.multipole_error, "multipole_error")?;
        if !self.f.is_finite() {
            return Err(FitError::Configuration(format!(
                "growth rate f must be finite, got {}",
                self.f
            )));
        }
        if self.use_realspace {
            ensure_fraction(self.realspace_error, "realspace_error")?;
            if self.realspace_theory.is_none()
                || self.realspace_data.is_none()
                || self.d_zdelta.is_none()
            {
                return Err(FitError::Configuration(
                    "use_realspace requires realspace_theory, realspace_data, and d_zdelta"
                        .to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Configuration for the counterterm redshift-dependence fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZFitConfig {
    /// Measured `c_0`, `c_2`, `c_4` coefficients per redshift.
    pub data: PathBuf,
    /// Response tables, one per mu moment.
    pub mu0: PathBuf,
    pub mu2: PathBuf,
    pub mu4: PathBuf,
    #[serde(default = "default_realspace_error")]
    pub error: f64,
    #[serde(default = "default_zdep_namespace")]
    pub namespace: String,
}

impl ZFitConfig {
    pub(crate) fn validate(&self) -> Result<(), FitError> {
        ensure_fraction(self.error, "error")
    }
}

/// One redshift bin of the global fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedshiftBin {
    /// Diagnostic label, e.g. `z0` or `z05`.
    pub label: String,
    pub fit_kmin: f64,
    pub fit_kmax: f64,
    pub data_real: PathBuf,
    pub data_multipole: PathBuf,
    pub theory: PathBuf,
    pub real_error: f64,
    pub multipole_error: f64,
}

impl RedshiftBin {
    pub(crate) fn validate(&self) -> Result<(), FitError> {
        ensure_window(self.fit_kmin, self.fit_kmax)?;
        ensure_fraction(self.real_error, "real_error")?;
        ensure_fraction(self.multipole_error, "multipole_error")
    }
}

/// Configuration for the global multi-redshift fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalFitConfig {
    /// Redshift bins in accumulation order; canonically five
    /// (z0, z025, z05, z075, z1).
    pub bins: Vec<RedshiftBin>,
    /// Observables accumulated per bin. Defaults to
    /// [`Observable::CORRECTED`]; see [`Observable::LEGACY`] for the
    /// historical double-counted quadrupole.
    #[serde(default = "default_accumulate")]
    pub accumulate: Vec<Observable>,
    #[serde(default = "default_global_namespace")]
    pub namespace: String,
}

impl GlobalFitConfig {
    pub(crate) fn validate(&self) -> Result<(), FitError> {
        if self.bins.is_empty() {
            return Err(FitError::Configuration(
                "global fit needs at least one redshift bin".to_string(),
            ));
        }
        if self.accumulate.is_empty() {
            return Err(FitError::Configuration(
                "global fit accumulation list must not be empty".to_string(),
            ));
        }
        for bin in &self.bins {
            bin.validate()?;
        }
        Ok(())
    }
}
