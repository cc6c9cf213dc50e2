//! Likelihood modules exposed to the sampling framework.
//!
//! Four modules, all built on the same engine:
//!
//! - `dd`: real-space spectrum at fixed redshift
//! - `rsd`: redshift-space multipoles, optionally anchored in real space
//! - `zdep`: redshift dependence of the counterterm coefficients
//! - `global`: multi-redshift bundle over real space + multipoles
//!
//! Each module is constructed once from static configuration and input
//! files, then evaluated arbitrarily many times with fresh coefficient
//! values; evaluation never mutates the module.

pub mod block;
pub mod dd;
pub mod global;
pub mod rsd;
pub mod zdep;

pub use block::*;
pub use dd::*;
pub use global::*;
pub use rsd::*;
pub use zdep::*;

use std::path::Path;

use crate::domain::BasisTerm;
use crate::error::FitError;
use crate::fit::{CurveSet, FractionalError};
use crate::io::Table;

/// Counterterm coefficient names shared by the fixed-redshift modules.
pub const C_MU0: &str = "c_mu0";
pub const C_MU2: &str = "c_mu2";
pub const C_MU4: &str = "c_mu4";
pub const C_MU6: &str = "c_mu6";

/// Build the real-space curve set used by the `dd` fit and as the optional
/// anchor of the `rsd` fit: signal `dd`, one rescaled `Z2_d` counterterm
/// scaled by `c_mu0`.
pub(crate) fn realspace_set(
    label: &str,
    theory_file: &Path,
    data_file: &Path,
    kmin: f64,
    kmax: f64,
    error_fraction: f64,
    rescale: f64,
) -> Result<CurveSet, FitError> {
    let theory = Table::read(theory_file)?;
    let data = Table::read(data_file)?;
    let terms = [BasisTerm::rescaled("Z2_d", C_MU0, rescale)];
    CurveSet::build(
        label,
        &theory,
        &data,
        "dd",
        "Pk",
        &terms,
        kmin,
        kmax,
        &FractionalError(error_fraction),
    )
}
