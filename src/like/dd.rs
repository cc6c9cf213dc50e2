//! Real-space power spectrum fit at fixed redshift.
//!
//! One curve set: the measured `Pk` against the one-loop `dd` prediction,
//! with a single `Z2_d` counterterm scaled by `c_mu0`.

use log::info;

use crate::domain::{counterterm_rescale, DdFitConfig};
use crate::error::FitError;
use crate::fit::{log_likelihood, Coefficients, CurveSet};
use crate::like::block::{require, CoefficientSource, FitModule, ResultSink};
use crate::like::{realspace_set, C_MU0};

/// Result key published by [`DdFit`].
pub const DD_LIKE_KEY: &str = "DDFIT_LIKE";

pub struct DdFit {
    namespace: String,
    realspace: CurveSet,
}

impl DdFit {
    pub fn new(config: &DdFitConfig) -> Result<Self, FitError> {
        config.validate()?;
        let rescale = counterterm_rescale(config.d_linear, config.d_zdelta)?;

        let realspace = realspace_set(
            "realspace",
            &config.realspace_theory,
            &config.realspace_data,
            config.fit_kmin,
            config.fit_kmax,
            config.realspace_error,
            rescale,
        )?;

        info!(
            "dd fit ready: {} bins in [{}, {}]",
            realspace.len(),
            config.fit_kmin,
            config.fit_kmax
        );

        Ok(Self {
            namespace: config.namespace.clone(),
            realspace,
        })
    }
}

impl FitModule for DdFit {
    fn like_key(&self) -> &'static str {
        DD_LIKE_KEY
    }

    fn evaluate(
        &self,
        params: &dyn CoefficientSource,
        sink: &mut dyn ResultSink,
    ) -> Result<f64, FitError> {
        let mut coefficients = Coefficients::new();
        coefficients.insert(C_MU0.to_string(), require(params, &self.namespace, C_MU0)?);

        let like = log_likelihood(&self.realspace, &coefficients)?;
        sink.publish(DD_LIKE_KEY, like);
        Ok(like)
    }
}
