//! Redshift-dependence fit for the counterterm coefficients.
//!
//! The measured side is the per-redshift `c_0`, `c_2`, `c_4` coefficient
//! tables; the model side is the seven `Z2_*` response columns of one
//! mu-moment table per observed coefficient. There is no wavenumber axis
//! and nothing to regrid: each observed coefficient becomes a curve set
//! with zero signal, so the shared combiner scores
//! `sum_j Z2_j * response_j - c_observed` directly.

use log::info;

use crate::domain::ZFitConfig;
use crate::error::FitError;
use crate::fit::{log_likelihood, Coefficients, CurveSet, ErrorModel, FractionalError};
use crate::io::Table;
use crate::like::block::{require, CoefficientSource, FitModule, ResultSink};

/// Result key published by [`ZFit`].
pub const Z_LIKE_KEY: &str = "Z_FIT_LIKE";

/// Response columns shared by the three mu tables, in sampler order.
pub const RESPONSE_TERMS: [&str; 7] = [
    "Z2_d", "Z2_v", "Z2_vd", "Z2_vv_A", "Z2_vv_B", "Z2_vvd", "Z2_vvv",
];

pub struct ZFit {
    namespace: String,
    /// One curve set per observed coefficient: c_0, c_2, c_4.
    moments: Vec<CurveSet>,
}

impl ZFit {
    pub fn new(config: &ZFitConfig) -> Result<Self, FitError> {
        config.validate()?;

        let data = Table::read(&config.data)?;
        let error_model = FractionalError(config.error);

        let inputs = [
            ("c_0", &config.mu0),
            ("c_2", &config.mu2),
            ("c_4", &config.mu4),
        ];

        let mut moments = Vec::with_capacity(inputs.len());
        for (column, table_path) in inputs {
            let table = Table::read(table_path)?;
            let observed = data.column(column)?;
            if table.n_rows() != observed.len() {
                return Err(FitError::Configuration(format!(
                    "response table {} has {} rows but `{column}` has {}",
                    table.path().display(),
                    table.n_rows(),
                    observed.len()
                )));
            }

            let terms = RESPONSE_TERMS
                .iter()
                .map(|name| Ok((name.to_string(), table.column(name)?)))
                .collect::<Result<Vec<_>, FitError>>()?;

            // No fixed signal part: the whole model is the counterterm
            // combination, so the baseline is just the negated measurement.
            let baseline = observed.iter().map(|v| -v).collect();
            let variance = error_model.variance(&observed);
            // These tables carry no wavenumber axis; the grid is the row
            // index.
            let grid = (0..observed.len()).map(|i| i as f64).collect();

            moments.push(CurveSet::from_parts(
                column, grid, baseline, variance, terms,
            )?);
        }

        info!(
            "z-dependence fit ready: {} redshift rows per coefficient",
            moments[0].len()
        );

        Ok(Self {
            namespace: config.namespace.clone(),
            moments,
        })
    }
}

impl FitModule for ZFit {
    fn like_key(&self) -> &'static str {
        Z_LIKE_KEY
    }

    fn evaluate(
        &self,
        params: &dyn CoefficientSource,
        sink: &mut dyn ResultSink,
    ) -> Result<f64, FitError> {
        let mut coefficients = Coefficients::with_capacity(RESPONSE_TERMS.len());
        for name in RESPONSE_TERMS {
            coefficients.insert(name.to_string(), require(params, &self.namespace, name)?);
        }

        let mut like = 0.0;
        for moment in &self.moments {
            like += log_likelihood(moment, &coefficients)?;
        }

        sink.publish(Z_LIKE_KEY, like);
        Ok(like)
    }
}
