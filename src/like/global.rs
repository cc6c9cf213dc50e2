//! Global multi-redshift EFT fit.
//!
//! Every redshift bin contributes a real-space curve set and three
//! multipole curve sets, all scored against one shared counterterm vector
//! (`Z2_d` ... `Z2_vvv`, no growth-factor rescaling in this module). The
//! set of observables accumulated per bin is an explicit configuration
//! value: the historical pipeline summed the quadrupole twice and the
//! hexadecapole never, so the list must be reviewable rather than baked in.

use log::info;
use rayon::prelude::*;

use crate::domain::{BasisTerm, GlobalFitConfig, Multipole, Observable, RedshiftBin};
use crate::error::FitError;
use crate::fit::{log_likelihood, Coefficients, CurveSet, FractionalError};
use crate::io::Table;
use crate::like::block::{require, CoefficientSource, FitModule, ResultSink};
use crate::like::zdep::RESPONSE_TERMS;

/// Result key published by [`GlobalFit`].
pub const GLOBAL_LIKE_KEY: &str = "EFT_GLOBAL_LIKE";

/// Curve sets of one redshift bin.
struct BinSets {
    label: String,
    real: CurveSet,
    p0: CurveSet,
    p2: CurveSet,
    p4: CurveSet,
}

impl BinSets {
    fn observable(&self, observable: Observable) -> &CurveSet {
        match observable {
            Observable::Real => &self.real,
            Observable::P0 => &self.p0,
            Observable::P2 => &self.p2,
            Observable::P4 => &self.p4,
        }
    }
}

pub struct GlobalFit {
    namespace: String,
    accumulate: Vec<Observable>,
    bins: Vec<BinSets>,
}

impl GlobalFit {
    pub fn new(config: &GlobalFitConfig) -> Result<Self, FitError> {
        config.validate()?;

        // Bins are independent; build them in parallel.
        let bins = config
            .bins
            .par_iter()
            .map(build_bin)
            .collect::<Result<Vec<_>, FitError>>()?;

        info!(
            "global fit ready: {} redshift bins x {:?} observables",
            bins.len(),
            config.accumulate
        );

        Ok(Self {
            namespace: config.namespace.clone(),
            accumulate: config.accumulate.clone(),
            bins,
        })
    }

    /// Observables accumulated per bin, in order.
    pub fn accumulate(&self) -> &[Observable] {
        &self.accumulate
    }

    pub fn bin_labels(&self) -> impl Iterator<Item = &str> {
        self.bins.iter().map(|bin| bin.label.as_str())
    }
}

fn build_bin(bin: &RedshiftBin) -> Result<BinSets, FitError> {
    let theory = Table::read(&bin.theory)?;
    let real_data = Table::read(&bin.data_real)?;
    let multipole_data = Table::read(&bin.data_multipole)?;

    let real = CurveSet::build(
        &format!("{} real", bin.label),
        &theory,
        &real_data,
        "dd",
        "Pk",
        &[BasisTerm::new("dd_Z2_d", "Z2_d")],
        bin.fit_kmin,
        bin.fit_kmax,
        &FractionalError(bin.real_error),
    )?;

    let multipole_set = |multipole: Multipole| -> Result<CurveSet, FitError> {
        let tag = multipole.tag();
        let terms: Vec<BasisTerm> = RESPONSE_TERMS
            .iter()
            .map(|name| BasisTerm::new(format!("{tag}_{name}"), *name))
            .collect();

        CurveSet::build(
            &format!("{} {tag}", bin.label),
            &theory,
            &multipole_data,
            tag,
            tag,
            &terms,
            bin.fit_kmin,
            bin.fit_kmax,
            &FractionalError(bin.multipole_error),
        )
    };

    Ok(BinSets {
        label: bin.label.clone(),
        real,
        p0: multipole_set(Multipole::P0)?,
        p2: multipole_set(Multipole::P2)?,
        p4: multipole_set(Multipole::P4)?,
    })
}

impl FitModule for GlobalFit {
    fn like_key(&self) -> &'static str {
        GLOBAL_LIKE_KEY
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
        for bin in &self.bins {
            for &observable in &self.accumulate {
                like += log_likelihood(bin.observable(observable), &coefficients)?;
            }
        }

        sink.publish(GLOBAL_LIKE_KEY, like);
        Ok(like)
    }
}
