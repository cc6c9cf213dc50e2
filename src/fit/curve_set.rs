//! Precomputed fit inputs for one observable.
//!
//! Every likelihood module repeats the same preparation: mask the measured
//! grid to the fitted window, regrid each theory column onto the surviving
//! bins, divide counterterm curves by their growth-factor rescale, and
//! precompute the baseline residual and diagonal variance. `CurveSet` does
//! that once, at module construction; evaluation only ever reads it.

use log::debug;

use crate::domain::{BasisTerm, DATA_K, THEORY_K};
use crate::error::FitError;
use crate::fit::variance::ErrorModel;
use crate::fit::window::{select, window_mask};
use crate::io::Table;
use crate::math::resample;

/// Immutable per-observable fit input.
///
/// Invariant: `grid`, `baseline`, `variance`, and every term share one
/// length, which is nonzero.
#[derive(Debug, Clone)]
pub struct CurveSet {
    label: String,
    grid: Vec<f64>,
    /// Theory signal minus measured values, per bin.
    baseline: Vec<f64>,
    variance: Vec<f64>,
    /// Coefficient name and rescaled basis values, per term.
    terms: Vec<(String, Vec<f64>)>,
}

impl CurveSet {
    /// Mask, regrid, rescale, and precompute for one observable.
    ///
    /// `signal_column` is read from `theory`, `data_column` from `data`;
    /// the wavenumber axes are the fixed `k` / `k/h` columns.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        label: &str,
        theory: &Table,
        data: &Table,
        signal_column: &str,
        data_column: &str,
        terms: &[BasisTerm],
        kmin: f64,
        kmax: f64,
        error_model: &dyn ErrorModel,
    ) -> Result<Self, FitError> {
        let theory_ks = theory.column(THEORY_K)?;
        let data_ks = data.column(DATA_K)?;

        let mask = window_mask(&data_ks, kmin, kmax);
        let grid = select(&data_ks, &mask);
        if grid.is_empty() {
            return Err(FitError::EmptyFitRegion { kmin, kmax });
        }
        let data_values = select(&data.column(data_column)?, &mask);

        let signal = resample(&theory_ks, &theory.column(signal_column)?, &grid)?;
        let baseline: Vec<f64> = signal
            .iter()
            .zip(&data_values)
            .map(|(s, d)| s - d)
            .collect();
        let variance = error_model.variance(&data_values);

        let mut out_terms = Vec::with_capacity(terms.len());
        for term in terms {
            let mut values = resample(&theory_ks, &theory.column(&term.column)?, &grid)?;
            if let Some(rescale) = term.rescale {
                for v in &mut values {
                    *v /= rescale;
                }
            }
            out_terms.push((term.name.clone(), values));
        }

        debug!(
            "{label}: {} of {} data bins inside [{kmin}, {kmax}]",
            grid.len(),
            data_ks.len()
        );

        Ok(Self {
            label: label.to_string(),
            grid,
            baseline,
            variance,
            terms: out_terms,
        })
    }

    /// Assemble a CurveSet from arrays already on their final grid.
    ///
    /// The z-dependence response tables need no masking or regridding; they
    /// still share the combiner with every other observable.
    pub fn from_parts(
        label: &str,
        grid: Vec<f64>,
        baseline: Vec<f64>,
        variance: Vec<f64>,
        terms: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, FitError> {
        let len = grid.len();
        if len == 0 {
            return Err(FitError::Configuration(format!(
                "curve set `{label}` must contain at least one bin"
            )));
        }
        if baseline.len() != len
            || variance.len() != len
            || terms.iter().any(|(_, v)| v.len() != len)
        {
            return Err(FitError::Configuration(format!(
                "curve set `{label}` arrays must all have length {len}"
            )));
        }

        Ok(Self {
            label: label.to_string(),
            grid,
            baseline,
            variance,
            terms,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of fitted bins.
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Masked measured wavenumbers.
    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    pub fn baseline(&self) -> &[f64] {
        &self.baseline
    }

    pub fn variance(&self) -> &[f64] {
        &self.variance
    }

    pub fn terms(&self) -> &[(String, Vec<f64>)] {
        &self.terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::variance::FractionalError;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_file(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
        path
    }

    fn tables(dir: &tempfile::TempDir) -> (Table, Table) {
        // Theory and data share grid points inside the window, so resampled
        // values are exact at the surviving bins.
        let theory = write_file(
            dir,
            "theory.txt",
            "k dd Z2_d\n\
             0.05 100.0 -10.0\n\
             0.10 90.0 -8.0\n\
             0.20 70.0 -6.0\n\
             0.30 50.0 -4.0\n\
             0.40 30.0 -2.0\n",
        );
        let data = write_file(
            dir,
            "data.txt",
            "k/h Pk\n\
             0.05 101.0\n\
             0.10 92.0\n\
             0.20 73.0\n\
             0.30 54.0\n\
             0.40 35.0\n",
        );
        (Table::read(&theory).unwrap(), Table::read(&data).unwrap())
    }

    #[test]
    fn build_masks_regrids_and_precomputes() {
        let dir = tempfile::tempdir().unwrap();
        let (theory, data) = tables(&dir);

        let terms = [BasisTerm::rescaled("Z2_d", "c_mu0", -2.0)];
        let set = CurveSet::build(
            "realspace",
            &theory,
            &data,
            "dd",
            "Pk",
            &terms,
            0.10,
            0.30,
            &FractionalError(0.1),
        )
        .unwrap();

        assert_eq!(set.grid(), &[0.10, 0.20, 0.30]);
        // baseline = theory signal - data at the surviving bins
        for (got, want) in set.baseline().iter().zip([-2.0, -3.0, -4.0]) {
            assert!((got - want).abs() < 1e-9, "baseline {got} vs {want}");
        }
        // variance = (0.1 * data)^2
        for (got, want) in set.variance().iter().zip([84.64, 53.29, 29.16]) {
            assert!((got - want).abs() < 1e-9, "variance {got} vs {want}");
        }
        // basis term divided by its rescale factor
        let (name, values) = &set.terms()[0];
        assert_eq!(name, "c_mu0");
        for (got, want) in values.iter().zip([4.0, 3.0, 2.0]) {
            assert!((got - want).abs() < 1e-9, "term {got} vs {want}");
        }
    }

    #[test]
    fn empty_window_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (theory, data) = tables(&dir);

        let err = CurveSet::build(
            "realspace",
            &theory,
            &data,
            "dd",
            "Pk",
            &[],
            10.0,
            20.0,
            &FractionalError(0.1),
        )
        .unwrap_err();
        assert!(matches!(err, FitError::EmptyFitRegion { .. }));
    }

    #[test]
    fn data_outside_theory_support_propagates_out_of_domain() {
        let dir = tempfile::tempdir().unwrap();
        let theory = write_file(
            &dir,
            "theory.txt",
            "k dd\n0.10 90.0\n0.20 70.0\n0.30 50.0\n0.40 30.0\n",
        );
        let data = write_file(&dir, "data.txt", "k/h Pk\n0.05 101.0\n0.10 92.0\n");

        let err = CurveSet::build(
            "realspace",
            &Table::read(&theory).unwrap(),
            &Table::read(&data).unwrap(),
            "dd",
            "Pk",
            &[],
            0.0,
            1.0,
            &FractionalError(0.1),
        )
        .unwrap_err();
        assert!(matches!(err, FitError::OutOfDomain { .. }));
    }

    #[test]
    fn from_parts_checks_lengths() {
        let err = CurveSet::from_parts(
            "c_0",
            vec![0.0, 1.0],
            vec![1.0],
            vec![1.0, 1.0],
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, FitError::Configuration(_)));

        let err = CurveSet::from_parts("c_0", Vec::new(), Vec::new(), Vec::new(), Vec::new())
            .unwrap_err();
        assert!(matches!(err, FitError::Configuration(_)));
    }
}
