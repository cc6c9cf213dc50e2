//! Redshift-space multipole fit.
//!
//! Three curve sets (monopole, quadrupole, hexadecapole), each carrying the
//! four mu-moment counterterm curves. The sampler supplies `c_mu0`,
//! `c_mu2`, and `c_mu4`; `c_mu6` is fixed by those and the growth rate:
//!
//! `c_mu6 = f^3 c_mu0 - f^2 c_mu2 + f c_mu4`
//!
//! An optional real-space curve set anchors the fit when `use_realspace`
//! is configured.

use log::info;

use crate::domain::{counterterm_rescale, BasisTerm, Multipole, RsdFitConfig};
use crate::error::FitError;
use crate::fit::{log_likelihood, Coefficients, CurveSet, FractionalError};
use crate::io::Table;
use crate::like::block::{require, CoefficientSource, FitModule, ResultSink};
use crate::like::{realspace_set, C_MU0, C_MU2, C_MU4, C_MU6};

/// Result key published by [`RsdFit`].
pub const RSD_LIKE_KEY: &str = "RSDFIT_LIKE";

pub struct RsdFit {
    namespace: String,
    /// Growth rate fixing the `c_mu6` coefficient.
    f: f64,
    multipoles: Vec<CurveSet>,
    realspace: Option<CurveSet>,
}

impl RsdFit {
    pub fn new(config: &RsdFitConfig) -> Result<Self, FitError> {
        config.validate()?;

        let rescales = [
            (C_MU0, counterterm_rescale(config.d_linear, config.d_mu0)?),
            (C_MU2, counterterm_rescale(config.d_linear, config.d_mu2)?),
            (C_MU4, counterterm_rescale(config.d_linear, config.d_mu4)?),
            (C_MU6, counterterm_rescale(config.d_linear, config.d_mu6)?),
        ];

        let theory = Table::read(&config.multipole_theory)?;
        let data = Table::read(&config.multipole_data)?;
        let error_model = FractionalError(config.multipole_error);

        let mut multipoles = Vec::with_capacity(Multipole::ALL.len());
        for multipole in Multipole::ALL {
            let tag = multipole.tag();
            let terms: Vec<BasisTerm> = rescales
                .iter()
                .map(|(name, rescale)| {
                    let moment = name.trim_start_matches("c_");
                    BasisTerm::rescaled(format!("{tag}_{moment}"), *name, *rescale)
                })
                .collect();

            multipoles.push(CurveSet::build(
                tag,
                &theory,
                &data,
                tag,
                tag,
                &terms,
                config.fit_kmin,
                config.fit_kmax,
                &error_model,
            )?);
        }

        let realspace = if config.use_realspace {
            // validate() guarantees the anchor inputs are present.
            let (Some(theory_file), Some(data_file), Some(d_zdelta)) = (
                config.realspace_theory.as_ref(),
                config.realspace_data.as_ref(),
                config.d_zdelta,
            ) else {
                return Err(FitError::Configuration(
                    "use_realspace requires realspace_theory, realspace_data, and d_zdelta"
                        .to_string(),
                ));
            };
            info!("anchoring multipole fit with the real-space spectrum");
            Some(realspace_set(
                "realspace anchor",
                theory_file,
                data_file,
                config.fit_kmin,
                config.fit_kmax,
                config.realspace_error,
                counterterm_rescale(config.d_linear, d_zdelta)?,
            )?)
        } else {
            None
        };

        info!(
            "rsd fit ready: {} bins per multipole in [{}, {}]",
            multipoles[0].len(),
            config.fit_kmin,
            config.fit_kmax
        );

        Ok(Self {
            namespace: config.namespace.clone(),
            f: config.f,
            multipoles,
            realspace,
        })
    }

    /// The mu6 coefficient is fixed by the lower moments and the growth rate.
    fn derive_mu6(&self, mu0: f64, mu2: f64, mu4: f64) -> f64 {
        self.f * self.f * self.f * mu0 - self.f * self.f * mu2 + self.f * mu4
    }
}

impl FitModule for RsdFit {
    fn like_key(&self) -> &'static str {
        RSD_LIKE_KEY
    }

    fn evaluate(
        &self,
        params: &dyn CoefficientSource,
        sink: &mut dyn ResultSink,
    ) -> Result<f64, FitError> {
        let mu0 = require(params, &self.namespace, C_MU0)?;
        let mu2 = require(params, &self.namespace, C_MU2)?;
        let mu4 = require(params, &self.namespace, C_MU4)?;
        let mu6 = self.derive_mu6(mu0, mu2, mu4);

        let coefficients = Coefficients::from([
            (C_MU0.to_string(), mu0),
            (C_MU2.to_string(), mu2),
            (C_MU4.to_string(), mu4),
            (C_MU6.to_string(), mu6),
        ]);

        let mut like = 0.0;
        for set in &self.multipoles {
            like += log_likelihood(set, &coefficients)?;
        }
        if let Some(anchor) = &self.realspace {
            like += log_likelihood(anchor, &coefficients)?;
        }

        sink.publish(RSD_LIKE_KEY, like);
        Ok(like)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::like::block::MemoryBlock;
    use approx::assert_relative_eq;
    use std::io::Write;
    use std::path::PathBuf;

    const NS: &str = "rsd_counterterms";

    fn write_file(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
        path
    }

    /// Theory and data share a four-point grid entirely inside the window.
    /// Multipole signals sit a constant offset above the data; every
    /// mu-moment column is constant so coefficient effects are uniform too.
    fn write_multipole_tables(dir: &tempfile::TempDir) -> (PathBuf, PathBuf) {
        let mut theory = String::from(
            "k P0 P2 P4 \
             P0_mu0 P0_mu2 P0_mu4 P0_mu6 \
             P2_mu0 P2_mu2 P2_mu4 P2_mu6 \
             P4_mu0 P4_mu2 P4_mu4 P4_mu6\n",
        );
        let mut data = String::from("k/h P0 P2 P4\n");
        for k in ["0.10", "0.15", "0.20", "0.25"] {
            // Raw mu columns are -2 so that dividing by the rescale -1
            // (D_linear = 1, every D_mu = 2) leaves +2 per bin.
            theory.push_str(&format!(
                "{k} 11.0 22.0 44.0 \
                 -2.0 -2.0 -2.0 -2.0 \
                 -2.0 -2.0 -2.0 -2.0 \
                 -2.0 -2.0 -2.0 -2.0\n"
            ));
            data.push_str(&format!("{k} 10.0 20.0 40.0\n"));
        }
        (
            write_file(dir, "theory.txt", &theory),
            write_file(dir, "data.txt", &data),
        )
    }

    fn config(dir: &tempfile::TempDir) -> RsdFitConfig {
        let (theory, data) = write_multipole_tables(dir);
        RsdFitConfig {
            fit_kmin: 0.10,
            fit_kmax: 0.25,
            f: 1.0,
            multipole_theory: theory,
            multipole_data: data,
            d_linear: 1.0,
            d_mu0: 2.0,
            d_mu2: 2.0,
            d_mu4: 2.0,
            d_mu6: 2.0,
            multipole_error: 0.20,
            use_realspace: false,
            realspace_theory: None,
            realspace_data: None,
            realspace_error: 0.05,
            d_zdelta: None,
            namespace: NS.to_string(),
        }
    }

    fn set_coefficients(block: &mut MemoryBlock, mu0: f64, mu2: f64, mu4: f64) {
        block.set(NS, C_MU0, mu0);
        block.set(NS, C_MU2, mu2);
        block.set(NS, C_MU4, mu4);
    }

    #[test]
    fn mu6_at_unit_growth_rate_is_mu0_minus_mu2_plus_mu4() {
        let dir = tempfile::tempdir().unwrap();
        let module = RsdFit::new(&config(&dir)).unwrap();
        assert_relative_eq!(module.derive_mu6(1.0, 2.0, 3.0), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn mu6_follows_the_growth_rate_powers() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(&dir);
        cfg.f = 0.5;
        let module = RsdFit::new(&cfg).unwrap();
        // 0.125*1 - 0.25*2 + 0.5*3
        assert_relative_eq!(module.derive_mu6(1.0, 2.0, 3.0), 1.125, epsilon = 1e-12);
    }

    #[test]
    fn zero_coefficients_score_the_baselines() {
        let dir = tempfile::tempdir().unwrap();
        let module = RsdFit::new(&config(&dir)).unwrap();
        assert_eq!(module.like_key(), RSD_LIKE_KEY);

        let mut block = MemoryBlock::new();
        set_coefficients(&mut block, 0.0, 0.0, 0.0);

        // Per bin: P0 gives -1/(2*4), P2 gives -4/(2*16), P4 gives
        // -16/(2*64); four bins of each multipole total -1.5.
        let mut sink = MemoryBlock::new();
        let like = module.evaluate(&block, &mut sink).unwrap();
        assert_relative_eq!(like, -1.5, epsilon = 1e-9);
        assert_relative_eq!(sink.result(RSD_LIKE_KEY).unwrap(), -1.5, epsilon = 1e-9);
    }

    #[test]
    fn coefficients_shift_every_multipole() {
        let dir = tempfile::tempdir().unwrap();
        let module = RsdFit::new(&config(&dir)).unwrap();

        let mut block = MemoryBlock::new();
        // f = 1, so mu6 = 0.25 - 0.5 + 0.5 = 0.25; the four unit-rescaled
        // basis curves are +2 each, so every multipole residual shifts by
        // 2*(0.25 + 0.5 + 0.5 + 0.25) = 3.
        set_coefficients(&mut block, 0.25, 0.5, 0.5);

        let mut sink = MemoryBlock::new();
        let like = module.evaluate(&block, &mut sink).unwrap();

        // Residuals become 1+3=4 (P0, var 4), 2+3=5 (P2, var 16),
        // 4+3=7 (P4, var 64); four bins each.
        let expected = 4.0 * (-(16.0) / 8.0 - 25.0 / 32.0 - 49.0 / 128.0);
        assert_relative_eq!(like, expected, epsilon = 1e-9);
    }

    #[test]
    fn realspace_anchor_is_added_when_configured() {
        let dir = tempfile::tempdir().unwrap();

        let anchor_theory = write_file(
            &dir,
            "anchor_theory.txt",
            "k dd Z2_d\n\
             0.10 10.0 -1.0\n\
             0.15 10.0 -1.0\n\
             0.20 10.0 -1.0\n\
             0.25 10.0 -1.0\n",
        );
        let anchor_data = write_file(
            &dir,
            "anchor_data.txt",
            "k/h Pk\n0.10 10.0\n0.15 10.0\n0.20 10.0\n0.25 10.0\n",
        );

        let mut cfg = config(&dir);
        cfg.use_realspace = true;
        cfg.realspace_theory = Some(anchor_theory);
        cfg.realspace_data = Some(anchor_data);
        cfg.realspace_error = 0.1;
        cfg.d_zdelta = Some(2.0);
        let module = RsdFit::new(&cfg).unwrap();

        let mut block = MemoryBlock::new();
        // Zero coefficients: the anchor baseline also vanishes, so the total
        // matches the unanchored case.
        set_coefficients(&mut block, 0.0, 0.0, 0.0);
        let mut sink = MemoryBlock::new();
        assert_relative_eq!(
            module.evaluate(&block, &mut sink).unwrap(),
            -1.5,
            epsilon = 1e-9
        );

        // A nonzero c_mu0 reaches the anchor through its single Z2_d term:
        // anchor residual 2 per bin at unit variance adds 4 * (-2).
        set_coefficients(&mut block, 2.0, 2.0, 4.0);
        // mu6 = 2 - 2 + 4 = 4; multipole shift 2*(2+2+4+4) = 24.
        let multipoles = 4.0 * (-(25.0 * 25.0) / 8.0 - (26.0 * 26.0) / 32.0
            - (28.0 * 28.0) / 128.0);
        let anchor = 4.0 * -2.0;
        assert_relative_eq!(
            module.evaluate(&block, &mut sink).unwrap(),
            multipoles + anchor,
            epsilon = 1e-9
        );
    }

    #[test]
    fn anchor_flag_without_files_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(&dir);
        cfg.use_realspace = true;

        assert!(matches!(
            RsdFit::new(&cfg),
            Err(FitError::Configuration(_))
        ));
    }

    #[test]
    fn missing_mu_coefficient_aborts_the_evaluation() {
        let dir = tempfile::tempdir().unwrap();
        let module = RsdFit::new(&config(&dir)).unwrap();

        let mut block = MemoryBlock::new();
        block.set(NS, C_MU0, 1.0);
        block.set(NS, C_MU2, 1.0);

        let mut sink = MemoryBlock::new();
        let err = module.evaluate(&block, &mut sink).unwrap_err();
        assert_eq!(
            err,
            FitError::MissingCoefficient(format!("{NS}/{C_MU4}"))
        );
    }
}
