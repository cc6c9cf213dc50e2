//! Natural cubic spline interpolation for theory-curve regridding.
//!
//! Theory tables are tabulated on their own wavenumber grid; the likelihood
//! needs them at the measured bins. We fit one spline per theory column and
//! evaluate it at each measured wavenumber.
//!
//! A query outside the tabulated support is an error, never an
//! extrapolation: extrapolated theory values would silently fabricate
//! physics, so the out-of-domain failure is load-bearing.

use nalgebra::{DMatrix, DVector};

use crate::error::FitError;

/// Minimum number of nodes for a stable cubic fit.
pub const MIN_SPLINE_POINTS: usize = 4;

/// A natural cubic spline through `(x, y)` nodes.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivative of the spline at each node.
    m: Vec<f64>,
}

impl CubicSpline {
    /// Fit a spline through the given nodes.
    ///
    /// `x` must be strictly increasing with at least [`MIN_SPLINE_POINTS`]
    /// entries; all inputs must be finite.
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self, FitError> {
        if x.len() != y.len() {
            return Err(FitError::Configuration(format!(
                "spline grids must match: {} wavenumbers vs {} values",
                x.len(),
                y.len()
            )));
        }
        if x.len() < MIN_SPLINE_POINTS {
            return Err(FitError::InsufficientData {
                needed: MIN_SPLINE_POINTS,
                got: x.len(),
            });
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(FitError::Configuration(
                "spline wavenumbers must be strictly increasing".to_string(),
            ));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(FitError::Configuration(
                "spline inputs must be finite".to_string(),
            ));
        }

        let m = second_derivatives(x, y)?;
        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            m,
        })
    }

    /// Closed interval on which the spline is defined.
    pub fn support(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    /// Evaluate the spline at `xq`.
    pub fn value(&self, xq: f64) -> Result<f64, FitError> {
        let n = self.x.len();
        let (min, max) = self.support();
        if !(min..=max).contains(&xq) {
            return Err(FitError::OutOfDomain {
                target: xq,
                min,
                max,
            });
        }

        // Segment lookup; the clamp lands xq == max in the last segment.
        let idx = self.x.partition_point(|v| *v <= xq);
        let i = idx.clamp(1, n - 1) - 1;

        let h = self.x[i + 1] - self.x[i];
        let a = (self.x[i + 1] - xq) / h;
        let b = 1.0 - a;
        Ok(a * self.y[i]
            + b * self.y[i + 1]
            + ((a * a * a - a) * self.m[i] + (b * b * b - b) * self.m[i + 1]) * h * h / 6.0)
    }
}

/// Interior second derivatives of the natural spline.
///
/// The interior nodes satisfy a tridiagonal continuity system; the natural
/// boundary pins zero curvature at both ends.
fn second_derivatives(x: &[f64], y: &[f64]) -> Result<Vec<f64>, FitError> {
    let n = x.len();
    let dim = n - 2;
    let mut a = DMatrix::<f64>::zeros(dim, dim);
    let mut rhs = DVector::<f64>::zeros(dim);

    for row in 0..dim {
        let i = row + 1;
        let h_lo = x[i] - x[i - 1];
        let h_hi = x[i + 1] - x[i];
        if row > 0 {
            a[(row, row - 1)] = h_lo;
        }
        a[(row, row)] = 2.0 * (h_lo + h_hi);
        if row + 1 < dim {
            a[(row, row + 1)] = h_hi;
        }
        rhs[row] = 6.0 * ((y[i + 1] - y[i]) / h_hi - (y[i] - y[i - 1]) / h_lo);
    }

    // The system is strictly diagonally dominant for any increasing grid, so
    // a singular solve means the inputs slipped past validation.
    let interior = a.lu().solve(&rhs).ok_or_else(|| {
        FitError::Configuration("singular spline system".to_string())
    })?;

    let mut m = vec![0.0; n];
    for row in 0..dim {
        m[row + 1] = interior[row];
    }
    Ok(m)
}

/// Resample `values` tabulated on `grid` onto each point of `target`.
pub fn resample(grid: &[f64], values: &[f64], target: &[f64]) -> Result<Vec<f64>, FitError> {
    let spline = CubicSpline::fit(grid, values)?;
    target.iter().map(|&k| spline.value(k)).collect()
}
