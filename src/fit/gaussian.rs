//! Linear counterterm combination and Gaussian accumulation.

use std::collections::HashMap;

use crate::error::FitError;
use crate::fit::curve_set::CurveSet;

/// Current counterterm values, assembled fresh for every evaluation.
pub type Coefficients = HashMap<String, f64>;

/// Gaussian log-likelihood of one curve set under the given coefficients.
///
/// `total[i] = baseline[i] + sum_term coeff * term[i]`, then the result is
/// `sum_i -total[i]^2 / (2 * variance[i])`.
///
/// Coefficients with no matching basis term are ignored: a real-space set
/// legitimately consumes a strict subset of the sampler's counterterm
/// vector. A basis term with no coefficient is an error.
pub fn log_likelihood(set: &CurveSet, coefficients: &Coefficients) -> Result<f64, FitError> {
    let mut total = set.baseline().to_vec();
    for (name, values) in set.terms() {
        let coeff = *coefficients
            .get(name)
            .ok_or_else(|| FitError::MissingCoefficient(name.clone()))?;
        for (t, v) in total.iter_mut().zip(values) {
            *t += coeff * v;
        }
    }

    Ok(total
        .iter()
        .zip(set.variance())
        .map(|(&r, &var)| -r * r / (2.0 * var))
        .sum())
}
