//! Narrow coupling to the hosting framework's data exchange.
//!
//! The sampler owns the free-parameter values and collects the likelihood
//! results; the modules see only these two capabilities. `MemoryBlock` is
//! the in-process implementation used in tests and by simple hosts.

use std::collections::HashMap;

use crate::error::FitError;

/// Read access to the sampler's current free-parameter values.
pub trait CoefficientSource {
    /// Current value of `name` under `section`, if the sampler provides one.
    fn get(&self, section: &str, name: &str) -> Option<f64>;
}

/// Write access for the scalar result of an evaluation.
pub trait ResultSink {
    fn publish(&mut self, key: &str, value: f64);
}

/// A likelihood module: built once, evaluated arbitrarily many times.
pub trait FitModule {
    /// Fixed key under which the log-likelihood is published.
    fn like_key(&self) -> &'static str;

    /// Score the current coefficient values and publish the result.
    fn evaluate(
        &self,
        params: &dyn CoefficientSource,
        sink: &mut dyn ResultSink,
    ) -> Result<f64, FitError>;
}

/// Fetch a coefficient the module cannot do without.
pub fn require(
    params: &dyn CoefficientSource,
    section: &str,
    name: &str,
) -> Result<f64, FitError> {
    params
        .get(section, name)
        .ok_or_else(|| FitError::MissingCoefficient(format!("{section}/{name}")))
}

/// In-memory datablock implementing both capabilities.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlock {
    values: HashMap<String, HashMap<String, f64>>,
    results: HashMap<String, f64>,
}

impl MemoryBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, section: &str, name: &str, value: f64) {
        self.values
            .entry(section.to_string())
            .or_default()
            .insert(name.to_string(), value);
    }

    /// Last value published under `key`, if any.
    pub fn result(&self, key: &str) -> Option<f64> {
        self.results.get(key).copied()
    }
}

impl CoefficientSource for MemoryBlock {
    fn get(&self, section: &str, name: &str) -> Option<f64> {
        self.values.get(section).and_then(|s| s.get(name)).copied()
    }
}

impl ResultSink for MemoryBlock {
    fn publish(&mut self, key: &str, value: f64) {
        self.results.insert(key.to_string(), value);
    }
}
