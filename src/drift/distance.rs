//! Distance-based comparisons between binned distributions

use crate::drift::detector::CoreComputation;
use crate::drift::stats;
use crate::drift::types::{
    Capabilities, CompareOptions, ComparisonResult, DataType, DistanceResult, StatisticalType,
};
use crate::error::{DriftError, Result};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

/// Kullback-Leibler divergence of the incoming histogram from the reference histogram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KullbackLeibler {
    /// Number of equal-width bins spanning the combined range
    num_bins: usize,
}

impl KullbackLeibler {
    pub fn new(num_bins: usize) -> Self {
        Self {
            num_bins: num_bins.max(1),
        }
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// Probability mass estimates of both samples over shared bin edges
    pub fn probabilities(&self, reference: &[f64], incoming: &[f64], num_bins: usize) -> (Vec<f64>, Vec<f64>) {
        let (min_val, max_val) = reference
            .iter()
            .chain(incoming.iter())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        (
            stats::histogram(reference, min_val, max_val, num_bins),
            stats::histogram(incoming, min_val, max_val, num_bins),
        )
    }

    /// Divergence between two probability mass arrays, `sum(rel_entr(p, q))`
    pub fn divergence(p: &[f64], q: &[f64]) -> Result<f64> {
        if p.len() != q.len() {
            return Err(DriftError::Validation(format!(
                "probability arrays differ in length: {} vs {}",
                p.len(),
                q.len()
            )));
        }
        Ok(p.iter().zip(q.iter()).map(|(&pi, &qi)| stats::rel_entr(pi, qi)).sum())
    }

    /// Distance between raw samples
    pub fn distance(&self, reference: &[f64], incoming: &[f64], num_bins: usize) -> Result<DistanceResult> {
        let (ref_probs, inc_probs) = self.probabilities(reference, incoming, num_bins);
        let distance = Self::divergence(&inc_probs, &ref_probs)?;
        Ok(DistanceResult { distance })
    }
}

impl Default for KullbackLeibler {
    fn default() -> Self {
        Self::new(10)
    }
}

impl CoreComputation for KullbackLeibler {
    fn name(&self) -> &'static str {
        "Kullback-Leibler"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new(DataType::Numerical, StatisticalType::Univariate)
    }

    fn core_computation(
        &self,
        reference: ArrayView2<f64>,
        incoming: ArrayView2<f64>,
        options: &CompareOptions,
    ) -> Result<ComparisonResult> {
        let bins = options.num_bins.unwrap_or(self.num_bins).max(1);
        let result = self.distance(&reference.column(0).to_vec(), &incoming.column(0).to_vec(), bins)?;
        Ok(ComparisonResult::Distance(result))
    }
}

/// Population Stability Index over reference quantile bins
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationStabilityIndex {
    num_bins: usize,
    /// Floor applied to empty bins so the log ratio stays finite
    epsilon: f64,
}

impl PopulationStabilityIndex {
    pub fn new(num_bins: usize) -> Self {
        Self {
            num_bins: num_bins.max(2),
            epsilon: 1e-4,
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon.max(f64::MIN_POSITIVE);
        self
    }

    pub fn distance(&self, reference: &[f64], incoming: &[f64], num_bins: usize) -> DistanceResult {
        let ref_sorted = stats::sorted(reference.iter().copied());
        let edges = stats::quantile_edges(&ref_sorted, num_bins);

        let ref_props = stats::bin_proportions(reference, &edges);
        let inc_props = stats::bin_proportions(incoming, &edges);

        let distance = ref_props
            .iter()
            .zip(inc_props.iter())
            .map(|(&r, &i)| {
                let r = r.max(self.epsilon);
                let i = i.max(self.epsilon);
                (i - r) * (i / r).ln()
            })
            .sum();

        DistanceResult { distance }
    }
}

impl Default for PopulationStabilityIndex {
    fn default() -> Self {
        Self::new(10)
    }
}

impl CoreComputation for PopulationStabilityIndex {
    fn name(&self) -> &'static str {
        "PSI"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new(DataType::Numerical, StatisticalType::Univariate)
    }

    fn core_computation(
        &self,
        reference: ArrayView2<f64>,
        incoming: ArrayView2<f64>,
        options: &CompareOptions,
    ) -> Result<ComparisonResult> {
        let bins = options.num_bins.unwrap_or(self.num_bins).max(2);
        let result = self.distance(&reference.column(0).to_vec(), &incoming.column(0).to_vec(), bins);
        Ok(ComparisonResult::Distance(result))
    }
}
