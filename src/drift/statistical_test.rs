//! Two-sample hypothesis tests

use crate::drift::detector::CoreComputation;
use crate::drift::stats;
use crate::drift::types::{
    Alternative, Capabilities, CompareOptions, ComparisonResult, DataType, KsMethod,
    StatisticalResult, StatisticalType,
};
use crate::error::Result;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Largest `n_ref * n_inc` for which `KsMethod::Auto` uses the exact distribution
pub const KS_EXACT_MAX_CELLS: usize = 1_000_000;

/// Kolmogorov-Smirnov two-sample test for continuous univariate data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KolmogorovSmirnovTest;

impl KolmogorovSmirnovTest {
    pub fn new() -> Self {
        Self
    }

    /// Run the test on raw samples
    pub fn test(&self, reference: &[f64], incoming: &[f64], alternative: Alternative, method: KsMethod) -> StatisticalResult {
        let ref_sorted = stats::sorted(reference.iter().copied());
        let inc_sorted = stats::sorted(incoming.iter().copied());
        let (d_plus, d_minus) = stats::ecdf_differences(&ref_sorted, &inc_sorted);

        let statistic = match alternative {
            Alternative::TwoSided => d_plus.max(d_minus),
            Alternative::Greater => d_plus,
            Alternative::Less => d_minus,
        };

        let (m, n) = (ref_sorted.len(), inc_sorted.len());
        let exact = match method {
            KsMethod::Exact => true,
            KsMethod::Asymptotic => false,
            KsMethod::Auto => m.saturating_mul(n) <= KS_EXACT_MAX_CELLS,
        };

        let p_value = if exact {
            stats::ks_exact_sf(m, n, statistic, alternative)
        } else {
            stats::ks_asymptotic_sf(m, n, statistic, alternative)
        };

        StatisticalResult { statistic, p_value }
    }
}

impl CoreComputation for KolmogorovSmirnovTest {
    fn name(&self) -> &'static str {
        "Kolmogorov-Smirnov"
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
        let result = self.test(
            &reference.column(0).to_vec(),
            &incoming.column(0).to_vec(),
            options.ks.alternative,
            options.ks.method,
        );
        Ok(ComparisonResult::Statistical(result))
    }
}

/// Chi-square test of homogeneity for categorical univariate data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChiSquareTest;

impl ChiSquareTest {
    pub fn new() -> Self {
        Self
    }

    /// Run the test on category codes
    pub fn test(&self, reference: &[i64], incoming: &[i64]) -> StatisticalResult {
        let mut table: BTreeMap<i64, (f64, f64)> = BTreeMap::new();
        for &c in reference {
            table.entry(c).or_insert((0.0, 0.0)).0 += 1.0;
        }
        for &c in incoming {
            table.entry(c).or_insert((0.0, 0.0)).1 += 1.0;
        }

        let n_ref = reference.len() as f64;
        let n_inc = incoming.len() as f64;
        let total = n_ref + n_inc;

        let statistic: f64 = table
            .values()
            .map(|&(obs_ref, obs_inc)| {
                let col_total = obs_ref + obs_inc;
                let exp_ref = col_total * n_ref / total;
                let exp_inc = col_total * n_inc / total;
                (obs_ref - exp_ref).powi(2) / exp_ref + (obs_inc - exp_inc).powi(2) / exp_inc
            })
            .sum();

        let df = table.len().saturating_sub(1);
        StatisticalResult {
            statistic,
            p_value: stats::chi_square_sf(statistic, df),
        }
    }
}

impl CoreComputation for ChiSquareTest {
    fn name(&self) -> &'static str {
        "Chi-Square"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new(DataType::Categorical, StatisticalType::Univariate)
    }

    fn core_computation(
        &self,
        reference: ArrayView2<f64>,
        incoming: ArrayView2<f64>,
        _options: &CompareOptions,
    ) -> Result<ComparisonResult> {
        // integrality was checked by the categorical validator
        let to_codes = |v: ArrayView2<f64>| -> Vec<i64> { v.column(0).iter().map(|&x| x as i64).collect() };
        let result = self.test(&to_codes(reference), &to_codes(incoming));
        Ok(ComparisonResult::Statistical(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_ks_identical_samples() {
        let data: Vec<f64> = (0..100).map(f64::from).collect();
        let result = KolmogorovSmirnovTest::new().test(&data, &data, Alternative::TwoSided, KsMethod::Auto);
        assert_abs_diff_eq!(result.statistic, 0.0);
        assert_abs_diff_eq!(result.p_value, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ks_disjoint_support() {
        let reference: Vec<f64> = (0..30).map(f64::from).collect();
        let incoming: Vec<f64> = (100..130).map(f64::from).collect();
        let ks = KolmogorovSmirnovTest::new();

        let exact = ks.test(&reference, &incoming, Alternative::TwoSided, KsMethod::Exact);
        assert_abs_diff_eq!(exact.statistic, 1.0);
        assert!(exact.p_value < 1e-10);

        let asymp = ks.test(&reference, &incoming, Alternative::TwoSided, KsMethod::Asymptotic);
        assert_abs_diff_eq!(asymp.statistic, 1.0);
        assert!(asymp.p_value < 1e-6);
    }

    #[test]
    fn test_ks_one_sided_direction() {
        // reference sits to the left, so its CDF is above the incoming CDF
        let reference: Vec<f64> = (0..20).map(f64::from).collect();
        let incoming: Vec<f64> = (10..30).map(f64::from).collect();
        let ks = KolmogorovSmirnovTest::new();

        let greater = ks.test(&reference, &incoming, Alternative::Greater, KsMethod::Exact);
        let less = ks.test(&reference, &incoming, Alternative::Less, KsMethod::Exact);
        assert_abs_diff_eq!(greater.statistic, 0.5);
        assert_abs_diff_eq!(less.statistic, 0.0);
        assert!(greater.p_value < 0.05);
        assert_abs_diff_eq!(less.p_value, 1.0);
    }

    #[test]
    fn test_chi_square_same_proportions() {
        let reference = vec![0, 0, 1, 1, 2, 2];
        let incoming = vec![0, 1, 2, 0, 1, 2];
        let result = ChiSquareTest::new().test(&reference, &incoming);
        assert_abs_diff_eq!(result.statistic, 0.0);
        assert_abs_diff_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_chi_square_detects_shift() {
        let reference: Vec<i64> = (0..200).map(|i| i % 2).collect();
        let incoming: Vec<i64> = (0..200).map(|i| if i % 10 == 0 { 0 } else { 1 }).collect();
        let result = ChiSquareTest::new().test(&reference, &incoming);
        assert!(result.statistic > 10.0);
        assert!(result.p_value < 0.001);
    }

    #[test]
    fn test_capabilities() {
        assert_eq!(KolmogorovSmirnovTest.capabilities().data_type, DataType::Numerical);
        assert_eq!(ChiSquareTest.capabilities().data_type, DataType::Categorical);
    }
}
