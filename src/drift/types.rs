//! Result, capability and option types for batch drift detection

use serde::{Deserialize, Serialize};

/// Kind of values a detector accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    /// Continuous real values
    Numerical,
    /// Integral category codes
    Categorical,
}

/// Dimensionality a detector accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatisticalType {
    /// Exactly one feature column
    Univariate,
    /// One or more feature columns
    Multivariate,
}

/// Capability tags declared by a detector and checked against incoming data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub data_type: DataType,
    pub statistical_type: StatisticalType,
}

impl Capabilities {
    pub const fn new(data_type: DataType, statistical_type: StatisticalType) -> Self {
        Self {
            data_type,
            statistical_type,
        }
    }
}

/// Outcome of a two-sample statistical test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticalResult {
    pub statistic: f64,
    pub p_value: f64,
}

/// Outcome of a distance-based comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceResult {
    pub distance: f64,
}

/// Result of a batch comparison, tagged by the shape of the method's output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ComparisonResult {
    Statistical(StatisticalResult),
    Distance(DistanceResult),
}

impl ComparisonResult {
    /// Statistical payload, if this came from a hypothesis test
    pub fn as_statistical(&self) -> Option<&StatisticalResult> {
        match self {
            ComparisonResult::Statistical(r) => Some(r),
            ComparisonResult::Distance(_) => None,
        }
    }

    /// Distance payload, if this came from a distance method
    pub fn as_distance(&self) -> Option<&DistanceResult> {
        match self {
            ComparisonResult::Distance(r) => Some(r),
            ComparisonResult::Statistical(_) => None,
        }
    }

    /// Headline number: the test statistic or the distance
    pub fn score(&self) -> f64 {
        match self {
            ComparisonResult::Statistical(r) => r.statistic,
            ComparisonResult::Distance(r) => r.distance,
        }
    }
}

/// Alternative hypothesis for the KS test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alternative {
    #[default]
    TwoSided,
    /// Reference CDF lies below the incoming CDF somewhere
    Less,
    /// Reference CDF lies above the incoming CDF somewhere
    Greater,
}

/// How the KS p-value is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KsMethod {
    /// Exact null distribution for small samples, asymptotic otherwise
    #[default]
    Auto,
    Exact,
    Asymptotic,
}

/// Options recognized by the KS test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KsOptions {
    pub alternative: Alternative,
    pub method: KsMethod,
}

/// Per-call comparison options. Each method reads only the fields it recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompareOptions {
    /// Used by the KS test
    pub ks: KsOptions,
    /// Histogram resolution override for binned distance methods
    pub num_bins: Option<usize>,
}

impl CompareOptions {
    pub fn with_alternative(mut self, alternative: Alternative) -> Self {
        self.ks.alternative = alternative;
        self
    }

    pub fn with_ks_method(mut self, method: KsMethod) -> Self {
        self.ks.method = method;
        self
    }

    pub fn with_bins(mut self, num_bins: usize) -> Self {
        self.num_bins = Some(num_bins);
        self
    }
}
