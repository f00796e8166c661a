//! Batch drift detection
//!
//! Compares a fixed reference sample with an incoming sample. Every comparison
//! runs the common and specific validators before the method's computation:
//! - Kolmogorov-Smirnov test (continuous features)
//! - Chi-square test (categorical features)
//! - Kullback-Leibler divergence over shared histogram bins
//! - Population Stability Index

mod detector;
mod distance;
mod statistical_test;
pub mod stats;
mod types;
pub mod validation;

pub use detector::{BatchDriftDetector, BatchMethod, CoreComputation};
pub use distance::{KullbackLeibler, PopulationStabilityIndex};
pub use statistical_test::{ChiSquareTest, KolmogorovSmirnovTest, KS_EXACT_MAX_CELLS};
pub use types::{
    Alternative, Capabilities, CompareOptions, ComparisonResult, DataType, DistanceResult,
    KsMethod, KsOptions, StatisticalResult, StatisticalType,
};
