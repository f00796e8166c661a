//! Batch two-sample drift detector

use crate::callbacks::{CallbackList, DriftEvent};
use crate::drift::distance::{KullbackLeibler, PopulationStabilityIndex};
use crate::drift::statistical_test::{ChiSquareTest, KolmogorovSmirnovTest};
use crate::drift::types::{Capabilities, CompareOptions, ComparisonResult};
use crate::drift::validation::{common_checks, specific_checks};
use crate::error::{DriftError, Result};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Computation every batch method provides. Validation happens before
/// `core_computation` is called, so implementations may assume clean input.
pub trait CoreComputation {
    /// Human-readable method name
    fn name(&self) -> &'static str;

    /// Data and statistical type this method accepts
    fn capabilities(&self) -> Capabilities;

    fn core_computation(
        &self,
        reference: ArrayView2<f64>,
        incoming: ArrayView2<f64>,
        options: &CompareOptions,
    ) -> Result<ComparisonResult>;
}

/// Batch comparison methods
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BatchMethod {
    KolmogorovSmirnov(KolmogorovSmirnovTest),
    ChiSquare(ChiSquareTest),
    KullbackLeibler(KullbackLeibler),
    PopulationStabilityIndex(PopulationStabilityIndex),
}

impl CoreComputation for BatchMethod {
    fn name(&self) -> &'static str {
        match self {
            BatchMethod::KolmogorovSmirnov(m) => m.name(),
            BatchMethod::ChiSquare(m) => m.name(),
            BatchMethod::KullbackLeibler(m) => m.name(),
            BatchMethod::PopulationStabilityIndex(m) => m.name(),
        }
    }

    fn capabilities(&self) -> Capabilities {
        match self {
            BatchMethod::KolmogorovSmirnov(m) => m.capabilities(),
            BatchMethod::ChiSquare(m) => m.capabilities(),
            BatchMethod::KullbackLeibler(m) => m.capabilities(),
            BatchMethod::PopulationStabilityIndex(m) => m.capabilities(),
        }
    }

    fn core_computation(
        &self,
        reference: ArrayView2<f64>,
        incoming: ArrayView2<f64>,
        options: &CompareOptions,
    ) -> Result<ComparisonResult> {
        match self {
            BatchMethod::KolmogorovSmirnov(m) => m.core_computation(reference, incoming, options),
            BatchMethod::ChiSquare(m) => m.core_computation(reference, incoming, options),
            BatchMethod::KullbackLeibler(m) => m.core_computation(reference, incoming, options),
            BatchMethod::PopulationStabilityIndex(m) => {
                m.core_computation(reference, incoming, options)
            }
        }
    }
}

/// Two-sample drift detector: fit a reference window, then compare batches against it
#[derive(Debug)]
pub struct BatchDriftDetector {
    method: BatchMethod,
    reference: Option<Array2<f64>>,
    options: CompareOptions,
    callbacks: CallbackList,
}

impl BatchDriftDetector {
    pub fn new(method: BatchMethod) -> Self {
        Self {
            method,
            reference: None,
            options: CompareOptions::default(),
            callbacks: CallbackList::new(),
        }
    }

    pub fn kolmogorov_smirnov() -> Self {
        Self::new(BatchMethod::KolmogorovSmirnov(KolmogorovSmirnovTest))
    }

    pub fn chi_square() -> Self {
        Self::new(BatchMethod::ChiSquare(ChiSquareTest))
    }

    pub fn kullback_leibler(num_bins: usize) -> Self {
        Self::new(BatchMethod::KullbackLeibler(KullbackLeibler::new(num_bins)))
    }

    pub fn population_stability_index(num_bins: usize) -> Self {
        Self::new(BatchMethod::PopulationStabilityIndex(PopulationStabilityIndex::new(num_bins)))
    }

    /// Options used by `compare`
    pub fn with_options(mut self, options: CompareOptions) -> Self {
        self.options = options;
        self
    }

    /// Register a callback fired after each completed comparison
    pub fn on_event<F>(&mut self, callback: F)
    where
        F: Fn(&DriftEvent) + Send + Sync + 'static,
    {
        self.callbacks.register(callback);
    }

    pub fn method(&self) -> &BatchMethod {
        &self.method
    }

    pub fn method_name(&self) -> &'static str {
        self.method.name()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.method.capabilities()
    }

    /// Fitted reference window
    pub fn reference(&self) -> Option<&Array2<f64>> {
        self.reference.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.reference.is_some()
    }

    /// Store a copy of the reference window, replacing any previous one
    pub fn fit(&mut self, reference: &Array2<f64>) -> Result<()> {
        if reference.nrows() == 0 {
            return Err(DriftError::Validation(
                "reference window is empty".to_string(),
            ));
        }
        specific_checks(&self.method.capabilities(), reference.view())?;
        self.reference = Some(reference.to_owned());
        debug!(method = self.method.name(), rows = reference.nrows(), "reference window fitted");
        Ok(())
    }

    /// Fit a univariate reference from a single column of values
    pub fn fit_column(&mut self, reference: &Array1<f64>) -> Result<()> {
        self.fit(&reference.clone().insert_axis(Axis(1)))
    }

    /// Compare with the detector's configured options
    pub fn compare(&self, incoming: &Array2<f64>) -> Result<ComparisonResult> {
        self.compare_with(incoming, &self.options)
    }

    pub fn compare_column(&self, incoming: &Array1<f64>) -> Result<ComparisonResult> {
        self.compare(&incoming.clone().insert_axis(Axis(1)))
    }

    /// Validate, run the method's core computation, notify callbacks
    pub fn compare_with(&self, incoming: &Array2<f64>, options: &CompareOptions) -> Result<ComparisonResult> {
        common_checks(self.reference.as_ref().map(|r| r.view()), incoming.view())?;
        specific_checks(&self.method.capabilities(), incoming.view())?;

        let reference = self.reference.as_ref().ok_or(DriftError::NotFitted)?;
        let result = self
            .method
            .core_computation(reference.view(), incoming.view(), options)?;

        debug!(method = self.method.name(), score = result.score(), "comparison completed");
        self.callbacks.notify(&DriftEvent::ComparisonCompleted {
            method: self.method.name(),
            result,
        });
        Ok(result)
    }
}
