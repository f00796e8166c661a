//! Classifier collaborators for margin-density monitoring
//!
//! The monitor only needs three things from a classifier: fit, predict, and a
//! signed distance to the decision boundary. Anything implementing
//! [`MarginClassifier`] can be plugged in through a [`ClassifierFactory`].
//! - Support Vector Machine trained with SMO
//! - K-fold and stratified K-fold splitting
//! - Metric scorers

pub mod cross_validation;
pub mod metrics;
pub mod svm;

pub use cross_validation::{CVResults, CVSplit, CVStrategy, CrossValidator};
pub use metrics::{accuracy_score, balanced_accuracy_score, MetricScorer};
pub use svm::{KernelType, SVMClassifier, SVMConfig, SvmFactory};

use crate::error::Result;
use ndarray::{Array1, Array2};

/// A classifier exposing its decision margin
pub trait MarginClassifier {
    /// Fit on features `x` (rows are samples) and class labels `y`
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predicted class label per row
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Signed distance to the decision boundary per row
    fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

/// Builds fresh, unfitted classifiers
pub trait ClassifierFactory {
    type Classifier: MarginClassifier;

    fn build(&self) -> Self::Classifier;
}

impl<F, C> ClassifierFactory for F
where
    F: Fn() -> C,
    C: MarginClassifier,
{
    type Classifier = C;

    fn build(&self) -> C {
        self()
    }
}
