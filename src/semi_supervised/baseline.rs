//! Cross-validated margin-density baseline
//!
//! The reference set is split into folds. Each fold is scored by a classifier
//! trained on the remaining folds, so no sample is ever scored by a model that
//! saw it. The per-fold margin densities give the baseline mean and standard
//! deviation; a final classifier trained on the whole reference becomes the
//! production model.

use crate::error::{DriftError, Result};
use crate::training::cross_validation::{CVResults, CVStrategy, CrossValidator};
use crate::training::metrics::{accuracy_score, MetricScorer};
use crate::training::{ClassifierFactory, MarginClassifier};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Half-width of the band around the decision boundary counted as "near"
pub const MARGIN_BAND: f64 = 1.0;

/// Fraction of margins falling inside `[-1, 1]`. Empty input has density 0.
pub fn margin_density(margins: &Array1<f64>) -> f64 {
    if margins.is_empty() {
        return 0.0;
    }
    let near = margins.iter().filter(|m| m.abs() <= MARGIN_BAND).count();
    near as f64 / margins.len() as f64
}

/// Baseline statistics published after a successful fit or retrain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginDensityBaseline {
    /// Mean per-fold margin density
    pub mean: f64,
    /// Population standard deviation of per-fold margin density
    pub std: f64,
    /// Mean per-fold metric score
    pub metric_mean: f64,
    pub metric_std: f64,
    /// Reference rows the baseline was computed from
    pub num_samples: usize,
}

/// Per-fold diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoldResult {
    pub fold: usize,
    pub margin_density: f64,
    pub metric: f64,
    pub num_held_out: usize,
}

/// Everything the trainer produces in one run
#[derive(Debug, Clone)]
pub struct TrainedBaseline<C> {
    pub baseline: MarginDensityBaseline,
    /// Classifier fit on the whole reference
    pub model: C,
    pub folds: Vec<FoldResult>,
    /// Reference row indices in the order their held-out margins were computed
    pub held_out_order: Vec<usize>,
    /// Held-out margin per entry of `held_out_order`
    pub held_out_margins: Array1<f64>,
}

/// Fold-based baseline trainer
pub struct BaselineTrainer<'a, F> {
    factory: &'a F,
    num_folds: usize,
    random_state: Option<u64>,
    scorer: MetricScorer,
}

impl<'a, F: ClassifierFactory> BaselineTrainer<'a, F> {
    pub fn new(factory: &'a F, num_folds: usize) -> Self {
        Self {
            factory,
            num_folds,
            random_state: None,
            scorer: accuracy_score,
        }
    }

    pub fn with_random_state(mut self, seed: Option<u64>) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_scorer(mut self, scorer: MetricScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Run the full cross-validated computation. Any classifier failure aborts
    /// the run; the fold index `num_folds` denotes the final full-reference fit.
    pub fn train(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainedBaseline<F::Classifier>> {
        if x.nrows() != y.len() {
            return Err(DriftError::Validation(format!(
                "reference has {} rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if x.nrows() == 0 {
            return Err(DriftError::InsufficientData("reference set is empty".to_string()));
        }

        let mut validator = CrossValidator::new(CVStrategy::for_labels(self.num_folds, y));
        if let Some(seed) = self.random_state {
            validator = validator.with_random_state(seed);
        }
        let splits = validator.split(x.nrows(), Some(y))?;

        let mut folds = Vec::with_capacity(splits.len());
        let mut held_out_order = Vec::with_capacity(x.nrows());
        let mut held_out_margins = Vec::with_capacity(x.nrows());

        for split in &splits {
            let fold = split.fold_idx;
            let wrap = |e: DriftError| DriftError::ClassifierTraining {
                fold,
                reason: e.to_string(),
            };

            let x_train = x.select(Axis(0), &split.train_indices);
            let y_train = y.select(Axis(0), &split.train_indices);
            let x_test = x.select(Axis(0), &split.test_indices);
            let y_test = y.select(Axis(0), &split.test_indices);

            let mut classifier = self.factory.build();
            classifier.fit(&x_train, &y_train).map_err(wrap)?;
            let margins = classifier.decision_function(&x_test).map_err(wrap)?;
            if margins.len() != split.test_indices.len() {
                return Err(DriftError::ClassifierTraining {
                    fold,
                    reason: format!(
                        "decision function returned {} margins for {} rows",
                        margins.len(),
                        split.test_indices.len()
                    ),
                });
            }
            let predictions = classifier.predict(&x_test).map_err(wrap)?;

            let result = FoldResult {
                fold,
                margin_density: margin_density(&margins),
                metric: (self.scorer)(&y_test, &predictions),
                num_held_out: split.test_indices.len(),
            };
            debug!(
                fold,
                margin_density = result.margin_density,
                metric = result.metric,
                "fold scored"
            );

            held_out_order.extend_from_slice(&split.test_indices);
            held_out_margins.extend(margins.iter().copied());
            folds.push(result);
        }

        let densities = CVResults::from_scores(folds.iter().map(|f| f.margin_density).collect());
        let metrics = CVResults::from_scores(folds.iter().map(|f| f.metric).collect());

        let mut model = self.factory.build();
        model.fit(x, y).map_err(|e| DriftError::ClassifierTraining {
            fold: self.num_folds,
            reason: e.to_string(),
        })?;

        Ok(TrainedBaseline {
            baseline: MarginDensityBaseline {
                mean: densities.mean_score,
                std: densities.std_score,
                metric_mean: metrics.mean_score,
                metric_std: metrics.std_score,
                num_samples: x.nrows(),
            },
            model,
            folds,
            held_out_order,
            held_out_margins: Array1::from_vec(held_out_margins),
        })
    }
}
