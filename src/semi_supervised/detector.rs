//! Online margin-density drift monitor
//!
//! Unlabeled rows are buffered into fixed-size chunks. A full chunk is scored
//! by the fraction of rows the production model places near its decision
//! boundary and compared with the cross-validated baseline. Crossing the
//! threshold moves the monitor to [`MonitorState::DriftSuspected`], where it
//! waits for labels before retraining.

use crate::callbacks::{CallbackList, DriftEvent};
use crate::error::{DriftError, Result};
use crate::semi_supervised::baseline::{margin_density, BaselineTrainer, MarginDensityBaseline};
use crate::semi_supervised::config::{DriftThreshold, MarginDensityConfig, RetrainPolicy};
use crate::training::metrics::{accuracy_score, MetricScorer};
use crate::training::{ClassifierFactory, MarginClassifier};
use ndarray::{concatenate, s, Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Monitor lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorState {
    /// No baseline yet
    Training,
    /// Scoring unlabeled chunks
    Monitoring,
    /// Threshold crossed, waiting for labels
    DriftSuspected,
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MonitorState::Training => "training",
            MonitorState::Monitoring => "monitoring",
            MonitorState::DriftSuspected => "drift-suspected",
        };
        f.write_str(name)
    }
}

/// Score of one complete chunk
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkScore {
    /// Zero-based count of chunks scored since the last fit
    pub chunk_index: usize,
    pub margin_density: f64,
    /// `mean - sensitivity * std`
    pub lower_threshold: f64,
    /// `mean + sensitivity * std`, only consulted for two-sided thresholds
    pub upper_threshold: f64,
    pub drift_suspected: bool,
}

/// Result of supplying labels while drift is suspected
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOutcome {
    /// Not enough labeled rows yet to retrain
    Collecting { buffered: usize, required: usize },
    /// Baseline was recomputed and monitoring resumed
    Retrained {
        /// Previous model's score on the labeled rows
        metric: f64,
        /// Whether that score fell below the baseline metric threshold
        drift_confirmed: bool,
        baseline: MarginDensityBaseline,
    },
}

/// Semi-supervised margin density drift detector (MD3)
pub struct MarginDensityDetector<F: ClassifierFactory> {
    config: MarginDensityConfig,
    factory: F,
    scorer: MetricScorer,
    state: MonitorState,
    model: Option<F::Classifier>,
    baseline: Option<MarginDensityBaseline>,
    reference_x: Option<Array2<f64>>,
    reference_y: Option<Array1<f64>>,
    n_features: usize,
    /// Flattened unlabeled rows of the current chunk
    buffer: Vec<f64>,
    labeled_x: Vec<f64>,
    labeled_y: Vec<f64>,
    chunks_scored: usize,
    scoring_failures: usize,
    last_score: Option<ChunkScore>,
    callbacks: CallbackList,
}

impl<F: ClassifierFactory> MarginDensityDetector<F> {
    pub fn new(config: MarginDensityConfig, factory: F) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            factory,
            scorer: accuracy_score,
            state: MonitorState::Training,
            model: None,
            baseline: None,
            reference_x: None,
            reference_y: None,
            n_features: 0,
            buffer: Vec::new(),
            labeled_x: Vec::new(),
            labeled_y: Vec::new(),
            chunks_scored: 0,
            scoring_failures: 0,
            last_score: None,
            callbacks: CallbackList::new(),
        })
    }

    /// Metric used for fold scores and drift confirmation (default accuracy)
    pub fn with_scorer(mut self, scorer: MetricScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Register a callback for `DriftSuspected` and `BaselineRetrained` events
    pub fn on_event<C>(&mut self, callback: C)
    where
        C: Fn(&DriftEvent) + Send + Sync + 'static,
    {
        self.callbacks.register(callback);
    }

    pub fn config(&self) -> &MarginDensityConfig {
        &self.config
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn drift_suspected(&self) -> bool {
        self.state == MonitorState::DriftSuspected
    }

    pub fn baseline(&self) -> Option<&MarginDensityBaseline> {
        self.baseline.as_ref()
    }

    /// Production model
    pub fn model(&self) -> Option<&F::Classifier> {
        self.model.as_ref()
    }

    /// Reference features the current baseline was computed from
    pub fn reference(&self) -> Option<&Array2<f64>> {
        self.reference_x.as_ref()
    }

    pub fn reference_labels(&self) -> Option<&Array1<f64>> {
        self.reference_y.as_ref()
    }

    /// Unlabeled rows waiting in the current chunk
    pub fn buffered_rows(&self) -> usize {
        if self.n_features == 0 {
            0
        } else {
            self.buffer.len() / self.n_features
        }
    }

    /// Labeled rows collected while drift is suspected
    pub fn labeled_rows(&self) -> usize {
        self.labeled_y.len()
    }

    pub fn chunks_scored(&self) -> usize {
        self.chunks_scored
    }

    /// Chunks whose margins could not be computed; their rows stay buffered
    pub fn scoring_failures(&self) -> usize {
        self.scoring_failures
    }

    pub fn last_score(&self) -> Option<&ChunkScore> {
        self.last_score.as_ref()
    }

    /// Compute the baseline from a labeled reference and start monitoring.
    /// On failure the previously published baseline and model stay in place.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let trained = BaselineTrainer::new(&self.factory, self.config.num_folds)
            .with_random_state(self.config.random_state)
            .with_scorer(self.scorer)
            .train(x, y)?;

        info!(
            mean = trained.baseline.mean,
            std = trained.baseline.std,
            samples = trained.baseline.num_samples,
            "margin density baseline established"
        );

        self.model = Some(trained.model);
        self.baseline = Some(trained.baseline);
        self.reference_x = Some(x.to_owned());
        self.reference_y = Some(y.to_owned());
        self.n_features = x.ncols();
        self.clear_buffers();
        self.chunks_scored = 0;
        self.scoring_failures = 0;
        self.last_score = None;
        self.state = MonitorState::Monitoring;
        Ok(())
    }

    /// Predict with the production model and stream rows into the monitor.
    /// A chunk that fails to score does not fail the prediction; see
    /// [`scoring_failures`](Self::scoring_failures).
    pub fn predict(&mut self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let model = self.model.as_ref().ok_or(DriftError::NotFitted)?;
        self.check_columns(x.ncols())?;
        let predictions = model.predict(x)?;

        for row in x.rows() {
            if self.state != MonitorState::Monitoring {
                break;
            }
            if let Err(e) = self.push_row(row) {
                debug!(error = %e, "chunk left unscored, retrying on the next row");
            }
        }
        Ok(predictions)
    }

    /// Stream rows without returning predictions; returns the scores of any
    /// chunks completed by these rows
    pub fn observe(&mut self, x: &Array2<f64>) -> Result<Vec<ChunkScore>> {
        if self.model.is_none() {
            return Err(DriftError::NotFitted);
        }
        self.check_columns(x.ncols())?;

        let mut scores = Vec::new();
        for row in x.rows() {
            if self.state != MonitorState::Monitoring {
                break;
            }
            scores.extend(self.push_row(row)?);
        }
        Ok(scores)
    }

    fn check_columns(&self, ncols: usize) -> Result<()> {
        if ncols != self.n_features {
            return Err(DriftError::Validation(format!(
                "incoming sample has {} columns, reference has {}",
                ncols, self.n_features
            )));
        }
        Ok(())
    }

    fn push_row(&mut self, row: ArrayView1<f64>) -> Result<Vec<ChunkScore>> {
        self.buffer.extend(row.iter().copied());
        let mut scores = Vec::new();
        while self.state == MonitorState::Monitoring && self.buffered_rows() >= self.config.chunk_size {
            scores.push(self.score_chunk()?);
        }
        Ok(scores)
    }

    fn score_chunk(&mut self) -> Result<ChunkScore> {
        let (model, baseline) = match (self.model.as_ref(), self.baseline.as_ref()) {
            (Some(m), Some(b)) => (m, *b),
            _ => return Err(DriftError::NotFitted),
        };

        let width = self.config.chunk_size * self.n_features;
        let chunk = Array2::from_shape_vec(
            (self.config.chunk_size, self.n_features),
            self.buffer[..width].to_vec(),
        )?;
        let margins = match model.decision_function(&chunk) {
            Ok(m) => m,
            Err(e) => {
                self.scoring_failures += 1;
                warn!(
                    error = %e,
                    failures = self.scoring_failures,
                    "failed to score chunk, keeping its rows"
                );
                return Err(e);
            }
        };
        // Rows past the chunk start the next one
        self.buffer.drain(..width);

        let density = margin_density(&margins);
        let spread = self.config.sensitivity * baseline.std;
        let lower = baseline.mean - spread;
        let upper = baseline.mean + spread;
        let suspected = match self.config.threshold {
            DriftThreshold::Lower => density < lower,
            DriftThreshold::TwoSided => (density - baseline.mean).abs() > spread,
        };

        let score = ChunkScore {
            chunk_index: self.chunks_scored,
            margin_density: density,
            lower_threshold: lower,
            upper_threshold: upper,
            drift_suspected: suspected,
        };
        self.chunks_scored += 1;
        self.last_score = Some(score);
        debug!(
            chunk = score.chunk_index,
            density,
            lower,
            suspected,
            "chunk scored"
        );

        if suspected {
            // Keep the chunk so the oracle's labels can be matched against it
            self.buffer = chunk.into_raw_vec_and_offset().0;
            self.state = MonitorState::DriftSuspected;
            warn!(
                chunk = score.chunk_index,
                density,
                baseline_mean = baseline.mean,
                "margin density drift suspected"
            );
            self.callbacks.notify(&DriftEvent::DriftSuspected { score });
        }
        Ok(score)
    }

    /// Supply true labels while drift is suspected. Retrains once at least
    /// `chunk_size` labeled rows have been collected.
    pub fn update(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<UpdateOutcome> {
        if self.state != MonitorState::DriftSuspected {
            return Err(DriftError::PrematureUpdate {
                state: self.state.to_string(),
            });
        }
        if x.nrows() != y.len() {
            return Err(DriftError::Validation(format!(
                "update has {} rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        self.check_columns(x.ncols())?;

        self.labeled_x.extend(x.iter().copied());
        self.labeled_y.extend(y.iter().copied());

        let buffered = self.labeled_rows();
        let required = self.config.chunk_size;
        if buffered < required {
            debug!(buffered, required, "collecting labels");
            return Ok(UpdateOutcome::Collecting { buffered, required });
        }

        let labeled_x = Array2::from_shape_vec(
            (buffered, self.n_features),
            std::mem::take(&mut self.labeled_x),
        )?;
        let labeled_y = Array1::from_vec(std::mem::take(&mut self.labeled_y));

        match self.retrain(&labeled_x, &labeled_y) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(error = %e, "retrain failed, keeping previous baseline");
                Err(e)
            }
        }
    }

    fn retrain(&mut self, labeled_x: &Array2<f64>, labeled_y: &Array1<f64>) -> Result<UpdateOutcome> {
        let (model, previous) = match (self.model.as_ref(), self.baseline) {
            (Some(m), Some(b)) => (m, b),
            _ => return Err(DriftError::NotFitted),
        };

        let metric = (self.scorer)(labeled_y, &model.predict(labeled_x)?);
        let drift_confirmed = metric < previous.metric_mean - self.config.sensitivity * previous.metric_std;

        let (new_x, new_y) = match (self.config.retrain_policy, &self.reference_x, &self.reference_y) {
            (RetrainPolicy::Append, Some(rx), Some(ry)) => (
                concatenate(Axis(0), &[rx.view(), labeled_x.view()])?,
                concatenate(Axis(0), &[ry.view(), labeled_y.view()])?,
            ),
            _ => (labeled_x.to_owned(), labeled_y.to_owned()),
        };
        let (new_x, new_y) = match self.config.max_reference_rows {
            Some(max_rows) if new_x.nrows() > max_rows => {
                let start = new_x.nrows() - max_rows;
                debug!(dropped = start, max_rows, "trimming oldest reference rows");
                (
                    new_x.slice(s![start.., ..]).to_owned(),
                    new_y.slice(s![start..]).to_owned(),
                )
            }
            _ => (new_x, new_y),
        };

        let trained = BaselineTrainer::new(&self.factory, self.config.num_folds)
            .with_random_state(self.config.random_state)
            .with_scorer(self.scorer)
            .train(&new_x, &new_y)?;
        let current = trained.baseline;

        self.model = Some(trained.model);
        self.baseline = Some(current);
        self.reference_x = Some(new_x);
        self.reference_y = Some(new_y);
        self.clear_buffers();
        self.state = MonitorState::Monitoring;

        info!(
            previous_mean = previous.mean,
            mean = current.mean,
            std = current.std,
            metric,
            drift_confirmed,
            policy = ?self.config.retrain_policy,
            "baseline retrained"
        );
        self.callbacks.notify(&DriftEvent::BaselineRetrained {
            previous,
            current,
            drift_confirmed,
        });

        Ok(UpdateOutcome::Retrained {
            metric,
            drift_confirmed,
            baseline: current,
        })
    }

    /// Forget the model and baseline and return to the training state
    pub fn reset(&mut self) {
        self.state = MonitorState::Training;
        self.model = None;
        self.baseline = None;
        self.reference_x = None;
        self.reference_y = None;
        self.n_features = 0;
        self.clear_buffers();
        self.chunks_scored = 0;
        self.scoring_failures = 0;
        self.last_score = None;
    }

    fn clear_buffers(&mut self) {
        self.buffer.clear();
        self.labeled_x.clear();
        self.labeled_y.clear();
    }
}

impl<F: ClassifierFactory> fmt::Debug for MarginDensityDetector<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarginDensityDetector")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("baseline", &self.baseline)
            .field("buffered_rows", &self.buffered_rows())
            .field("labeled_rows", &self.labeled_rows())
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// 1-D classifier: boundary halfway between the class means, margin
    /// scaled so each class mean sits at distance 1
    #[derive(Debug, Default)]
    struct Centroid {
        midpoint: f64,
        half_gap: f64,
    }

    impl MarginClassifier for Centroid {
        fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
            let mean_of = |cls: f64| {
                let vals: Vec<f64> = x
                    .column(0)
                    .iter()
                    .zip(y.iter())
                    .filter(|(_, &l)| l == cls)
                    .map(|(&v, _)| v)
                    .collect();
                if vals.is_empty() {
                    None
                } else {
                    Some(vals.iter().sum::<f64>() / vals.len() as f64)
                }
            };
            let (m0, m1) = match (mean_of(0.0), mean_of(1.0)) {
                (Some(a), Some(b)) => (a, b),
                _ => return Err(DriftError::InvalidInput("need both classes".into())),
            };
            self.midpoint = (m0 + m1) / 2.0;
            self.half_gap = ((m1 - m0) / 2.0).abs().max(1e-9);
            Ok(())
        }

        fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
            Ok(self.decision_function(x)?.mapv(|m| if m >= 0.0 { 1.0 } else { 0.0 }))
        }

        fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
            Ok(x.column(0).mapv(|v| (v - self.midpoint) / self.half_gap))
        }
    }

    fn reference() -> (Array2<f64>, Array1<f64>) {
        let n = 100;
        let mut x = Vec::with_capacity(n);
        let mut y = Vec::with_capacity(n);
        for i in 0..n / 2 {
            let t = (i as f64 + 0.5) / (n / 2) as f64;
            x.push(-2.0 * t);
            y.push(0.0);
            x.push(2.0 * t);
            y.push(1.0);
        }
        (Array2::from_shape_vec((n, 1), x).unwrap(), Array1::from_vec(y))
    }

    fn far_rows(n: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, 1), |(i, _)| if i % 2 == 0 { 5.0 } else { -5.0 })
    }

    fn detector(chunk_size: usize) -> MarginDensityDetector<fn() -> Centroid> {
        let config = MarginDensityConfig::new(chunk_size, 2.0, 5).unwrap();
        let mut d = MarginDensityDetector::new(config, Centroid::default as fn() -> Centroid).unwrap();
        let (x, y) = reference();
        d.fit(&x, &y).unwrap();
        d
    }

    #[test]
    fn test_predict_before_fit() {
        let config = MarginDensityConfig::new(5, 2.0, 2).unwrap();
        let mut d = MarginDensityDetector::new(config, Centroid::default as fn() -> Centroid).unwrap();
        assert_eq!(d.state(), MonitorState::Training);
        assert!(matches!(d.predict(&array![[0.0]]), Err(DriftError::NotFitted)));
    }

    #[test]
    fn test_partial_chunk_never_decides() {
        let mut d = detector(10);
        assert_eq!(d.state(), MonitorState::Monitoring);
        d.predict(&far_rows(9)).unwrap();
        assert!(!d.drift_suspected());
        assert_eq!(d.buffered_rows(), 9);
        assert!(d.last_score().is_none());

        d.predict(&far_rows(1)).unwrap();
        assert!(d.drift_suspected());
        assert_eq!(d.last_score().map(|s| s.margin_density), Some(0.0));
    }

    #[test]
    fn test_in_distribution_chunk_keeps_monitoring() {
        let mut d = detector(10);
        let (x, _) = reference();
        let scores = d.observe(&x.slice(ndarray::s![0..20, ..]).to_owned()).unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores.iter().all(|s| !s.drift_suspected));
        assert_eq!(d.buffered_rows(), 0);
        assert_eq!(d.state(), MonitorState::Monitoring);
    }

    #[test]
    fn test_rows_after_suspicion_are_not_buffered() {
        let mut d = detector(4);
        let predictions = d.predict(&far_rows(7)).unwrap();
        assert_eq!(predictions.len(), 7);
        assert!(d.drift_suspected());
        assert_eq!(d.buffered_rows(), 4);
        assert_eq!(d.chunks_scored(), 1);
    }

    #[test]
    fn test_premature_update_is_rejected() {
        let mut d = detector(10);
        let err = d.update(&far_rows(10), &Array1::zeros(10)).unwrap_err();
        assert!(matches!(err, DriftError::PrematureUpdate { ref state } if state == "monitoring"));
    }

    #[test]
    fn test_update_collects_until_chunk_complete() {
        let mut d = detector(4);
        d.predict(&far_rows(4)).unwrap();
        let outcome = d.update(&array![[-5.0], [5.0]], &array![0.0, 1.0]).unwrap();
        assert_eq!(outcome, UpdateOutcome::Collecting { buffered: 2, required: 4 });
        assert!(d.drift_suspected());

        let outcome = d
            .update(&array![[-4.0], [4.0], [-6.0], [6.0]], &array![0.0, 1.0, 0.0, 1.0])
            .unwrap();
        assert!(matches!(outcome, UpdateOutcome::Retrained { .. }));
        assert!(!d.drift_suspected());
        assert_eq!(d.reference().map(|r| r.nrows()), Some(6));
    }

    #[test]
    fn test_failed_retrain_keeps_previous_baseline() {
        let mut d = detector(4);
        d.predict(&far_rows(4)).unwrap();
        let before = *d.baseline().unwrap();

        // single class cannot be fit
        let err = d.update(&far_rows(4), &Array1::zeros(4)).unwrap_err();
        assert!(matches!(err, DriftError::ClassifierTraining { .. } | DriftError::InsufficientData(_)));
        assert_eq!(*d.baseline().unwrap(), before);
        assert!(d.drift_suspected());
        assert_eq!(d.labeled_rows(), 0);
    }

    #[test]
    fn test_callbacks_fire_on_suspicion_and_retrain() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut d = detector(4);
        let sink = Arc::clone(&events);
        d.on_event(move |e| {
            let tag = match e {
                DriftEvent::DriftSuspected { .. } => "suspected",
                DriftEvent::BaselineRetrained { .. } => "retrained",
                DriftEvent::ComparisonCompleted { .. } => "compared",
            };
            sink.lock().push(tag);
        });

        d.predict(&far_rows(4)).unwrap();
        d.update(
            &array![[-5.0], [5.0], [-4.0], [4.0], [-6.0], [6.0]],
            &array![0.0, 1.0, 0.0, 1.0, 0.0, 1.0],
        )
        .unwrap();
        assert_eq!(*events.lock(), vec!["suspected", "retrained"]);
    }

    #[test]
    fn test_two_sided_threshold_flags_dense_chunk() {
        let config = MarginDensityConfig::new(10, 2.0, 5)
            .unwrap()
            .with_threshold(DriftThreshold::TwoSided);
        let mut d = MarginDensityDetector::new(config, Centroid::default as fn() -> Centroid).unwrap();
        let (x, y) = reference();
        d.fit(&x, &y).unwrap();

        // every row on the boundary
        let scores = d.observe(&Array2::zeros((10, 1))).unwrap();
        assert_eq!(scores[0].margin_density, 1.0);
        assert!(d.drift_suspected());
    }

    /// Centroid whose margins can be switched off after fitting
    struct Flaky {
        inner: Centroid,
        broken: Arc<AtomicBool>,
    }

    impl MarginClassifier for Flaky {
        fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
            self.inner.fit(x, y)
        }

        fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
            self.inner.predict(x)
        }

        fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(DriftError::InvalidInput("margins unavailable".into()));
            }
            self.inner.decision_function(x)
        }
    }

    #[test]
    fn test_scoring_failure_keeps_predictions_and_rows() {
        let broken = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&broken);
        let config = MarginDensityConfig::new(4, 2.0, 5).unwrap();
        let mut d = MarginDensityDetector::new(config, move || Flaky {
            inner: Centroid::default(),
            broken: Arc::clone(&flag),
        })
        .unwrap();
        let (x, y) = reference();
        d.fit(&x, &y).unwrap();

        broken.store(true, Ordering::SeqCst);
        let predictions = d.predict(&far_rows(4)).unwrap();
        assert_eq!(predictions, array![1.0, 0.0, 1.0, 0.0]);
        assert_eq!(d.scoring_failures(), 1);
        assert_eq!(d.buffered_rows(), 4);
        assert_eq!(d.chunks_scored(), 0);
        assert_eq!(d.state(), MonitorState::Monitoring);

        // the kept chunk is scored once margins come back
        broken.store(false, Ordering::SeqCst);
        d.predict(&far_rows(1)).unwrap();
        assert_eq!(d.chunks_scored(), 1);
        assert!(d.drift_suspected());
        assert_eq!(d.buffered_rows(), 4);
    }

    #[test]
    fn test_reset_returns_to_training() {
        let mut d = detector(10);
        d.predict(&far_rows(3)).unwrap();
        d.reset();
        assert_eq!(d.state(), MonitorState::Training);
        assert!(d.baseline().is_none());
        assert_eq!(d.buffered_rows(), 0);
    }
}
