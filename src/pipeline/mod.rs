//! Estimator adapter
//!
//! Lets the margin-density monitor sit at the end of a chain of transformers
//! and be driven with plain `fit`/`predict` calls. [`update_detector`] is the
//! oracle entry point: it hands true labels to whatever drift-aware estimator
//! terminates the chain.

mod scaler;

pub use scaler::StandardScaler;

use crate::error::{DriftError, Result};
use crate::semi_supervised::{MarginDensityDetector, UpdateOutcome};
use crate::training::ClassifierFactory;
use ndarray::{Array1, Array2};
use tracing::info;

/// Stateful feature transformation
pub trait Transformer: Send + TransformerClone {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()>;

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// Object-safe cloning for boxed transformers
pub trait TransformerClone {
    fn clone_box(&self) -> Box<dyn Transformer>;
}

impl<T: Transformer + Clone + 'static> TransformerClone for T {
    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(self.clone())
    }
}

/// Fit/predict stage. `predict` takes `&mut self` because drift monitors
/// update their internal state while predicting.
pub trait Estimator {
    fn fit(&mut self, x: &Array2<f64>, y: Option<&Array1<f64>>) -> Result<()>;

    fn predict(&mut self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

/// An estimator that can suspect drift and accept labels
pub trait DriftAware {
    fn drift_suspected(&self) -> bool;

    fn update(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<UpdateOutcome>;
}

impl<F: ClassifierFactory> Estimator for MarginDensityDetector<F> {
    fn fit(&mut self, x: &Array2<f64>, y: Option<&Array1<f64>>) -> Result<()> {
        let y = y.ok_or_else(|| {
            DriftError::Validation("margin density detector requires labels to fit".to_string())
        })?;
        MarginDensityDetector::fit(self, x, y)
    }

    fn predict(&mut self, x: &Array2<f64>) -> Result<Array1<f64>> {
        MarginDensityDetector::predict(self, x)
    }
}

impl<F: ClassifierFactory> DriftAware for MarginDensityDetector<F> {
    fn drift_suspected(&self) -> bool {
        MarginDensityDetector::drift_suspected(self)
    }

    fn update(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<UpdateOutcome> {
        MarginDensityDetector::update(self, x, y)
    }
}

/// Named transformers followed by a final estimator
pub struct Pipeline<E> {
    steps: Vec<(String, Box<dyn Transformer>)>,
    estimator: E,
}

impl<E> Pipeline<E> {
    pub fn new(estimator: E) -> Self {
        Self {
            steps: Vec::new(),
            estimator,
        }
    }

    /// Append a transformer; steps run in insertion order
    pub fn with_step(mut self, name: impl Into<String>, step: impl Transformer + 'static) -> Self {
        self.steps.push((name.into(), Box::new(step)));
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn estimator_mut(&mut self) -> &mut E {
        &mut self.estimator
    }

    /// Apply every fitted transformer
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let mut current = x.to_owned();
        for (_, step) in &self.steps {
            current = step.transform(&current)?;
        }
        Ok(current)
    }
}

impl<E: Estimator> Estimator for Pipeline<E> {
    /// Fits copies of the transformers and swaps them in only once the
    /// estimator has accepted their output
    fn fit(&mut self, x: &Array2<f64>, y: Option<&Array1<f64>>) -> Result<()> {
        let mut staged = Vec::with_capacity(self.steps.len());
        let mut current = x.to_owned();
        for (name, step) in &self.steps {
            let mut fresh = step.clone_box();
            current = fresh.fit_transform(&current)?;
            staged.push((name.clone(), fresh));
        }
        self.estimator.fit(&current, y)?;
        self.steps = staged;
        Ok(())
    }

    fn predict(&mut self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let transformed = self.transform(x)?;
        self.estimator.predict(&transformed)
    }
}

impl<E: DriftAware> DriftAware for Pipeline<E> {
    fn drift_suspected(&self) -> bool {
        self.estimator.drift_suspected()
    }

    fn update(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<UpdateOutcome> {
        let transformed = self.transform(x)?;
        self.estimator.update(&transformed, y)
    }
}

/// Supply true labels to a drift-aware estimator.
///
/// Fails with [`DriftError::PrematureUpdate`] unless drift is currently
/// suspected. Labels are collected until a full chunk is available, at which
/// point the baseline is retrained and drift suspicion clears.
pub fn update_detector<D>(estimator: &mut D, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>
where
    D: DriftAware + ?Sized,
{
    if !estimator.drift_suspected() {
        return Err(DriftError::PrematureUpdate {
            state: "not drift-suspected".to_string(),
        });
    }
    if let UpdateOutcome::Retrained { drift_confirmed, .. } = estimator.update(x, y)? {
        info!(drift_confirmed, "detector updated with oracle labels");
    }
    Ok(())
}
