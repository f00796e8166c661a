//! Thread-safe handle around a margin-density detector

use crate::error::Result;
use crate::semi_supervised::baseline::MarginDensityBaseline;
use crate::semi_supervised::detector::{MarginDensityDetector, MonitorState, UpdateOutcome};
use crate::training::ClassifierFactory;
use ndarray::{Array1, Array2};
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle; one lock covers buffering, scoring and retraining so every
/// caller sees a consistent chunk and baseline.
pub struct SharedDetector<F: ClassifierFactory> {
    inner: Arc<Mutex<MarginDensityDetector<F>>>,
}

impl<F: ClassifierFactory> Clone for SharedDetector<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: ClassifierFactory> SharedDetector<F> {
    pub fn new(detector: MarginDensityDetector<F>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(detector)),
        }
    }

    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.inner.lock().fit(x, y)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner.lock().predict(x)
    }

    pub fn update(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<UpdateOutcome> {
        self.inner.lock().update(x, y)
    }

    pub fn drift_suspected(&self) -> bool {
        self.inner.lock().drift_suspected()
    }

    pub fn state(&self) -> MonitorState {
        self.inner.lock().state()
    }

    pub fn baseline(&self) -> Option<MarginDensityBaseline> {
        self.inner.lock().baseline().copied()
    }

    /// Run `f` with exclusive access to the detector
    pub fn with_detector<R>(&self, f: impl FnOnce(&mut MarginDensityDetector<F>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semi_supervised::MarginDensityConfig;
    use crate::training::{KernelType, SVMClassifier, SVMConfig};
    use std::thread;

    fn linear_svm() -> SVMClassifier {
        SVMClassifier::new(SVMConfig {
            kernel: KernelType::Linear,
            ..Default::default()
        })
    }

    #[test]
    fn test_concurrent_predictions_share_one_buffer() {
        let config = MarginDensityConfig::new(1000, 2.0, 2).unwrap();
        let detector = MarginDensityDetector::new(config, linear_svm as fn() -> SVMClassifier).unwrap();
        let shared = SharedDetector::new(detector);

        let x = Array2::from_shape_fn((20, 1), |(i, _)| if i < 10 { -1.0 - i as f64 * 0.1 } else { 1.0 + i as f64 * 0.1 });
        let y = Array1::from_shape_fn(20, |i| if i < 10 { 0.0 } else { 1.0 });
        shared.fit(&x, &y).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let handle = shared.clone();
                let batch = x.clone();
                thread::spawn(move || handle.predict(&batch).map(|p| p.len()))
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap().unwrap(), 20);
        }

        assert_eq!(shared.with_detector(|d| d.buffered_rows()), 80);
        assert_eq!(shared.state(), MonitorState::Monitoring);
        assert!(shared.baseline().is_some());
    }
}
