//! driftsense - drift detection for tabular data
//!
//! Two modes are provided:
//! - batch two-sample comparison of a reference window with an incoming sample
//! - semi-supervised stream monitoring with margin density drift detection
//!   (MD3), which only asks for labels once drift is suspected
//!
//! # Modules
//!
//! - [`drift`] - Batch detectors (Kolmogorov-Smirnov, chi-square, KL, PSI) and validators
//! - [`semi_supervised`] - Margin density baseline, monitor state machine, shared handle
//! - [`training`] - Classifier traits, SVM, cross-validation splitting, metrics
//! - [`pipeline`] - Estimator adapter, standard scaler, `update_detector`
//! - [`callbacks`] - Observer hooks for detector events
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

pub mod callbacks;
pub mod drift;
pub mod pipeline;
pub mod semi_supervised;
pub mod training;

// Services
pub mod cli;

pub use error::{DriftError, Result};

/// Common imports
pub mod prelude {
    pub use crate::callbacks::{DriftCallback, DriftEvent};
    pub use crate::drift::{
        Alternative, BatchDriftDetector, BatchMethod, CompareOptions, ComparisonResult, KsMethod,
    };
    pub use crate::error::{DriftError, Result};
    pub use crate::pipeline::{update_detector, DriftAware, Estimator, Pipeline, StandardScaler, Transformer};
    pub use crate::semi_supervised::{
        MarginDensityConfig, MarginDensityDetector, MonitorState, RetrainPolicy, UpdateOutcome,
    };
    pub use crate::training::{ClassifierFactory, MarginClassifier, SvmFactory};
}
