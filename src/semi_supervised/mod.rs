//! Semi-supervised concept drift detection
//!
//! Margin density drift detection (MD3): a classifier's uncertainty region is
//! monitored on unlabeled data, and labels are only requested once the share
//! of samples near the decision boundary departs from its cross-validated
//! baseline.

pub mod baseline;
pub mod config;
pub mod detector;
pub mod shared;

pub use baseline::{margin_density, BaselineTrainer, FoldResult, MarginDensityBaseline, TrainedBaseline};
pub use config::{DriftThreshold, MarginDensityConfig, RetrainPolicy};
pub use detector::{ChunkScore, MarginDensityDetector, MonitorState, UpdateOutcome};
pub use shared::SharedDetector;
