//! Configuration for margin-density monitoring

use crate::error::{DriftError, Result};
use serde::{Deserialize, Serialize};

/// How the reference window is rebuilt once labels for a suspected chunk arrive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetrainPolicy {
    /// The labeled chunk becomes the whole new reference
    #[default]
    Replace,
    /// The labeled chunk is appended after the current reference
    Append,
}

/// Which side of the baseline counts as drift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriftThreshold {
    /// `density < mean - sensitivity * std`
    #[default]
    Lower,
    /// `|density - mean| > sensitivity * std`
    TwoSided,
}

/// Margin-density detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginDensityConfig {
    /// Rows per scored chunk
    pub chunk_size: usize,
    /// Number of baseline standard deviations defining the threshold
    pub sensitivity: f64,
    /// Cross-validation folds used to estimate the baseline
    pub num_folds: usize,
    pub retrain_policy: RetrainPolicy,
    /// Upper bound on the appended reference; the oldest rows are dropped
    /// first. Unbounded when `None`, in which case an `Append` reference
    /// eventually outgrows classifiers with a sample limit (the SVM refuses
    /// more than 10,000 rows) and every later retrain fails.
    pub max_reference_rows: Option<usize>,
    pub threshold: DriftThreshold,
    /// Seed for fold shuffling
    pub random_state: Option<u64>,
}

impl Default for MarginDensityConfig {
    fn default() -> Self {
        Self {
            chunk_size: 100,
            sensitivity: 2.0,
            num_folds: 5,
            retrain_policy: RetrainPolicy::Replace,
            max_reference_rows: None,
            threshold: DriftThreshold::Lower,
            random_state: Some(42),
        }
    }
}

impl MarginDensityConfig {
    /// Create a validated configuration
    pub fn new(chunk_size: usize, sensitivity: f64, num_folds: usize) -> Result<Self> {
        let config = Self {
            chunk_size,
            sensitivity,
            num_folds,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_retrain_policy(mut self, policy: RetrainPolicy) -> Self {
        self.retrain_policy = policy;
        self
    }

    pub fn with_max_reference_rows(mut self, max_rows: Option<usize>) -> Self {
        self.max_reference_rows = max_rows;
        self
    }

    pub fn with_threshold(mut self, threshold: DriftThreshold) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_random_state(mut self, seed: Option<u64>) -> Self {
        self.random_state = seed;
        self
    }

    /// Parse and validate a JSON configuration; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(DriftError::InvalidParameter {
                name: "chunk_size".to_string(),
                value: self.chunk_size.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if !(self.sensitivity.is_finite() && self.sensitivity > 0.0) {
            return Err(DriftError::InvalidParameter {
                name: "sensitivity".to_string(),
                value: self.sensitivity.to_string(),
                reason: "must be a positive finite number".to_string(),
            });
        }
        if self.num_folds < 2 {
            return Err(DriftError::InvalidParameter {
                name: "num_folds".to_string(),
                value: self.num_folds.to_string(),
                reason: "cross-validation needs at least 2 folds".to_string(),
            });
        }
        if let Some(max_rows) = self.max_reference_rows {
            if max_rows < self.chunk_size {
                return Err(DriftError::InvalidParameter {
                    name: "max_reference_rows".to_string(),
                    value: max_rows.to_string(),
                    reason: format!("must hold at least one chunk of {} rows", self.chunk_size),
                });
            }
        }
        Ok(())
    }
}
