//! Support Vector Machine classifier
//!
//! Trained with SMO (Sequential Minimal Optimization). Binary problems use a
//! single machine; multi-class problems use One-vs-Rest and report the largest
//! per-class score as the margin.

use crate::error::{DriftError, Result};
use crate::training::{ClassifierFactory, MarginClassifier};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Maximum number of samples for eager kernel matrix computation.
/// Beyond this, training will return an error to prevent OOM.
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// Below this many samples the kernel matrix is built sequentially
const PARALLEL_KERNEL_THRESHOLD: usize = 100;

/// Kernel function type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KernelType {
    /// Linear kernel: K(x, y) = x · y
    Linear,
    /// Polynomial kernel: K(x, y) = (γ * x · y + r)^d
    Polynomial { degree: usize, gamma: f64, coef0: f64 },
    /// Radial Basis Function (Gaussian): K(x, y) = exp(-γ * ||x - y||²)
    RBF { gamma: f64 },
    /// Sigmoid kernel: K(x, y) = tanh(γ * x · y + r)
    Sigmoid { gamma: f64, coef0: f64 },
}

impl KernelType {
    fn compute(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self {
            KernelType::Linear => a.dot(&b),
            KernelType::Polynomial { degree, gamma, coef0 } => {
                (gamma * a.dot(&b) + coef0).powi((*degree).min(i32::MAX as usize) as i32)
            }
            KernelType::RBF { gamma } => {
                let norm_sq: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum();
                (-gamma * norm_sq).exp()
            }
            KernelType::Sigmoid { gamma, coef0 } => (gamma * a.dot(&b) + coef0).tanh(),
        }
    }
}

impl Default for KernelType {
    fn default() -> Self {
        KernelType::RBF { gamma: 1.0 }
    }
}

/// SVM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMConfig {
    /// Regularization parameter (C)
    pub c: f64,
    /// Kernel function
    pub kernel: KernelType,
    /// Tolerance for stopping criterion
    pub tol: f64,
    /// Maximum number of iterations
    pub max_iter: usize,
    /// Random seed
    pub random_state: Option<u64>,
}

impl Default for SVMConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: KernelType::RBF { gamma: 1.0 },
            tol: 1e-3,
            max_iter: 1000,
            random_state: Some(42),
        }
    }
}

impl SVMConfig {
    /// Build a configuration from a hyperparameter mapping.
    ///
    /// Recognized keys: `C` (or `c`), `kernel` (`linear`, `rbf`, `poly`,
    /// `sigmoid`), `gamma`, `degree`, `coef0`, `tol`, `max_iter`,
    /// `random_state`. Unknown keys are rejected.
    pub fn from_params(params: &HashMap<String, Value>) -> Result<Self> {
        let mut config = SVMConfig::default();
        let mut kernel_name = "rbf".to_string();
        let mut gamma = 1.0;
        let mut degree = 3usize;
        let mut coef0 = 0.0;

        for (key, value) in params {
            match key.as_str() {
                "C" | "c" => config.c = as_f64(key, value)?,
                "kernel" => {
                    kernel_name = value
                        .as_str()
                        .ok_or_else(|| invalid(key, value, "expected a string"))?
                        .to_lowercase()
                }
                "gamma" => gamma = as_f64(key, value)?,
                "degree" => degree = as_usize(key, value)?,
                "coef0" => coef0 = as_f64(key, value)?,
                "tol" => config.tol = as_f64(key, value)?,
                "max_iter" => config.max_iter = as_usize(key, value)?,
                "random_state" => {
                    config.random_state = match value {
                        Value::Null => None,
                        v => Some(as_usize(key, v)? as u64),
                    }
                }
                _ => return Err(invalid(key, value, "unknown SVM hyperparameter")),
            }
        }

        if config.c <= 0.0 {
            return Err(invalid("C", &Value::from(config.c), "must be positive"));
        }

        config.kernel = match kernel_name.as_str() {
            "linear" => KernelType::Linear,
            "rbf" => KernelType::RBF { gamma },
            "poly" | "polynomial" => KernelType::Polynomial { degree, gamma, coef0 },
            "sigmoid" => KernelType::Sigmoid { gamma, coef0 },
            other => {
                return Err(invalid(
                    "kernel",
                    &Value::from(other),
                    "expected one of linear, rbf, poly, sigmoid",
                ))
            }
        };

        Ok(config)
    }
}

fn invalid(key: &str, value: &Value, reason: &str) -> DriftError {
    DriftError::InvalidParameter {
        name: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn as_f64(key: &str, value: &Value) -> Result<f64> {
    value.as_f64().ok_or_else(|| invalid(key, value, "expected a number"))
}

fn as_usize(key: &str, value: &Value) -> Result<usize> {
    value
        .as_u64()
        .map(|v| v as usize)
        .ok_or_else(|| invalid(key, value, "expected a non-negative integer"))
}

/// A single binary SVM trained for one class vs rest
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinarySVM {
    support_vectors: Array2<f64>,
    alphas: Array1<f64>,
    support_labels: Array1<f64>,
    bias: f64,
}

impl BinarySVM {
    fn score(&self, kernel: &KernelType, sample: ArrayView1<f64>) -> f64 {
        let mut sum = self.bias;
        for (j, sv) in self.support_vectors.rows().into_iter().enumerate() {
            sum += self.alphas[j] * self.support_labels[j] * kernel.compute(sample, sv);
        }
        sum
    }
}

/// Support Vector Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMClassifier {
    config: SVMConfig,
    /// Unique class labels
    classes: Vec<i64>,
    /// One machine for binary problems, one per class for One-vs-Rest
    machines: Vec<BinarySVM>,
    n_features: usize,
    is_fitted: bool,
}

impl SVMClassifier {
    /// Create a new SVM classifier
    pub fn new(config: SVMConfig) -> Self {
        Self {
            config,
            classes: Vec::new(),
            machines: Vec::new(),
            n_features: 0,
            is_fitted: false,
        }
    }

    pub fn config(&self) -> &SVMConfig {
        &self.config
    }

    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    /// Fit the classifier (supports binary and multi-class via One-vs-Rest)
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(DriftError::Shape {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }

        // Validate that all labels are integral values (no silent truncation)
        for (i, &v) in y.iter().enumerate() {
            if (v - v.round()).abs() > 1e-9 {
                return Err(DriftError::InvalidInput(format!(
                    "SVM classifier requires integer class labels, but sample {} has label {}",
                    i, v
                )));
            }
        }

        let mut classes: Vec<i64> = y.iter().map(|&v| v.round() as i64).collect();
        classes.sort_unstable();
        classes.dedup();

        if classes.len() < 2 {
            return Err(DriftError::InvalidInput(
                "SVM requires at least 2 distinct classes".to_string(),
            ));
        }

        // Binary problems train a single machine for the second class
        let positives: Vec<i64> = if classes.len() == 2 {
            vec![classes[1]]
        } else {
            classes.clone()
        };

        let kernel_matrix = self.compute_kernel_matrix(x)?;
        let mut machines = Vec::with_capacity(positives.len());
        for cls in positives {
            let y_binary: Array1<f64> = y.mapv(|v| if v.round() as i64 == cls { 1.0 } else { -1.0 });
            machines.push(self.train_machine(x, &y_binary, &kernel_matrix));
        }

        self.classes = classes;
        self.machines = machines;
        self.n_features = x.ncols();
        self.is_fitted = true;
        Ok(())
    }

    fn train_machine(&self, x: &Array2<f64>, y: &Array1<f64>, kernel_matrix: &Array2<f64>) -> BinarySVM {
        let (alphas, bias, support_indices) = self.smo_train(y, kernel_matrix);

        let sv_count = support_indices.len();
        let mut support_vectors = Array2::zeros((sv_count, x.ncols()));
        let mut support_labels = Array1::zeros(sv_count);
        let mut support_alphas = Array1::zeros(sv_count);

        for (i, &idx) in support_indices.iter().enumerate() {
            support_vectors.row_mut(i).assign(&x.row(idx));
            support_labels[i] = y[idx];
            support_alphas[i] = alphas[idx];
        }

        BinarySVM {
            support_vectors,
            alphas: support_alphas,
            support_labels,
            bias,
        }
    }

    /// SMO training algorithm
    fn smo_train(&self, y: &Array1<f64>, kernel_matrix: &Array2<f64>) -> (Array1<f64>, f64, Vec<usize>) {
        let n = y.len();
        let c = self.config.c;
        let tol = self.config.tol;

        let mut alphas = Array1::zeros(n);
        let mut bias = 0.0;

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let mut passes = 0;
        let max_passes = 5;
        let mut total_iter = 0;

        while n > 1 && passes < max_passes && total_iter < self.config.max_iter {
            let mut num_changed = 0;

            for i in 0..n {
                let e_i = Self::cached_score(kernel_matrix, &alphas, y, bias, i) - y[i];

                // Check KKT conditions
                if (y[i] * e_i < -tol && alphas[i] < c) || (y[i] * e_i > tol && alphas[i] > 0.0) {
                    let j = loop {
                        let j = rng.gen_range(0..n);
                        if j != i {
                            break j;
                        }
                    };

                    let e_j = Self::cached_score(kernel_matrix, &alphas, y, bias, j) - y[j];

                    let alpha_i_old = alphas[i];
                    let alpha_j_old = alphas[j];

                    let (l, h) = if y[i] != y[j] {
                        ((alphas[j] - alphas[i]).max(0.0), (c + alphas[j] - alphas[i]).min(c))
                    } else {
                        ((alphas[i] + alphas[j] - c).max(0.0), (alphas[i] + alphas[j]).min(c))
                    };

                    if (l - h).abs() < 1e-10 {
                        continue;
                    }

                    let eta = 2.0 * kernel_matrix[[i, j]] - kernel_matrix[[i, i]] - kernel_matrix[[j, j]];
                    if eta >= 0.0 {
                        continue;
                    }

                    alphas[j] = (alphas[j] - y[j] * (e_i - e_j) / eta).max(l).min(h);
                    if (alphas[j] - alpha_j_old).abs() < 1e-5 {
                        continue;
                    }

                    alphas[i] += y[i] * y[j] * (alpha_j_old - alphas[j]);

                    let b1 = bias
                        - e_i
                        - y[i] * (alphas[i] - alpha_i_old) * kernel_matrix[[i, i]]
                        - y[j] * (alphas[j] - alpha_j_old) * kernel_matrix[[i, j]];
                    let b2 = bias
                        - e_j
                        - y[i] * (alphas[i] - alpha_i_old) * kernel_matrix[[i, j]]
                        - y[j] * (alphas[j] - alpha_j_old) * kernel_matrix[[j, j]];

                    bias = if alphas[i] > 0.0 && alphas[i] < c {
                        b1
                    } else if alphas[j] > 0.0 && alphas[j] < c {
                        b2
                    } else {
                        (b1 + b2) / 2.0
                    };

                    num_changed += 1;
                }
            }

            total_iter += 1;
            if num_changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }

        let support_indices: Vec<usize> = alphas
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 1e-8)
            .map(|(i, _)| i)
            .collect();

        (alphas, bias, support_indices)
    }

    /// Compute kernel matrix (parallelized for large datasets)
    fn compute_kernel_matrix(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let n = x.nrows();
        if n > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(DriftError::InvalidInput(format!(
                "Dataset has {} samples, exceeding the maximum {} for SVM kernel matrix. \
                 Consider subsampling the reference window.",
                n, MAX_KERNEL_MATRIX_SAMPLES
            )));
        }

        let kernel = &self.config.kernel;
        let mut k = Array2::zeros((n, n));

        if n < PARALLEL_KERNEL_THRESHOLD {
            for i in 0..n {
                for j in i..n {
                    let val = kernel.compute(x.row(i), x.row(j));
                    k[[i, j]] = val;
                    k[[j, i]] = val;
                }
            }
            return Ok(k);
        }

        let x_view = x.view();
        let rows: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| (i..n).map(|j| kernel.compute(x_view.row(i), x_view.row(j))).collect())
            .collect();

        for (i, row_vals) in rows.into_iter().enumerate() {
            for (offset, val) in row_vals.into_iter().enumerate() {
                let j = i + offset;
                k[[i, j]] = val;
                k[[j, i]] = val;
            }
        }
        Ok(k)
    }

    fn cached_score(k: &Array2<f64>, alphas: &Array1<f64>, y: &Array1<f64>, bias: f64, idx: usize) -> f64 {
        let mut sum = bias;
        for i in 0..alphas.len() {
            sum += alphas[i] * y[i] * k[[i, idx]];
        }
        sum
    }

    fn check_input(&self, x: &Array2<f64>) -> Result<()> {
        if !self.is_fitted {
            return Err(DriftError::NotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(DriftError::Shape {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(())
    }

    /// Per-row (best class index, score)
    fn best_scores(&self, x: &Array2<f64>) -> Vec<(usize, f64)> {
        let kernel = &self.config.kernel;
        x.rows()
            .into_iter()
            .map(|sample| {
                if self.machines.len() == 1 {
                    let score = self.machines[0].score(kernel, sample);
                    (usize::from(score >= 0.0), score)
                } else {
                    self.machines
                        .iter()
                        .enumerate()
                        .map(|(k, m)| (k, m.score(kernel, sample)))
                        .fold((0, f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best })
                }
            })
            .collect()
    }

    /// Predict class labels (binary and multi-class)
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.check_input(x)?;
        Ok(self
            .best_scores(x)
            .into_iter()
            .map(|(k, _)| self.classes[k] as f64)
            .collect())
    }

    /// Get decision function values (binary: single score, multi-class: max OvR score)
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.check_input(x)?;
        Ok(self.best_scores(x).into_iter().map(|(_, s)| s).collect())
    }

    /// Get number of support vectors across all machines
    pub fn n_support_vectors(&self) -> usize {
        self.machines.iter().map(|m| m.support_vectors.nrows()).sum()
    }
}

impl MarginClassifier for SVMClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        SVMClassifier::fit(self, x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        SVMClassifier::predict(self, x)
    }

    fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        SVMClassifier::decision_function(self, x)
    }
}

/// Builds unfitted SVM classifiers sharing one configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SvmFactory {
    config: SVMConfig,
}

impl SvmFactory {
    pub fn new(config: SVMConfig) -> Self {
        Self { config }
    }

    /// See [`SVMConfig::from_params`]
    pub fn from_params(params: &HashMap<String, Value>) -> Result<Self> {
        Ok(Self::new(SVMConfig::from_params(params)?))
    }

    /// Parse a JSON object of hyperparameters
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: HashMap<String, Value> = serde_json::from_str(json)?;
        Self::from_params(&params)
    }

    pub fn config(&self) -> &SVMConfig {
        &self.config
    }
}

impl ClassifierFactory for SvmFactory {
    type Classifier = SVMClassifier;

    fn build(&self) -> SVMClassifier {
        SVMClassifier::new(self.config.clone())
    }
}
