//! driftsense CLI Module
//!
//! Batch comparison and stream monitoring over CSV files.

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use parking_lot::Mutex;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use crate::callbacks::DriftEvent;
use crate::error::DriftError;
use crate::drift::{Alternative, BatchDriftDetector, CompareOptions, ComparisonResult, KsMethod};
use crate::pipeline::{update_detector, DriftAware, Estimator, Pipeline, StandardScaler};
use crate::semi_supervised::{MarginDensityConfig, MarginDensityDetector};
use crate::training::{accuracy_score, SvmFactory};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn alert(s: &str) -> ColoredString  { s.truecolor(240, 120, 100) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(&format!("{:<18}", key)), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "driftsense")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Batch and semi-supervised drift detection")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare one column of two CSV files
    Compare {
        /// Batch method
        #[arg(short, long, value_enum, default_value = "ks")]
        method: MethodArg,

        /// Reference data file
        #[arg(short, long)]
        reference: PathBuf,

        /// Incoming data file
        #[arg(short, long)]
        incoming: PathBuf,

        /// Column to compare
        #[arg(short, long)]
        column: String,

        /// Alternative hypothesis for KS
        #[arg(long, value_enum, default_value = "two-sided")]
        alternative: AlternativeArg,

        /// KS p-value computation
        #[arg(long, value_enum, default_value = "auto")]
        mode: ModeArg,

        /// Histogram bins for KL and PSI
        #[arg(long)]
        bins: Option<usize>,
    },

    /// Stream a labeled CSV through the margin density monitor
    Monitor {
        /// Labeled reference data file
        #[arg(short, long)]
        reference: PathBuf,

        /// Labeled stream file; labels are only read when drift is suspected
        #[arg(short, long)]
        stream: PathBuf,

        /// Target column name
        #[arg(short, long)]
        target: String,

        /// JSON file with monitor configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON file with SVM hyperparameters
        #[arg(long)]
        svm: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum MethodArg {
    Ks,
    ChiSquare,
    Kl,
    Psi,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum AlternativeArg {
    TwoSided,
    Less,
    Greater,
}

impl From<AlternativeArg> for Alternative {
    fn from(arg: AlternativeArg) -> Self {
        match arg {
            AlternativeArg::TwoSided => Alternative::TwoSided,
            AlternativeArg::Less => Alternative::Less,
            AlternativeArg::Greater => Alternative::Greater,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    Auto,
    Exact,
    Asymptotic,
}

impl From<ModeArg> for KsMethod {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Auto => KsMethod::Auto,
            ModeArg::Exact => KsMethod::Exact,
            ModeArg::Asymptotic => KsMethod::Asymptotic,
        }
    }
}

// ─── Data loading ──────────────────────────────────────────────────────────────

pub fn load_data(path: &Path) -> anyhow::Result<DataFrame> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if ext != "csv" {
        anyhow::bail!("Unsupported file format: {}", ext);
    }

    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(1000))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// One column as f64, rejecting nulls
pub fn column_values(df: &DataFrame, name: &str) -> crate::Result<ndarray::Array1<f64>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    column
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| crate::DriftError::Data(format!("null in column '{}' at row {}", name, row)))
        })
        .collect()
}

/// Every column except `exclude`, row-major
pub fn feature_matrix(df: &DataFrame, exclude: &str) -> crate::Result<ndarray::Array2<f64>> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .filter(|n| n != exclude)
        .collect();
    if names.is_empty() {
        return Err(crate::DriftError::Data("no feature columns".to_string()));
    }

    let columns = names
        .iter()
        .map(|n| column_values(df, n))
        .collect::<crate::Result<Vec<_>>>()?;
    Ok(ndarray::Array2::from_shape_fn((df.height(), columns.len()), |(i, j)| columns[j][i]))
}

// ─── Commands ──────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn cmd_compare(
    method: MethodArg,
    reference_path: &Path,
    incoming_path: &Path,
    column: &str,
    alternative: AlternativeArg,
    mode: ModeArg,
    bins: Option<usize>,
) -> anyhow::Result<()> {
    section("Compare");

    step_run("Loading data");
    let start = Instant::now();
    let reference = column_values(&load_data(reference_path)?, column)?;
    let incoming = column_values(&load_data(incoming_path)?, column)?;
    step_done(&format!("{} vs {} rows in {:?}", reference.len(), incoming.len(), start.elapsed()));

    let num_bins = bins.unwrap_or(10);
    let mut detector = match method {
        MethodArg::Ks => BatchDriftDetector::kolmogorov_smirnov(),
        MethodArg::ChiSquare => BatchDriftDetector::chi_square(),
        MethodArg::Kl => BatchDriftDetector::kullback_leibler(num_bins),
        MethodArg::Psi => BatchDriftDetector::population_stability_index(num_bins),
    };
    let mut options = CompareOptions::default()
        .with_alternative(alternative.into())
        .with_ks_method(mode.into());
    if let Some(b) = bins {
        options = options.with_bins(b);
    }

    detector.fit_column(&reference)?;
    let result = detector.compare_with(&incoming.insert_axis(ndarray::Axis(1)), &options)?;

    println!();
    line_box_top();
    line_box(&kv("Method", detector.method_name()));
    line_box(&kv("Column", column));
    match result {
        ComparisonResult::Statistical(r) => {
            line_box(&kv("Statistic", &format!("{:.6}", r.statistic)));
            let p = format!("{:.6}", r.p_value);
            let p = if r.p_value < 0.05 { alert(&p) } else { ok(&p) };
            line_box(&kv("p-value", &p.to_string()));
        }
        ComparisonResult::Distance(r) => {
            line_box(&kv("Distance", &format!("{:.6}", r.distance)));
        }
    }
    line_box_bottom();
    println!();
    Ok(())
}

#[derive(Debug, Default)]
struct MonitorCounts {
    suspected: usize,
    retrained: usize,
    confirmed: usize,
    failed_retrains: usize,
}

/// Hand oracle labels to a drift-aware estimator. A failed retrain leaves the
/// detector suspected with its previous baseline, so it is reported as
/// `Ok(false)` and the stream carries on; other errors propagate.
fn supply_labels<D>(estimator: &mut D, x: &ndarray::Array2<f64>, y: &ndarray::Array1<f64>) -> crate::Result<bool>
where
    D: DriftAware + ?Sized,
{
    match update_detector(estimator, x, y) {
        Ok(()) => Ok(true),
        Err(e @ (DriftError::ClassifierTraining { .. } | DriftError::InsufficientData(_))) => {
            warn!(error = %e, "retrain failed, collecting a new chunk of labels");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

pub fn cmd_monitor(
    reference_path: &Path,
    stream_path: &Path,
    target: &str,
    config_path: Option<&Path>,
    svm_path: Option<&Path>,
) -> anyhow::Result<()> {
    section("Monitor");

    let config = match config_path {
        Some(p) => MarginDensityConfig::from_json_str(&std::fs::read_to_string(p)?)?,
        None => MarginDensityConfig::default(),
    };
    let factory = match svm_path {
        Some(p) => SvmFactory::from_json_str(&std::fs::read_to_string(p)?)?,
        None => SvmFactory::default(),
    };

    step_run("Loading data");
    let start = Instant::now();
    let reference_df = load_data(reference_path)?;
    let stream_df = load_data(stream_path)?;
    let x_ref = feature_matrix(&reference_df, target)?;
    let y_ref = column_values(&reference_df, target)?;
    let x_stream = feature_matrix(&stream_df, target)?;
    let y_stream = column_values(&stream_df, target)?;
    step_done(&format!(
        "{} reference, {} stream rows in {:?}",
        x_ref.nrows(),
        x_stream.nrows(),
        start.elapsed()
    ));

    let counts = Arc::new(Mutex::new(MonitorCounts::default()));
    let mut detector = MarginDensityDetector::new(config.clone(), factory)?;
    let sink = Arc::clone(&counts);
    detector.on_event(move |event| {
        let mut c = sink.lock();
        match event {
            DriftEvent::DriftSuspected { .. } => c.suspected += 1,
            DriftEvent::BaselineRetrained { drift_confirmed, .. } => {
                c.retrained += 1;
                if *drift_confirmed {
                    c.confirmed += 1;
                }
            }
            DriftEvent::ComparisonCompleted { .. } => {}
        }
    });

    let mut pipe = Pipeline::new(detector).with_step("scaler", StandardScaler::new());

    step_run("Fitting baseline");
    let start = Instant::now();
    pipe.fit(&x_ref, Some(&y_ref))?;
    step_done(&format!("{:?}", start.elapsed()));

    step_run("Streaming");
    let start = Instant::now();
    let mut predictions = Vec::with_capacity(x_stream.nrows());
    for i in 0..x_stream.nrows() {
        let row = x_stream.slice(ndarray::s![i..i + 1, ..]).to_owned();
        predictions.push(pipe.predict(&row)?[0]);
        if pipe.drift_suspected() {
            // The stream's own label plays the oracle
            let label = y_stream.slice(ndarray::s![i..i + 1]).to_owned();
            if !supply_labels(&mut pipe, &row, &label)? {
                counts.lock().failed_retrains += 1;
            }
        }
    }
    step_done(&format!("{:?}", start.elapsed()));

    let stream_accuracy = accuracy_score(&y_stream, &ndarray::Array1::from_vec(predictions));
    let counts = counts.lock();
    let detector = pipe.estimator();

    println!();
    line_box_top();
    line_box(&kv("Chunk size", &config.chunk_size.to_string()));
    line_box(&kv("Sensitivity", &config.sensitivity.to_string()));
    if let Some(b) = detector.baseline() {
        line_box(&kv("Baseline density", &format!("{:.4} ± {:.4}", b.mean, b.std)));
    }
    line_box(&kv("Chunks since fit", &detector.chunks_scored().to_string()));
    let suspected = counts.suspected.to_string();
    line_box(&kv(
        "Drift suspected",
        &if counts.suspected > 0 { alert(&suspected) } else { ok(&suspected) }.to_string(),
    ));
    line_box(&kv("Retrains", &counts.retrained.to_string()));
    line_box(&kv("Confirmed drift", &counts.confirmed.to_string()));
    let failed = counts.failed_retrains.to_string();
    line_box(&kv(
        "Failed retrains",
        &if counts.failed_retrains > 0 { alert(&failed) } else { ok(&failed) }.to_string(),
    ));
    line_box(&kv("Stream accuracy", &format!("{:.4}", stream_accuracy)));
    line_box(&kv("Final state", &detector.state().to_string()));
    line_box_bottom();
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semi_supervised::UpdateOutcome;
    use ndarray::{array, Array1, Array2};

    /// Always suspected; every update fails with the stored error
    struct FailingMonitor {
        error: fn() -> DriftError,
    }

    impl DriftAware for FailingMonitor {
        fn drift_suspected(&self) -> bool {
            true
        }

        fn update(&mut self, _x: &Array2<f64>, _y: &Array1<f64>) -> crate::Result<UpdateOutcome> {
            Err((self.error)())
        }
    }

    #[test]
    fn test_failed_retrain_does_not_stop_the_stream() {
        let mut monitor = FailingMonitor {
            error: || DriftError::ClassifierTraining {
                fold: 0,
                reason: "at least 2 distinct classes".to_string(),
            },
        };
        assert!(!supply_labels(&mut monitor, &array![[1.0]], &array![0.0]).unwrap());

        let mut monitor = FailingMonitor {
            error: || DriftError::InsufficientData("2 rows for 5 folds".to_string()),
        };
        assert!(!supply_labels(&mut monitor, &array![[1.0]], &array![0.0]).unwrap());
    }

    #[test]
    fn test_other_update_errors_propagate() {
        let mut monitor = FailingMonitor {
            error: || DriftError::Validation("column mismatch".to_string()),
        };
        let err = supply_labels(&mut monitor, &array![[1.0]], &array![0.0]).unwrap_err();
        assert!(matches!(err, DriftError::Validation(_)));
    }
}
