//! Metric scorers used to compare labeled chunks with the baseline

use ndarray::Array1;

/// Scores predictions against true labels; higher is better
pub type MetricScorer = fn(&Array1<f64>, &Array1<f64>) -> f64;

/// Fraction of predictions equal to the true label
pub fn accuracy_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(&t, &p)| (t - p).abs() < 1e-9)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Mean of per-class recall, robust to class imbalance
pub fn balanced_accuracy_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let mut classes: Vec<i64> = y_true.iter().map(|&v| v.round() as i64).collect();
    classes.sort_unstable();
    classes.dedup();
    if classes.is_empty() {
        return 0.0;
    }

    let recalls: f64 = classes
        .iter()
        .map(|&cls| {
            let (hits, total) = y_true
                .iter()
                .zip(y_pred.iter())
                .filter(|(&t, _)| t.round() as i64 == cls)
                .fold((0usize, 0usize), |(h, n), (_, &p)| {
                    (h + usize::from(p.round() as i64 == cls), n + 1)
                });
            hits as f64 / total as f64
        })
        .sum();
    recalls / classes.len() as f64
}
