//! Shared fixtures for integration tests

#![allow(dead_code)]

use driftsense::{DriftError, Result};
use driftsense::training::MarginClassifier;
use ndarray::{Array1, Array2};

/// One-feature classifier with its boundary halfway between the class means.
/// Margins are scaled so each class mean sits at distance 1.
#[derive(Debug, Default, Clone)]
pub struct Centroid {
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
            (!vals.is_empty()).then(|| vals.iter().sum::<f64>() / vals.len() as f64)
        };
        match (mean_of(0.0), mean_of(1.0)) {
            (Some(m0), Some(m1)) => {
                self.midpoint = (m0 + m1) / 2.0;
                self.half_gap = ((m1 - m0) / 2.0).abs().max(1e-9);
                Ok(())
            }
            _ => Err(DriftError::InvalidInput("both classes are required".to_string())),
        }
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self.decision_function(x)?.mapv(|m| if m >= 0.0 { 1.0 } else { 0.0 }))
    }

    fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(x.column(0).mapv(|v| (v - self.midpoint) / self.half_gap))
    }
}

pub fn centroid() -> Centroid {
    Centroid::default()
}

/// Class 0 spread over (-2, 0), class 1 over (0, 2), interleaved
pub fn reference(n: usize) -> (Array2<f64>, Array1<f64>) {
    let half = n / 2;
    let mut x = Vec::with_capacity(half * 2);
    let mut y = Vec::with_capacity(half * 2);
    for i in 0..half {
        let t = (i as f64 + 0.5) / half as f64;
        x.push(-2.0 * t);
        y.push(0.0);
        x.push(2.0 * t);
        y.push(1.0);
    }
    (Array2::from_shape_vec((half * 2, 1), x).unwrap(), Array1::from_vec(y))
}

/// Rows far from the boundary, alternating sides
pub fn far_rows(n: usize) -> Array2<f64> {
    Array2::from_shape_fn((n, 1), |(i, _)| if i % 2 == 0 { 5.0 } else { -5.0 })
}

/// Labeled rows between 3 and 5 away from zero, alternating classes
pub fn labeled_far_rows(n: usize) -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((n, 1), |(i, _)| {
        let magnitude = 3.0 + 2.0 * (i / 2) as f64 / (n / 2).max(1) as f64;
        if i % 2 == 0 { magnitude } else { -magnitude }
    });
    let y = Array1::from_shape_fn(n, |i| if i % 2 == 0 { 1.0 } else { 0.0 });
    (x, y)
}
