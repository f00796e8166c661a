//! Standard scaling as a pipeline step

use crate::error::{DriftError, Result};
use crate::pipeline::Transformer;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Z-score scaler: `(x - mean) / std` per column
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.mean.as_ref()
    }

    /// Per-column divisor; constant columns get 1.0
    pub fn scale(&self) -> Option<&Array1<f64>> {
        self.scale.as_ref()
    }

    /// Undo the scaling
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (mean, scale) = self.params(x.ncols())?;
        Ok(x * scale + mean)
    }

    fn params(&self, ncols: usize) -> Result<(&Array1<f64>, &Array1<f64>)> {
        let (mean, scale) = match (&self.mean, &self.scale) {
            (Some(m), Some(s)) => (m, s),
            _ => return Err(DriftError::NotFitted),
        };
        if mean.len() != ncols {
            return Err(DriftError::Shape {
                expected: format!("{} columns", mean.len()),
                actual: format!("{} columns", ncols),
            });
        }
        Ok((mean, scale))
    }
}

impl Transformer for StandardScaler {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        if x.nrows() == 0 {
            return Err(DriftError::InvalidInput("cannot fit scaler on empty data".to_string()));
        }
        let mean = x.mean_axis(Axis(0)).ok_or(DriftError::NotFitted)?;
        let std = x.std_axis(Axis(0), 0.0);
        self.scale = Some(std.mapv(|s| if s == 0.0 { 1.0 } else { s }));
        self.mean = Some(mean);
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (mean, scale) = self.params(x.ncols())?;
        Ok((x - mean) / scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaler() {
        let x = array![[1.0, 10.0], [3.0, 10.0], [5.0, 10.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        // mean zero, constant column untouched by the divisor
        assert!(scaled.column(0).sum().abs() < 1e-12);
        assert!(scaled.column(1).iter().all(|v| v.abs() < 1e-12));
        assert!((scaler.scale().unwrap()[1] - 1.0).abs() < 1e-12);

        let restored = scaler.inverse_transform(&scaled).unwrap();
        assert!((&restored - &x).iter().all(|d| d.abs() < 1e-12));
    }

    #[test]
    fn test_transform_before_fit() {
        let scaler = StandardScaler::new();
        assert!(matches!(scaler.transform(&array![[1.0]]), Err(DriftError::NotFitted)));
    }

    #[test]
    fn test_column_mismatch() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(scaler.transform(&array![[1.0]]).is_err());
    }
}
