//! Precondition checks shared by every batch detector
//!
//! `common_checks` compares incoming data against the fitted reference.
//! `specific_checks` compares data against the capability a detector declares.
//! Both run before any computation.

use crate::drift::types::{Capabilities, DataType, StatisticalType};
use crate::error::{DriftError, Result};
use ndarray::ArrayView2;

/// Reference is present, incoming is non-empty and has the reference's column count
pub fn common_checks(reference: Option<ArrayView2<f64>>, incoming: ArrayView2<f64>) -> Result<()> {
    let reference = reference.ok_or(DriftError::NotFitted)?;

    if reference.nrows() == 0 {
        return Err(DriftError::Validation(
            "reference window is empty".to_string(),
        ));
    }
    if incoming.nrows() == 0 {
        return Err(DriftError::Validation(
            "incoming sample is empty".to_string(),
        ));
    }
    if incoming.ncols() != reference.ncols() {
        return Err(DriftError::Validation(format!(
            "incoming sample has {} columns, reference has {}",
            incoming.ncols(),
            reference.ncols()
        )));
    }
    Ok(())
}

/// Data matches the declared data type and statistical type
pub fn specific_checks(capabilities: &Capabilities, data: ArrayView2<f64>) -> Result<()> {
    check_statistical_type(capabilities.statistical_type, data)?;
    check_data_type(capabilities.data_type, data)
}

fn check_statistical_type(declared: StatisticalType, data: ArrayView2<f64>) -> Result<()> {
    match declared {
        StatisticalType::Univariate if data.ncols() != 1 => Err(DriftError::Validation(format!(
            "detector is univariate but data has {} columns",
            data.ncols()
        ))),
        StatisticalType::Multivariate if data.ncols() == 0 => Err(DriftError::Validation(
            "detector is multivariate but data has no columns".to_string(),
        )),
        _ => Ok(()),
    }
}

fn check_data_type(declared: DataType, data: ArrayView2<f64>) -> Result<()> {
    for ((row, col), &value) in data.indexed_iter() {
        if !value.is_finite() {
            return Err(DriftError::Validation(format!(
                "non-finite value {} at row {}, column {}",
                value, row, col
            )));
        }
        if declared == DataType::Categorical && value.fract() != 0.0 {
            return Err(DriftError::Validation(format!(
                "detector expects categorical data but found non-integral value {} at row {}, column {}",
                value, row, col
            )));
        }
    }
    Ok(())
}
