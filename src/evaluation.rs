//! Regression metrics and feature-importance reporting

use crate::error::{ForecastError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Held-out regression metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionReport {
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl RegressionReport {
    /// Compute RMSE, MAE, and R^2 for paired prediction/truth vectors.
    /// R^2 is 0.0 when the truth has zero variance.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(ForecastError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(ForecastError::InsufficientData(
                "cannot score zero predictions".to_string(),
            ));
        }

        let n = y_true.len() as f64;

        let mut sq_err = 0.0;
        let mut abs_err = 0.0;
        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            let d = t - p;
            sq_err += d * d;
            abs_err += d.abs();
        }

        let mean_true = y_true.sum() / n;
        let ss_tot: f64 = y_true.iter().map(|&t| (t - mean_true).powi(2)).sum();
        let r2 = if ss_tot > 0.0 { 1.0 - sq_err / ss_tot } else { 0.0 };

        Ok(Self {
            rmse: (sq_err / n).sqrt(),
            mae: abs_err / n,
            r2,
        })
    }
}

/// Feature names paired with importances, sorted descending. The sort is
/// stable, so tied features keep their column order.
pub fn rank_features(names: &[&str], importances: &Array1<f64>) -> Result<Vec<(String, f64)>> {
    if names.len() != importances.len() {
        return Err(ForecastError::ShapeError {
            expected: format!("{} importances", names.len()),
            actual: format!("{} importances", importances.len()),
        });
    }

    let mut ranked: Vec<(String, f64)> = names
        .iter()
        .zip(importances.iter())
        .map(|(&name, &imp)| (name.to_string(), imp))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    Ok(ranked)
}
