//! Feature scaling fitted on the training partition only

use crate::error::{ForecastError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Scaling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Z-score normalization: (x - mean) / std
    Standard,
    /// Median/IQR scaling; less sensitive to the heavy-tailed prices the
    /// outlier filter may leave behind
    Robust,
}

/// Parameters for one fitted column
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    center: f64, // mean or median
    scale: f64,  // std or IQR
}

/// Per-column scaler. `fit` computes center/scale from the partition it is
/// given (the training partition, by contract); `transform` applies the
/// fitted parameters without ever refitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: HashMap<String, ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Fit per-column center and scale from `df`
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| ForecastError::FeatureNotFound(col_name.to_string()))?;
            let casted = column
                .cast(&DataType::Float64)
                .map_err(|e| ForecastError::DataError(e.to_string()))?;
            let params = self.compute_params(casted.as_materialized_series())?;
            self.params.insert(col_name.to_string(), params);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Apply the fitted transform to every fitted column present in `df`
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ForecastError::ModelNotFitted);
        }

        let mut result = df.clone();
        for (col_name, params) in &self.params {
            let Ok(column) = df.column(col_name.as_str()) else {
                continue;
            };
            let casted = column
                .cast(&DataType::Float64)
                .map_err(|e| ForecastError::DataError(e.to_string()))?;
            let ca = casted
                .as_materialized_series()
                .f64()
                .map_err(|e| ForecastError::DataError(e.to_string()))?;

            let scaled: Float64Chunked = ca
                .into_iter()
                .map(|opt| opt.map(|v| (v - params.center) / params.scale))
                .collect();

            let series = scaled.with_name(col_name.as_str().into()).into_series();
            result = result.with_column(series)?.clone();
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Scale a single value with a column's fitted parameters (used by the
    /// future projector for synthesized rows)
    pub fn scale_value(&self, column: &str, value: f64) -> Result<f64> {
        if !self.is_fitted {
            return Err(ForecastError::ModelNotFitted);
        }
        let params = self
            .params
            .get(column)
            .ok_or_else(|| ForecastError::FeatureNotFound(column.to_string()))?;
        Ok((value - params.center) / params.scale)
    }

    /// Fitted (center, scale) for a column, if fitted
    pub fn column_params(&self, column: &str) -> Option<(f64, f64)> {
        self.params.get(column).map(|p| (p.center, p.scale))
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn compute_params(&self, series: &Series) -> Result<ScalerParams> {
        let ca = series
            .f64()
            .map_err(|e| ForecastError::DataError(e.to_string()))?;

        match self.scaler_type {
            ScalerType::Standard => {
                let mean = ca.mean().unwrap_or(0.0);
                let std = ca.std(1).unwrap_or(1.0);
                Ok(ScalerParams {
                    center: mean,
                    scale: if std == 0.0 { 1.0 } else { std },
                })
            }
            ScalerType::Robust => {
                let median = ca.median().unwrap_or(0.0);
                let q1 = ca
                    .quantile(0.25, QuantileMethod::Linear)
                    .unwrap_or(Some(0.0))
                    .unwrap_or(0.0);
                let q3 = ca
                    .quantile(0.75, QuantileMethod::Linear)
                    .unwrap_or(Some(1.0))
                    .unwrap_or(1.0);
                let iqr = q3 - q1;
                Ok(ScalerParams {
                    center: median,
                    scale: if iqr == 0.0 { 1.0 } else { iqr },
                })
            }
        }
    }
}
