//! Fail-fast categorical label encoding

use crate::error::{ForecastError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maps each categorical column's observed string values to dense integer
/// codes, fixed at fit time.
///
/// Codes are assigned in first-appearance order over the fit table, so they
/// are deterministic and reproducible for a given input order. Transforming a
/// value never seen during fit fails with
/// [`ForecastError::UnknownCategory`]: there is no default bucket, because
/// silently bucketing unseen categories would corrupt long-horizon future
/// projections.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CategoryEncoder {
    // column name -> (category -> code)
    mappings: HashMap<String, HashMap<String, i64>>,
    is_fitted: bool,
}

impl CategoryEncoder {
    pub fn new() -> Self {
        Self {
            mappings: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Build the value-to-code tables from the unique values observed in
    /// each of `columns`.
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| ForecastError::FeatureNotFound(col_name.to_string()))?;
            let ca = column
                .as_materialized_series()
                .str()
                .map_err(|e| ForecastError::DataError(e.to_string()))?;

            let mut mapping: HashMap<String, i64> = HashMap::new();
            let mut next_code = 0i64;
            for val in ca.into_iter().flatten() {
                if !mapping.contains_key(val) {
                    mapping.insert(val.to_string(), next_code);
                    next_code += 1;
                }
            }
            self.mappings.insert(col_name.to_string(), mapping);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Append `<column>_encoded` i64 code columns for every fitted column
    /// present in `df`. The original string columns are kept for reporting.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ForecastError::ModelNotFitted);
        }

        let mut result = df.clone();
        // deterministic column order regardless of HashMap iteration
        let mut fitted: Vec<&String> = self.mappings.keys().collect();
        fitted.sort();

        for col_name in fitted {
            let Ok(column) = df.column(col_name) else {
                continue;
            };
            let ca = column
                .as_materialized_series()
                .str()
                .map_err(|e| ForecastError::DataError(e.to_string()))?;

            let codes: Vec<i64> = ca
                .into_iter()
                .map(|v| {
                    let value = v.ok_or_else(|| {
                        ForecastError::DataError(format!("null value in column '{col_name}'"))
                    })?;
                    self.encode_value(col_name, value)
                })
                .collect::<Result<Vec<_>>>()?;

            let encoded = Series::new(format!("{col_name}_encoded").into(), codes);
            result = result.with_column(encoded)?.clone();
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Look up the code for a single value. Fails with `UnknownCategory` if
    /// the value was never seen during fit.
    pub fn encode_value(&self, column: &str, value: &str) -> Result<i64> {
        let mapping = self
            .mappings
            .get(column)
            .ok_or_else(|| ForecastError::FeatureNotFound(column.to_string()))?;
        mapping
            .get(value)
            .copied()
            .ok_or_else(|| ForecastError::UnknownCategory {
                column: column.to_string(),
                value: value.to_string(),
            })
    }

    /// Number of distinct categories fitted for a column
    pub fn cardinality(&self, column: &str) -> Option<usize> {
        self.mappings.get(column).map(|m| m.len())
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category_frame() -> DataFrame {
        DataFrame::new(vec![Series::new(
            "town".into(),
            &["BEDOK", "CLEMENTI", "BEDOK", "PUNGGOL", "CLEMENTI"],
        )
        .into()])
        .unwrap()
    }

    #[test]
    fn test_first_appearance_order() {
        let df = category_frame();
        let mut encoder = CategoryEncoder::new();
        encoder.fit(&df, &["town"]).unwrap();

        assert_eq!(encoder.encode_value("town", "BEDOK").unwrap(), 0);
        assert_eq!(encoder.encode_value("town", "CLEMENTI").unwrap(), 1);
        assert_eq!(encoder.encode_value("town", "PUNGGOL").unwrap(), 2);
        assert_eq!(encoder.cardinality("town"), Some(3));
    }

    #[test]
    fn test_codes_stable_across_calls() {
        let df = category_frame();
        let mut encoder = CategoryEncoder::new();
        encoder.fit(&df, &["town"]).unwrap();

        let first = encoder.encode_value("town", "PUNGGOL").unwrap();
        for _ in 0..10 {
            assert_eq!(encoder.encode_value("town", "PUNGGOL").unwrap(), first);
        }

        let a = encoder.transform(&df).unwrap();
        let b = encoder.transform(&df).unwrap();
        assert_eq!(
            a.column("town_encoded").unwrap().i64().unwrap().get(0),
            b.column("town_encoded").unwrap().i64().unwrap().get(0),
        );
    }

    #[test]
    fn test_unseen_category_fails() {
        let df = category_frame();
        let mut encoder = CategoryEncoder::new();
        encoder.fit(&df, &["town"]).unwrap();

        let err = encoder.encode_value("town", "ATLANTIS").unwrap_err();
        match err {
            ForecastError::UnknownCategory { column, value } => {
                assert_eq!(column, "town");
                assert_eq!(value, "ATLANTIS");
            }
            other => panic!("expected UnknownCategory, got {other:?}"),
        }
    }

    #[test]
    fn test_transform_unseen_in_frame_fails() {
        let df = category_frame();
        let mut encoder = CategoryEncoder::new();
        encoder.fit(&df, &["town"]).unwrap();

        let unseen = DataFrame::new(vec![Series::new("town".into(), &["ATLANTIS"]).into()]).unwrap();
        assert!(matches!(
            encoder.transform(&unseen),
            Err(ForecastError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_unfitted_transform_fails() {
        let encoder = CategoryEncoder::new();
        let df = category_frame();
        assert!(matches!(
            encoder.transform(&df),
            Err(ForecastError::ModelNotFitted)
        ));
    }
}
