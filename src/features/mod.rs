//! Feature derivation for transaction records
//!
//! Turns raw transaction rows into the enriched feature table the model is
//! fit against. Row-level features (time parts, age, ratios, storey midpoint)
//! depend only on the row itself; grouped statistics, interactions, and
//! rolling means are added by [`enrich`](FeatureDeriver::enrich) on top.

mod aggregates;

pub use aggregates::GroupStatistics;

use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

/// Derives enriched feature columns from raw transaction rows.
///
/// Never removes rows; output has the same height as the input. The deriver
/// is leakage-agnostic: grouped statistics are computed over whatever
/// `stats_source` table the caller passes to [`enrich`](Self::enrich), so the
/// caller controls whether aggregates see all history or only history up to
/// the training cutoff.
#[derive(Debug, Clone, Default)]
pub struct FeatureDeriver;

impl FeatureDeriver {
    pub fn new() -> Self {
        Self
    }

    /// Add row-level derived columns: year, month_num, quarter, property_age,
    /// remaining_lease, price_per_sqm, storey_low/high, avg_storey.
    pub fn row_features(&self, df: &DataFrame) -> Result<DataFrame> {
        let n = df.height();

        let months = str_column(df, "month")?;
        let mut years = Vec::with_capacity(n);
        let mut month_nums = Vec::with_capacity(n);
        let mut quarters = Vec::with_capacity(n);
        for m in &months {
            let (year, month_num) = parse_month(m)?;
            years.push(year);
            month_nums.push(month_num);
            quarters.push((month_num - 1) / 3 + 1);
        }

        let lease_years = i32_column(df, "lease_commence_date")?;
        let property_age: Vec<i32> = years
            .iter()
            .zip(lease_years.iter())
            .map(|(y, l)| y - l)
            .collect();
        let remaining_lease: Vec<i32> = property_age.iter().map(|a| 99 - a).collect();

        let prices = f64_column(df, "resale_price")?;
        let areas = f64_column(df, "floor_area_sqm")?;
        let price_per_sqm: Vec<f64> = prices
            .iter()
            .zip(areas.iter())
            .map(|(p, a)| p / a)
            .collect();

        let storey_ranges = str_column(df, "storey_range")?;
        let mut storey_low = Vec::with_capacity(n);
        let mut storey_high = Vec::with_capacity(n);
        let mut avg_storey = Vec::with_capacity(n);
        for s in &storey_ranges {
            let (low, high) = parse_storey_range(s)?;
            storey_low.push(low);
            storey_high.push(high);
            avg_storey.push((low + high) as f64 / 2.0);
        }

        let mut result = df.clone();
        for series in [
            Series::new("year".into(), years),
            Series::new("month_num".into(), month_nums),
            Series::new("quarter".into(), quarters),
            Series::new("property_age".into(), property_age),
            Series::new("remaining_lease".into(), remaining_lease),
            Series::new("price_per_sqm".into(), price_per_sqm),
            Series::new("storey_low".into(), storey_low),
            Series::new("storey_high".into(), storey_high),
            Series::new("avg_storey".into(), avg_storey),
        ] {
            result = result.with_column(series)?.clone();
        }

        Ok(result)
    }

    /// Add grouped statistics, interaction terms, and per-town rolling means.
    ///
    /// Both `df` and `stats_source` must already carry row-level features.
    /// Grouped statistics are computed over `stats_source`; rolling means are
    /// trailing windows over `df`'s own rows (month-ascending within each
    /// town), so they only look backwards regardless of the stats source.
    pub fn enrich(&self, df: &DataFrame, stats_source: &DataFrame) -> Result<DataFrame> {
        let stats = GroupStatistics::compute(stats_source)?;
        let result = stats.attach(df)?;
        let result = aggregates::add_interactions(&result)?;
        aggregates::add_rolling_means(&result)
    }

    /// Full derivation over a raw table: row features, then enrichment with
    /// grouped statistics computed over the same table.
    pub fn derive(&self, df: &DataFrame) -> Result<DataFrame> {
        let base = self.row_features(df)?;
        self.enrich(&base, &base)
    }
}

/// Parse a "YYYY-MM" month string into (year, month number)
pub(crate) fn parse_month(s: &str) -> Result<(i32, i32)> {
    let date = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
        .map_err(|e| ForecastError::DataError(format!("unparsable month '{s}': {e}")))?;
    Ok((date.year(), date.month() as i32))
}

/// Parse a "LOW TO HIGH" storey range into its two bounds.
/// The format is fixed: exactly two integer tokens joined by " TO ".
pub fn parse_storey_range(s: &str) -> Result<(i32, i32)> {
    let mut parts = s.split(" TO ");
    match (parts.next(), parts.next(), parts.next()) {
        (Some(low), Some(high), None) => {
            let low = low
                .trim()
                .parse::<i32>()
                .map_err(|_| ForecastError::MalformedRange(s.to_string()))?;
            let high = high
                .trim()
                .parse::<i32>()
                .map_err(|_| ForecastError::MalformedRange(s.to_string()))?;
            Ok((low, high))
        }
        _ => Err(ForecastError::MalformedRange(s.to_string())),
    }
}

/// Extract a column as `Vec<f64>`, casting integers if needed. Nulls error.
pub(crate) fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| ForecastError::FeatureNotFound(name.to_string()))?;
    let casted = column
        .cast(&DataType::Float64)
        .map_err(|e| ForecastError::DataError(e.to_string()))?;
    let ca = casted
        .as_materialized_series()
        .f64()
        .map_err(|e| ForecastError::DataError(e.to_string()))?;
    ca.into_iter()
        .map(|v| v.ok_or_else(|| ForecastError::DataError(format!("null value in column '{name}'"))))
        .collect()
}

/// Extract a column as `Vec<i32>`. Nulls error.
pub(crate) fn i32_column(df: &DataFrame, name: &str) -> Result<Vec<i32>> {
    let column = df
        .column(name)
        .map_err(|_| ForecastError::FeatureNotFound(name.to_string()))?;
    let casted = column
        .cast(&DataType::Int32)
        .map_err(|e| ForecastError::DataError(e.to_string()))?;
    let ca = casted
        .as_materialized_series()
        .i32()
        .map_err(|e| ForecastError::DataError(e.to_string()))?;
    ca.into_iter()
        .map(|v| v.ok_or_else(|| ForecastError::DataError(format!("null value in column '{name}'"))))
        .collect()
}

/// Extract a column as `Vec<String>`. Nulls error.
pub(crate) fn str_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = df
        .column(name)
        .map_err(|_| ForecastError::FeatureNotFound(name.to_string()))?;
    let ca = column
        .as_materialized_series()
        .str()
        .map_err(|e| ForecastError::DataError(e.to_string()))?;
    ca.into_iter()
        .map(|v| {
            v.map(|s| s.to_string())
                .ok_or_else(|| ForecastError::DataError(format!("null value in column '{name}'")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_transactions;

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2020-07").unwrap(), (2020, 7));
        assert!(parse_month("July 2020").is_err());
    }

    #[test]
    fn test_storey_midpoint_exact() {
        let (low, high) = parse_storey_range("04 TO 06").unwrap();
        assert_eq!((low, high), (4, 6));
        assert_eq!((low + high) as f64 / 2.0, 5.0);

        let (low, high) = parse_storey_range("10 TO 12").unwrap();
        assert_eq!((low + high) as f64 / 2.0, 11.0);
    }

    #[test]
    fn test_storey_malformed() {
        for bad in ["4-6", "04 TO", "04 TO 06 TO 08", "LOW TO HIGH", ""] {
            let err = parse_storey_range(bad).unwrap_err();
            assert!(
                matches!(err, ForecastError::MalformedRange(_)),
                "expected MalformedRange for {bad:?}"
            );
        }
    }

    #[test]
    fn test_row_features() {
        let df = sample_transactions();
        let derived = FeatureDeriver::new().row_features(&df).unwrap();

        assert_eq!(derived.height(), df.height());

        let years = i32_column(&derived, "year").unwrap();
        assert_eq!(years[0], 2020);
        let quarters = i32_column(&derived, "quarter").unwrap();
        assert_eq!(quarters[0], 1);

        // property_age = year - lease_commence_date, remaining = 99 - age
        let ages = i32_column(&derived, "property_age").unwrap();
        let remaining = i32_column(&derived, "remaining_lease").unwrap();
        assert_eq!(ages[0], 20);
        assert_eq!(remaining[0], 79);

        let midpoints = f64_column(&derived, "avg_storey").unwrap();
        assert_eq!(midpoints[0], 5.0);
    }

    #[test]
    fn test_derive_preserves_row_count() {
        let df = sample_transactions();
        let enriched = FeatureDeriver::new().derive(&df).unwrap();
        assert_eq!(enriched.height(), df.height());
        // all feature columns present
        for col in crate::schema::FEATURE_COLUMNS {
            if col.ends_with("_encoded") {
                continue; // added by the encoder, not the deriver
            }
            assert!(enriched.column(col).is_ok(), "missing column {col}");
        }
    }
}
