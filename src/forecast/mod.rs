//! Future price projection
//!
//! Projects resale prices over a multi-year horizon by synthesizing a feature
//! row per (town, flat type) pair, year, and quarter. Each synthesized row
//! starts from the pair's most recent transaction: time-dependent features
//! (year, quarter, property age, remaining lease, and the interactions
//! touching the lease) are advanced, everything else is carried forward.
//! Projecting onto the latest transaction's own year and quarter therefore
//! reproduces that row's features exactly.

use crate::error::{ForecastError, Result};
use crate::features::{f64_column, i32_column, str_column};
use crate::preprocessing::{CategoryEncoder, Scaler};
use crate::schema::FEATURE_COLUMNS;
use crate::training::{ForestParams, ForestRegressor};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{debug, info};

/// Everything needed to score new rows: the refit forest, its winning
/// hyperparameters, and the fitted preprocessing state.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model: ForestRegressor,
    pub params: ForestParams,
    pub scaler: Scaler,
    pub encoder: CategoryEncoder,
    pub feature_columns: Vec<String>,
}

impl ModelArtifact {
    /// Serialize to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        info!(path = %path.as_ref().display(), "saved model artifact");
        Ok(())
    }

    /// Deserialize from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let artifact = serde_json::from_reader(BufReader::new(file))?;
        info!(path = %path.as_ref().display(), "loaded model artifact");
        Ok(artifact)
    }
}

/// Projects prices over a future horizon from historical transactions.
pub struct FutureProjector<'a> {
    artifact: &'a ModelArtifact,
}

impl<'a> FutureProjector<'a> {
    pub fn new(artifact: &'a ModelArtifact) -> Self {
        Self { artifact }
    }

    /// Project every (town, flat type) pair over each quarter of `start..=end`.
    ///
    /// `history` must be the enriched, encoded, unscaled feature table. Pairs
    /// are enumerated as observed towns x observed flat types, in first
    /// appearance order; combinations with no transactions are skipped. The
    /// output has one row per surviving pair, year, and quarter, carrying the
    /// advanced time fields and a `predicted_price` column.
    pub fn project(&self, history: &DataFrame, start: i32, end: i32) -> Result<DataFrame> {
        if start > end {
            return Err(ForecastError::ConfigError(format!(
                "projection horizon {start}..={end} is empty"
            )));
        }

        let towns = str_column(history, "town")?;
        let flat_types = str_column(history, "flat_type")?;
        let years = i32_column(history, "year")?;
        let months = i32_column(history, "month_num")?;

        let town_order = unique_in_order(&towns);
        let flat_type_order = unique_in_order(&flat_types);

        // latest transaction per (town, flat_type), by (year, month_num)
        let mut latest: HashMap<(String, String), usize> = HashMap::new();
        for i in 0..history.height() {
            let key = (towns[i].clone(), flat_types[i].clone());
            match latest.get(&key) {
                Some(&j) if (years[j], months[j]) >= (years[i], months[i]) => {}
                _ => {
                    latest.insert(key, i);
                }
            }
        }

        let feature_values: Vec<Vec<f64>> = FEATURE_COLUMNS
            .iter()
            .map(|c| f64_column(history, c))
            .collect::<Result<Vec<_>>>()?;

        let mut out_years = Vec::new();
        let mut out_quarters = Vec::new();
        let mut out_towns = Vec::new();
        let mut out_flat_types = Vec::new();
        let mut out_areas = Vec::new();
        let mut out_ages = Vec::new();
        let mut out_leases = Vec::new();
        let mut rows: Vec<f64> = Vec::new();

        for town in &town_order {
            for flat_type in &flat_type_order {
                let Some(&row) = latest.get(&(town.clone(), flat_type.clone())) else {
                    continue;
                };

                let base: HashMap<&str, f64> = FEATURE_COLUMNS
                    .iter()
                    .enumerate()
                    .map(|(i, &name)| (name, feature_values[i][row]))
                    .collect();
                let latest_year = years[row];

                for year in start..=end {
                    let elapsed = (year - latest_year) as f64;
                    for quarter in 1..=4 {
                        let features = self.advance(&base, year, quarter, elapsed)?;
                        rows.extend(features);
                        out_years.push(year);
                        out_quarters.push(quarter);
                        out_towns.push(town.clone());
                        out_flat_types.push(flat_type.clone());
                        out_areas.push(base["floor_area_sqm"]);
                        out_ages.push(base["property_age"] + elapsed);
                        out_leases.push(base["remaining_lease"] - elapsed);
                    }
                }
            }
        }

        if out_years.is_empty() {
            return Err(ForecastError::InsufficientData(
                "no (town, flat type) pair has any transaction history".to_string(),
            ));
        }

        let n = out_years.len();
        let x = Array2::from_shape_vec((n, FEATURE_COLUMNS.len()), rows)?;
        let predictions = self.artifact.model.predict(&x)?;

        debug!(
            pairs = n / (4 * (end - start + 1) as usize),
            rows = n,
            "projected future prices"
        );

        let df = DataFrame::new(vec![
            Series::new("year".into(), out_years).into(),
            Series::new("quarter".into(), out_quarters).into(),
            Series::new("town".into(), out_towns).into(),
            Series::new("flat_type".into(), out_flat_types).into(),
            Series::new("floor_area_sqm".into(), out_areas).into(),
            Series::new("property_age".into(), out_ages).into(),
            Series::new("remaining_lease".into(), out_leases).into(),
            Series::new("predicted_price".into(), predictions.to_vec()).into(),
        ])?;
        Ok(df)
    }

    /// Advance a base feature row to a target year and quarter and scale it.
    /// Time moves the year, quarter, month, age, remaining lease, and the
    /// interactions the lease participates in; every other feature is carried
    /// forward unchanged. The month is the quarter's first month.
    fn advance(
        &self,
        base: &HashMap<&str, f64>,
        year: i32,
        quarter: i32,
        elapsed: f64,
    ) -> Result<Vec<f64>> {
        let lease = base["remaining_lease"] - elapsed;
        let adjusted: HashMap<&str, f64> = [
            ("year", year as f64),
            ("quarter", quarter as f64),
            ("month_num", (quarter * 3 - 2) as f64),
            ("property_age", base["property_age"] + elapsed),
            ("remaining_lease", lease),
            ("lease_storey_interaction", lease * base["avg_storey"]),
            ("area_lease_interaction", base["floor_area_sqm"] * lease),
        ]
        .into_iter()
        .collect();

        FEATURE_COLUMNS
            .iter()
            .map(|&name| {
                let raw = adjusted.get(name).or_else(|| base.get(name)).copied().ok_or_else(
                    || ForecastError::FeatureNotFound(name.to_string()),
                )?;
                self.artifact.scaler.scale_value(name, raw)
            })
            .collect()
    }
}

fn unique_in_order(values: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .iter()
        .filter(|v| seen.insert(v.as_str()))
        .cloned()
        .collect()
}
