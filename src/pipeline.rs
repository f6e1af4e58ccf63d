//! End-to-end orchestration: derive, encode, filter, split, scale, search,
//! evaluate, project.

use crate::anomaly::OutlierFilter;
use crate::config::PipelineConfig;
use crate::error::{ForecastError, Result};
use crate::evaluation::{rank_features, RegressionReport};
use crate::features::{f64_column, i32_column, FeatureDeriver};
use crate::forecast::{FutureProjector, ModelArtifact};
use crate::preprocessing::{CategoryEncoder, Scaler};
use crate::schema::{CATEGORICAL_COLUMNS, FEATURE_COLUMNS, TARGET_COLUMN};
use crate::timeseries::{split_by_year, TimeSeriesCV};
use crate::training::GridSearch;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use tracing::{info, warn};

/// Everything a pipeline run produces
#[derive(Debug)]
pub struct PipelineOutcome {
    pub artifact: ModelArtifact,
    /// Held-out metrics; `None` when no row reached the evaluation partition
    pub evaluation: Option<RegressionReport>,
    /// Feature importances, descending
    pub ranked_features: Vec<(String, f64)>,
    /// Mean cross-validated MSE of the winning configuration
    pub cv_score: f64,
    /// One row per (town, flat type, year, quarter) over the projection
    /// horizon
    pub projections: DataFrame,
    /// The enriched, encoded historical table after outlier removal, for
    /// external reporting alongside the projections
    pub history: DataFrame,
    pub rows_flagged: usize,
    pub train_rows: usize,
    pub eval_rows: usize,
}

/// The full forecasting pipeline. Construct with a [`PipelineConfig`] and
/// feed it the raw transaction table.
pub struct ForecastPipeline {
    config: PipelineConfig,
}

impl ForecastPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline over raw transactions.
    pub fn run(&self, raw: &DataFrame) -> Result<PipelineOutcome> {
        let cfg = &self.config;
        info!(rows = raw.height(), "starting pipeline run");

        // row-level features, then enrichment with grouped statistics
        let deriver = FeatureDeriver::new();
        let base = deriver.row_features(raw)?;

        let enriched = if cfg.train_only_aggregates {
            let (stats_source, _) = split_by_year(&base, cfg.cutoff_year)?;
            if stats_source.height() == 0 {
                return Err(ForecastError::InsufficientData(format!(
                    "no rows before cutoff year {} to compute statistics from",
                    cfg.cutoff_year
                )));
            }
            deriver.enrich(&base, &stats_source)?
        } else {
            deriver.enrich(&base, &base)?
        };

        // categorical codes over the full observed universe
        let mut encoder = CategoryEncoder::new();
        let encoded = encoder.fit_transform(&enriched, &CATEGORICAL_COLUMNS)?;

        // flag and drop anomalous rows
        let filter = OutlierFilter::new(cfg.contamination, cfg.seed);
        let mask = filter.inlier_mask(&encoded)?;
        let rows_flagged = encoded.height() - mask.sum().unwrap_or(0) as usize;
        let clean = encoded.filter(&mask)?;
        info!(rows_flagged, rows_kept = clean.height(), "outlier filter applied");

        // chronological order within the table, then the cutoff partition
        let clean = sort_by_time(&clean)?;
        let (train, eval) = split_by_year(&clean, cfg.cutoff_year)?;
        info!(
            train_rows = train.height(),
            eval_rows = eval.height(),
            cutoff = cfg.cutoff_year,
            "train/eval partition"
        );
        if train.height() == 0 {
            return Err(ForecastError::InsufficientData(format!(
                "no training rows before cutoff year {}",
                cfg.cutoff_year
            )));
        }

        // scaler sees the training partition only
        let mut scaler = Scaler::new(cfg.scaler_type);
        scaler.fit(&train, &FEATURE_COLUMNS)?;
        let train_scaled = scaler.transform(&train)?;

        let x_train = to_feature_matrix(&train_scaled, &FEATURE_COLUMNS)?;
        let y_train = Array1::from_vec(f64_column(&train, TARGET_COLUMN)?);

        let search = GridSearch::new(cfg.grid.clone(), TimeSeriesCV::new(cfg.cv_splits))
            .with_seed(cfg.seed);
        let result = search.run(&x_train, &y_train)?;
        info!(params = ?result.best_params, cv_mse = result.best_score, "model selected");

        let artifact = ModelArtifact {
            params: *result.model.params(),
            model: result.model,
            scaler,
            encoder,
            feature_columns: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
        };

        // held-out evaluation
        let evaluation = if eval.height() > 0 {
            let eval_scaled = artifact.scaler.transform(&eval)?;
            let x_eval = to_feature_matrix(&eval_scaled, &FEATURE_COLUMNS)?;
            let y_eval = Array1::from_vec(f64_column(&eval, TARGET_COLUMN)?);
            let predictions = artifact.model.predict(&x_eval)?;
            let report = RegressionReport::compute(&y_eval, &predictions)?;
            info!(rmse = report.rmse, mae = report.mae, r2 = report.r2, "held-out evaluation");
            Some(report)
        } else {
            warn!("no rows at or after the cutoff year; skipping evaluation");
            None
        };

        let importances = artifact
            .model
            .feature_importances()
            .ok_or(ForecastError::ModelNotFitted)?;
        let ranked_features = rank_features(&FEATURE_COLUMNS, importances)?;

        // project the horizon from the cleaned, unscaled history
        let projector = FutureProjector::new(&artifact);
        let projections = projector.project(&clean, cfg.horizon_start, cfg.horizon_end)?;
        info!(projection_rows = projections.height(), "horizon projected");

        Ok(PipelineOutcome {
            evaluation,
            ranked_features,
            cv_score: result.best_score,
            projections,
            rows_flagged,
            train_rows: train.height(),
            eval_rows: eval.height(),
            artifact,
            history: clean,
        })
    }
}

/// Stable sort by (year, month_num); the time-ordered cross-validation
/// downstream assumes chronological rows.
pub fn sort_by_time(df: &DataFrame) -> Result<DataFrame> {
    let years = i32_column(df, "year")?;
    let months = i32_column(df, "month_num")?;

    let mut order: Vec<usize> = (0..df.height()).collect();
    order.sort_by(|&a, &b| (years[a], months[a]).cmp(&(years[b], months[b])));

    let idx: IdxCa = order.iter().map(|&i| Some(i as IdxSize)).collect();
    Ok(df.take(&idx)?)
}

/// Extract the named columns into a row-major feature matrix.
pub fn to_feature_matrix(df: &DataFrame, columns: &[&str]) -> Result<Array2<f64>> {
    let n = df.height();
    let values: Vec<Vec<f64>> = columns
        .iter()
        .map(|c| f64_column(df, c))
        .collect::<Result<Vec<_>>>()?;

    let mut data = Vec::with_capacity(n * columns.len());
    for i in 0..n {
        for col in &values {
            data.push(col[i]);
        }
    }
    Ok(Array2::from_shape_vec((n, columns.len()), data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_feature_matrix_shape_and_order() {
        let df = DataFrame::new(vec![
            Series::new("a".into(), &[1.0, 2.0, 3.0]).into(),
            Series::new("b".into(), &[10.0, 20.0, 30.0]).into(),
        ])
        .unwrap();

        let x = to_feature_matrix(&df, &["b", "a"]).unwrap();
        assert_eq!(x.shape(), &[3, 2]);
        assert_eq!(x[[0, 0]], 10.0);
        assert_eq!(x[[0, 1]], 1.0);
        assert_eq!(x[[2, 0]], 30.0);
    }

    #[test]
    fn test_to_feature_matrix_missing_column() {
        let df = DataFrame::new(vec![Series::new("a".into(), &[1.0]).into()]).unwrap();
        assert!(matches!(
            to_feature_matrix(&df, &["a", "nope"]),
            Err(ForecastError::FeatureNotFound(_))
        ));
    }

    #[test]
    fn test_sort_by_time() {
        let df = DataFrame::new(vec![
            Series::new("year".into(), &[2021i32, 2019, 2020, 2019]).into(),
            Series::new("month_num".into(), &[1i32, 6, 3, 2]).into(),
        ])
        .unwrap();

        let sorted = sort_by_time(&df).unwrap();
        let years = i32_column(&sorted, "year").unwrap();
        let months = i32_column(&sorted, "month_num").unwrap();
        assert_eq!(years, vec![2019, 2019, 2020, 2021]);
        assert_eq!(months, vec![2, 6, 3, 1]);
    }
}
