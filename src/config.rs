//! Pipeline configuration

use crate::preprocessing::ScalerType;
use crate::training::ParamGrid;
use serde::{Deserialize, Serialize};

/// Configuration for the end-to-end forecasting pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Rows with `year < cutoff_year` train the model; the rest evaluate it
    pub cutoff_year: i32,
    /// First year of the future projection horizon (inclusive)
    pub horizon_start: i32,
    /// Last year of the future projection horizon (inclusive)
    pub horizon_end: i32,
    /// Expected fraction of anomalous rows for the outlier filter
    pub contamination: f64,
    /// Scaling strategy for numeric features
    pub scaler_type: ScalerType,
    /// When true, grouped statistics are computed only from pre-cutoff rows.
    /// The default (false) reproduces the observed behavior of computing them
    /// over the full table, which leaks evaluation-period information into
    /// training features.
    pub train_only_aggregates: bool,
    /// Number of time-series CV splits for the grid search
    pub cv_splits: usize,
    /// Hyperparameter grid
    pub grid: ParamGrid,
    /// Seed threaded through every randomized component
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cutoff_year: 2024,
            horizon_start: 2025,
            horizon_end: 2045,
            contamination: 0.01,
            scaler_type: ScalerType::Robust,
            train_only_aggregates: false,
            cv_splits: 5,
            grid: ParamGrid::default(),
            seed: 42,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the train/eval cutoff year
    pub fn with_cutoff_year(mut self, year: i32) -> Self {
        self.cutoff_year = year;
        self
    }

    /// Set the projection horizon (inclusive on both ends)
    pub fn with_horizon(mut self, start: i32, end: i32) -> Self {
        self.horizon_start = start;
        self.horizon_end = end;
        self
    }

    /// Set the outlier contamination fraction
    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination.clamp(0.0, 0.5);
        self
    }

    /// Set the scaler strategy
    pub fn with_scaler(mut self, scaler_type: ScalerType) -> Self {
        self.scaler_type = scaler_type;
        self
    }

    /// Restrict grouped statistics to pre-cutoff rows
    pub fn with_train_only_aggregates(mut self, enabled: bool) -> Self {
        self.train_only_aggregates = enabled;
        self
    }

    /// Set the number of CV splits
    pub fn with_cv_splits(mut self, n: usize) -> Self {
        self.cv_splits = n.max(2);
        self
    }

    /// Set the hyperparameter grid
    pub fn with_grid(mut self, grid: ParamGrid) -> Self {
        self.grid = grid;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.cutoff_year, 2024);
        assert_eq!(config.horizon_start, 2025);
        assert_eq!(config.horizon_end, 2045);
        assert!((config.contamination - 0.01).abs() < 1e-12);
        assert!(!config.train_only_aggregates);
    }

    #[test]
    fn test_contamination_clamped() {
        let config = PipelineConfig::new().with_contamination(0.9);
        assert!(config.contamination <= 0.5);
    }
}
