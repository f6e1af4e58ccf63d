//! Exhaustive hyperparameter search with time-ordered validation

use crate::error::{ForecastError, Result};
use crate::timeseries::TimeSeriesCV;
use super::random_forest::{ForestParams, ForestRegressor, MaxFeatures};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Candidate values for each forest hyperparameter. The cartesian product
/// of the lists is the search space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamGrid {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<Option<usize>>,
    pub min_samples_split: Vec<usize>,
    pub min_samples_leaf: Vec<usize>,
    pub max_features: Vec<MaxFeatures>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![200, 500],
            max_depth: vec![Some(10), Some(15), Some(20)],
            min_samples_split: vec![2, 5],
            min_samples_leaf: vec![1, 2],
            max_features: vec![MaxFeatures::Sqrt, MaxFeatures::Log2],
        }
    }
}

impl ParamGrid {
    /// A small grid for tests and smoke runs
    pub fn minimal() -> Self {
        Self {
            n_estimators: vec![10],
            max_depth: vec![Some(5)],
            min_samples_split: vec![2],
            min_samples_leaf: vec![1],
            max_features: vec![MaxFeatures::Sqrt],
        }
    }

    /// Enumerate every configuration in the grid
    pub fn expand(&self) -> Vec<ForestParams> {
        let mut configs = Vec::new();
        for &n_estimators in &self.n_estimators {
            for &max_depth in &self.max_depth {
                for &min_samples_split in &self.min_samples_split {
                    for &min_samples_leaf in &self.min_samples_leaf {
                        for &max_features in &self.max_features {
                            configs.push(ForestParams {
                                n_estimators,
                                max_depth,
                                min_samples_split,
                                min_samples_leaf,
                                max_features,
                            });
                        }
                    }
                }
            }
        }
        configs
    }

    pub fn len(&self) -> usize {
        self.n_estimators.len()
            * self.max_depth.len()
            * self.min_samples_split.len()
            * self.min_samples_leaf.len()
            * self.max_features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of a grid search: the refit model, its configuration, and the
/// cross-validated score that selected it.
#[derive(Debug)]
pub struct SearchResult {
    pub model: ForestRegressor,
    pub best_params: ForestParams,
    pub best_score: f64,
}

/// Grid search over `ParamGrid` with time-ordered cross-validation.
/// Every (configuration, fold) pair is evaluated in parallel; the winner
/// by mean validation MSE is refit on the whole training partition.
#[derive(Debug, Clone)]
pub struct GridSearch {
    grid: ParamGrid,
    cv: TimeSeriesCV,
    seed: u64,
}

impl GridSearch {
    pub fn new(grid: ParamGrid, cv: TimeSeriesCV) -> Self {
        Self { grid, cv, seed: 42 }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn run(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<SearchResult> {
        let configs = self.grid.expand();
        if configs.is_empty() {
            return Err(ForecastError::ConfigError(
                "hyperparameter grid is empty".to_string(),
            ));
        }

        let folds = self.cv.split(x.nrows());
        if folds.is_empty() {
            return Err(ForecastError::InsufficientData(format!(
                "{} training rows cannot fill {} time-ordered folds",
                x.nrows(),
                self.cv.n_splits()
            )));
        }

        info!(
            configurations = configs.len(),
            folds = folds.len(),
            rows = x.nrows(),
            "starting grid search"
        );

        let tasks: Vec<(usize, usize)> = (0..configs.len())
            .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
            .collect();

        let fold_mses: Vec<(usize, f64)> = tasks
            .par_iter()
            .map(|&(config_idx, fold_idx)| {
                let params = configs[config_idx];
                let fold = &folds[fold_idx];

                let x_train = x.select(Axis(0), &fold.train_indices);
                let y_train = Array1::from_vec(
                    fold.train_indices.iter().map(|&i| y[i]).collect(),
                );
                let x_val = x.select(Axis(0), &fold.test_indices);
                let y_val = Array1::from_vec(
                    fold.test_indices.iter().map(|&i| y[i]).collect(),
                );

                let mut forest = ForestRegressor::new(params).with_seed(self.seed);
                forest.fit(&x_train, &y_train)?;
                let predictions = forest.predict(&x_val)?;

                let mse = predictions
                    .iter()
                    .zip(y_val.iter())
                    .map(|(p, a)| (p - a).powi(2))
                    .sum::<f64>()
                    / y_val.len() as f64;

                Ok((config_idx, mse))
            })
            .collect::<Result<Vec<_>>>()?;

        // mean MSE per configuration
        let mut sums = vec![0.0; configs.len()];
        let mut counts = vec![0usize; configs.len()];
        for (config_idx, mse) in fold_mses {
            sums[config_idx] += mse;
            counts[config_idx] += 1;
        }

        let (best_idx, best_score) = sums
            .iter()
            .zip(counts.iter())
            .enumerate()
            .map(|(i, (&sum, &count))| (i, sum / count as f64))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .ok_or_else(|| {
                ForecastError::InsufficientData("no configuration was scored".to_string())
            })?;

        let best_params = configs[best_idx];
        debug!(?best_params, best_score, "grid search winner");

        let mut model = ForestRegressor::new(best_params).with_seed(self.seed);
        model.fit(x, y)?;

        Ok(SearchResult {
            model,
            best_params,
            best_score,
        })
    }
}
