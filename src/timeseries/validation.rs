//! Time-ordered cross-validation
//!
//! Folds are expanding windows: fold k trains on the first part of the data
//! and validates on the slice immediately after it. Validation rows are
//! always chronologically after every training row of the same fold, which
//! is the correctness property the grid search depends on.

use serde::{Deserialize, Serialize};

/// One train/validation split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeriesSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold: usize,
}

/// Time-series cross-validator over `n_samples` chronologically ordered rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeriesCV {
    n_splits: usize,
    max_train_size: Option<usize>,
}

impl TimeSeriesCV {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits: n_splits.max(2),
            max_train_size: None,
        }
    }

    /// Cap the training window (sliding instead of expanding)
    pub fn with_max_train_size(mut self, size: usize) -> Self {
        self.max_train_size = Some(size.max(1));
        self
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Generate splits. Returns an empty vec when `n_samples` is too small
    /// to give every fold a non-empty train and test slice; the caller
    /// decides whether that is an error.
    pub fn split(&self, n_samples: usize) -> Vec<TimeSeriesSplit> {
        let test_size = n_samples / (self.n_splits + 1);
        if test_size == 0 {
            return Vec::new();
        }

        let mut splits = Vec::with_capacity(self.n_splits);
        for fold in 0..self.n_splits {
            let test_start = (fold + 1) * test_size;
            let test_end = if fold == self.n_splits - 1 {
                n_samples
            } else {
                test_start + test_size
            };

            let train_start = match self.max_train_size {
                Some(max) => test_start.saturating_sub(max),
                None => 0,
            };

            splits.push(TimeSeriesSplit {
                train_indices: (train_start..test_start).collect(),
                test_indices: (test_start..test_end).collect(),
                fold,
            });
        }

        splits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_follows_training() {
        let cv = TimeSeriesCV::new(5);
        let splits = cv.split(60);
        assert_eq!(splits.len(), 5);

        for split in &splits {
            assert!(!split.train_indices.is_empty());
            assert!(!split.test_indices.is_empty());
            let last_train = *split.train_indices.last().unwrap();
            let first_test = *split.test_indices.first().unwrap();
            assert!(last_train < first_test, "fold {}", split.fold);
        }
    }

    #[test]
    fn test_expanding_window() {
        let cv = TimeSeriesCV::new(3);
        let splits = cv.split(40);

        for pair in splits.windows(2) {
            assert!(pair[1].train_indices.len() > pair[0].train_indices.len());
        }
    }

    #[test]
    fn test_sliding_window() {
        let cv = TimeSeriesCV::new(3).with_max_train_size(5);
        let splits = cv.split(40);
        for split in &splits {
            assert!(split.train_indices.len() <= 5);
        }
    }

    #[test]
    fn test_too_few_samples_gives_no_splits() {
        let cv = TimeSeriesCV::new(5);
        assert!(cv.split(4).is_empty());
        assert!(cv.split(0).is_empty());
    }

    #[test]
    fn test_last_fold_reaches_end() {
        let cv = TimeSeriesCV::new(4);
        let splits = cv.split(47);
        assert_eq!(*splits.last().unwrap().test_indices.last().unwrap(), 46);
    }
}
