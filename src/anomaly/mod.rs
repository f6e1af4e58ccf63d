//! Outlier detection over the transaction table
//!
//! A multivariate isolation forest scores each row over a fixed feature
//! subset (price, area, price-per-area); the highest-scoring
//! `floor(contamination * n)` rows are flagged as outliers. Flagged rows are
//! excluded from model training only; they stay in the table and remain
//! visible to any statistic computed before filtering.

mod isolation_forest;

pub use isolation_forest::IsolationForest;

use crate::error::Result;
use crate::features::f64_column;
use crate::schema::OUTLIER_COLUMNS;
use ndarray::Array2;
use polars::prelude::*;

/// Flags anomalous rows without removing them.
#[derive(Debug, Clone)]
pub struct OutlierFilter {
    contamination: f64,
    seed: u64,
}

impl OutlierFilter {
    /// `contamination` is the expected fraction of anomalous rows; exactly
    /// `floor(contamination * n)` rows get flagged, so 0.0 flags none.
    pub fn new(contamination: f64, seed: u64) -> Self {
        Self {
            contamination: contamination.clamp(0.0, 0.5),
            seed,
        }
    }

    /// Per-row inlier mask over `df` (true = keep for training).
    pub fn inlier_mask(&self, df: &DataFrame) -> Result<BooleanChunked> {
        let n = df.height();
        let n_outliers = (self.contamination * n as f64).floor() as usize;

        if n_outliers == 0 || n == 0 {
            let mask: BooleanChunked = std::iter::repeat(true).take(n).collect();
            return Ok(mask.with_name("is_inlier".into()));
        }

        let mut data = Vec::with_capacity(n * OUTLIER_COLUMNS.len());
        let columns: Vec<Vec<f64>> = OUTLIER_COLUMNS
            .iter()
            .map(|c| f64_column(df, c))
            .collect::<Result<Vec<_>>>()?;
        for i in 0..n {
            for col in &columns {
                data.push(col[i]);
            }
        }
        let x = Array2::from_shape_vec((n, OUTLIER_COLUMNS.len()), data)?;

        let mut forest = IsolationForest::new().with_seed(self.seed);
        forest.fit(&x)?;
        let scores = forest.score_samples(&x)?;

        // indices of the n_outliers highest scores
        let mut ranked: Vec<usize> = (0..n).collect();
        ranked.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut inlier = vec![true; n];
        for &idx in ranked.iter().take(n_outliers) {
            inlier[idx] = false;
        }

        let mask: BooleanChunked = inlier.into_iter().collect();
        Ok(mask.with_name("is_inlier".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price_frame() -> DataFrame {
        // 49 ordinary rows and one implausible one
        let mut prices: Vec<f64> = (0..49).map(|i| 400_000.0 + (i as f64) * 1_000.0).collect();
        let mut areas: Vec<f64> = (0..49).map(|i| 90.0 + (i % 5) as f64).collect();
        prices.push(9_000_000.0);
        areas.push(30.0);
        let pps: Vec<f64> = prices.iter().zip(&areas).map(|(p, a)| p / a).collect();

        DataFrame::new(vec![
            Series::new("resale_price".into(), prices).into(),
            Series::new("floor_area_sqm".into(), areas).into(),
            Series::new("price_per_sqm".into(), pps).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_zero_contamination_flags_nothing() {
        let df = price_frame();
        let filter = OutlierFilter::new(0.0, 42);
        let mask = filter.inlier_mask(&df).unwrap();
        assert_eq!(mask.sum().unwrap() as usize, df.height());
    }

    #[test]
    fn test_flags_expected_count() {
        let df = price_frame();
        let filter = OutlierFilter::new(0.04, 42);
        let mask = filter.inlier_mask(&df).unwrap();
        // floor(0.04 * 50) = 2 rows flagged
        assert_eq!(df.height() - mask.sum().unwrap() as usize, 2);
    }

    #[test]
    fn test_extreme_row_flagged() {
        let df = price_frame();
        let filter = OutlierFilter::new(0.02, 42);
        let mask = filter.inlier_mask(&df).unwrap();
        // the implausible last row is the single flagged one
        assert_eq!(mask.get(df.height() - 1), Some(false));
        assert_eq!(df.height() - mask.sum().unwrap() as usize, 1);
    }

    #[test]
    fn test_mask_reproducible() {
        let df = price_frame();
        let filter = OutlierFilter::new(0.1, 7);
        let a = filter.inlier_mask(&df).unwrap();
        let b = filter.inlier_mask(&df).unwrap();
        for i in 0..df.height() {
            assert_eq!(a.get(i), b.get(i));
        }
    }
}
