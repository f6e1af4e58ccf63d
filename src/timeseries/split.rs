//! Cutoff-year train/eval partition

use crate::error::Result;
use crate::features::i32_column;
use polars::prelude::*;

/// Partition `df` into (train, eval) by `year < cutoff` vs `year >= cutoff`.
///
/// Every row lands in exactly one side and row order is preserved. No
/// shuffling, as required by the time-ordered cross-validation downstream.
pub fn split_by_year(df: &DataFrame, cutoff: i32) -> Result<(DataFrame, DataFrame)> {
    let years = i32_column(df, "year")?;

    let train_mask: BooleanChunked = years.iter().map(|&y| y < cutoff).collect();
    let eval_mask: BooleanChunked = years.iter().map(|&y| y >= cutoff).collect();

    let train = df.filter(&train_mask)?;
    let eval = df.filter(&eval_mask)?;
    Ok((train, eval))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::f64_column;

    fn year_frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new("year".into(), &[2019i32, 2020, 2023, 2024, 2025, 2020]).into(),
            Series::new("resale_price".into(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_strict_partition() {
        let df = year_frame();
        let (train, eval) = split_by_year(&df, 2024).unwrap();

        assert_eq!(train.height() + eval.height(), df.height());

        for &y in &i32_column(&train, "year").unwrap() {
            assert!(y < 2024);
        }
        for &y in &i32_column(&eval, "year").unwrap() {
            assert!(y >= 2024);
        }
    }

    #[test]
    fn test_order_preserved() {
        let df = year_frame();
        let (train, _) = split_by_year(&df, 2024).unwrap();
        // rows keep their original relative order: 1.0, 2.0, 3.0, 6.0
        let prices = f64_column(&train, "resale_price").unwrap();
        assert_eq!(prices, vec![1.0, 2.0, 3.0, 6.0]);
    }

    #[test]
    fn test_cutoff_row_goes_to_eval() {
        let df = year_frame();
        let (_, eval) = split_by_year(&df, 2024).unwrap();
        let years = i32_column(&eval, "year").unwrap();
        assert!(years.contains(&2024));
    }

    #[test]
    fn test_empty_side_is_fine() {
        let df = year_frame();
        let (train, eval) = split_by_year(&df, 1990).unwrap();
        assert_eq!(train.height(), 0);
        assert_eq!(eval.height(), df.height());
    }
}
