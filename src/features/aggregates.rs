//! Grouped statistics, interaction terms, and rolling means

use super::{f64_column, i32_column, str_column};
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-town aggregate statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TownStats {
    price_mean: f64,
    price_std: f64,
    area_mean: f64,
    price_per_sqm_mean: f64,
}

/// Per-flat-type aggregate statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FlatTypeStats {
    price_mean: f64,
    area_mean: f64,
}

/// Grouped statistics computed once over a statistics-source table and
/// attached to any table carrying the same grouping columns.
///
/// A group present in the target table but absent from the source falls back
/// to the source-wide global statistic (possible when the source is
/// restricted to pre-cutoff rows and a town only trades afterwards).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStatistics {
    towns: HashMap<String, TownStats>,
    flat_types: HashMap<String, FlatTypeStats>,
    global_town: TownStats,
    global_flat_type: FlatTypeStats,
}

/// Sample mean and standard deviation (ddof = 1; 0.0 when n < 2)
fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return (mean, 0.0);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    (mean, var.sqrt())
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl GroupStatistics {
    /// Compute statistics over `df`, which must carry row-level features
    /// (`price_per_sqm` in particular).
    pub fn compute(df: &DataFrame) -> Result<Self> {
        let towns = str_column(df, "town")?;
        let flat_types = str_column(df, "flat_type")?;
        let prices = f64_column(df, "resale_price")?;
        let areas = f64_column(df, "floor_area_sqm")?;
        let price_per_sqm = f64_column(df, "price_per_sqm")?;

        let mut town_groups: HashMap<String, (Vec<f64>, Vec<f64>, Vec<f64>)> = HashMap::new();
        let mut flat_type_groups: HashMap<String, (Vec<f64>, Vec<f64>)> = HashMap::new();

        for i in 0..df.height() {
            let t = town_groups.entry(towns[i].clone()).or_default();
            t.0.push(prices[i]);
            t.1.push(areas[i]);
            t.2.push(price_per_sqm[i]);

            let f = flat_type_groups.entry(flat_types[i].clone()).or_default();
            f.0.push(prices[i]);
            f.1.push(areas[i]);
        }

        let town_stats: HashMap<String, TownStats> = town_groups
            .into_iter()
            .map(|(town, (p, a, pps))| {
                let (price_mean, price_std) = mean_std(&p);
                (
                    town,
                    TownStats {
                        price_mean,
                        price_std,
                        area_mean: mean(&a),
                        price_per_sqm_mean: mean(&pps),
                    },
                )
            })
            .collect();

        let flat_type_stats: HashMap<String, FlatTypeStats> = flat_type_groups
            .into_iter()
            .map(|(ft, (p, a))| {
                (
                    ft,
                    FlatTypeStats {
                        price_mean: mean(&p),
                        area_mean: mean(&a),
                    },
                )
            })
            .collect();

        let (global_price_mean, global_price_std) = mean_std(&prices);
        let global_town = TownStats {
            price_mean: global_price_mean,
            price_std: global_price_std,
            area_mean: mean(&areas),
            price_per_sqm_mean: mean(&price_per_sqm),
        };
        let global_flat_type = FlatTypeStats {
            price_mean: global_price_mean,
            area_mean: mean(&areas),
        };

        Ok(Self {
            towns: town_stats,
            flat_types: flat_type_stats,
            global_town,
            global_flat_type,
        })
    }

    /// Map each row's town / flat type to its statistics columns.
    pub fn attach(&self, df: &DataFrame) -> Result<DataFrame> {
        let towns = str_column(df, "town")?;
        let flat_types = str_column(df, "flat_type")?;
        let n = df.height();

        let mut town_price_mean = Vec::with_capacity(n);
        let mut town_price_std = Vec::with_capacity(n);
        let mut town_area_mean = Vec::with_capacity(n);
        let mut town_pps_mean = Vec::with_capacity(n);
        let mut ft_price_mean = Vec::with_capacity(n);
        let mut ft_area_mean = Vec::with_capacity(n);

        for i in 0..n {
            let ts = self.towns.get(&towns[i]).unwrap_or(&self.global_town);
            town_price_mean.push(ts.price_mean);
            town_price_std.push(ts.price_std);
            town_area_mean.push(ts.area_mean);
            town_pps_mean.push(ts.price_per_sqm_mean);

            let fs = self
                .flat_types
                .get(&flat_types[i])
                .unwrap_or(&self.global_flat_type);
            ft_price_mean.push(fs.price_mean);
            ft_area_mean.push(fs.area_mean);
        }

        let mut result = df.clone();
        for series in [
            Series::new("town_price_mean".into(), town_price_mean),
            Series::new("town_price_std".into(), town_price_std),
            Series::new("town_area_mean".into(), town_area_mean),
            Series::new("town_price_per_sqm_mean".into(), town_pps_mean),
            Series::new("flat_type_price_mean".into(), ft_price_mean),
            Series::new("flat_type_area_mean".into(), ft_area_mean),
        ] {
            result = result.with_column(series)?.clone();
        }

        Ok(result)
    }
}

/// Pairwise interaction products: area x storey, lease x storey, area x lease
pub fn add_interactions(df: &DataFrame) -> Result<DataFrame> {
    let areas = f64_column(df, "floor_area_sqm")?;
    let storeys = f64_column(df, "avg_storey")?;
    let leases = f64_column(df, "remaining_lease")?;

    let area_storey: Vec<f64> = areas.iter().zip(&storeys).map(|(a, s)| a * s).collect();
    let lease_storey: Vec<f64> = leases.iter().zip(&storeys).map(|(l, s)| l * s).collect();
    let area_lease: Vec<f64> = areas.iter().zip(&leases).map(|(a, l)| a * l).collect();

    let mut result = df.clone();
    for series in [
        Series::new("area_storey_interaction".into(), area_storey),
        Series::new("lease_storey_interaction".into(), lease_storey),
        Series::new("area_lease_interaction".into(), area_lease),
    ] {
        result = result.with_column(series)?.clone();
    }

    Ok(result)
}

/// Trailing rolling means of the resale price over the last 3 and 6
/// transactions within the same town, month-ascending, min-periods 1.
/// Results are re-aligned to the original row order.
pub fn add_rolling_means(df: &DataFrame) -> Result<DataFrame> {
    let towns = str_column(df, "town")?;
    let years = i32_column(df, "year")?;
    let months = i32_column(df, "month_num")?;
    let prices = f64_column(df, "resale_price")?;
    let n = df.height();

    // Stable sort keeps input order within (town, month) ties, so early rows
    // of the same month contribute to later ones in their original order.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        towns[a]
            .cmp(&towns[b])
            .then(years[a].cmp(&years[b]))
            .then(months[a].cmp(&months[b]))
    });

    let mut ma3 = vec![0.0; n];
    let mut ma6 = vec![0.0; n];
    let mut group: Vec<f64> = Vec::new();
    let mut current_town: Option<&str> = None;

    for &row in &order {
        if current_town != Some(towns[row].as_str()) {
            current_town = Some(towns[row].as_str());
            group.clear();
        }
        group.push(prices[row]);

        let trailing = |w: usize| -> f64 {
            let start = group.len().saturating_sub(w);
            let window = &group[start..];
            window.iter().sum::<f64>() / window.len() as f64
        };
        ma3[row] = trailing(3);
        ma6[row] = trailing(6);
    }

    let mut result = df.clone();
    result = result
        .with_column(Series::new("price_ma_3".into(), ma3))?
        .clone();
    result = result
        .with_column(Series::new("price_ma_6".into(), ma6))?
        .clone();

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureDeriver;
    use crate::testutil::sample_transactions;

    #[test]
    fn test_mean_std() {
        let (m, s) = mean_std(&[2.0, 4.0, 6.0]);
        assert!((m - 4.0).abs() < 1e-12);
        assert!((s - 2.0).abs() < 1e-12);

        let (m, s) = mean_std(&[5.0]);
        assert_eq!(m, 5.0);
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_group_statistics() {
        let df = sample_transactions();
        let base = FeatureDeriver::new().row_features(&df).unwrap();
        let stats = GroupStatistics::compute(&base).unwrap();
        let enriched = stats.attach(&base).unwrap();

        let towns = str_column(&enriched, "town").unwrap();
        let town_means = f64_column(&enriched, "town_price_mean").unwrap();
        let prices = f64_column(&base, "resale_price").unwrap();

        // every row of the same town carries the same mean, and it is the
        // actual mean of that town's prices
        for town in ["BEDOK", "CLEMENTI"] {
            let expected = {
                let vals: Vec<f64> = towns
                    .iter()
                    .zip(&prices)
                    .filter(|(t, _)| t.as_str() == town)
                    .map(|(_, p)| *p)
                    .collect();
                vals.iter().sum::<f64>() / vals.len() as f64
            };
            for (t, m) in towns.iter().zip(&town_means) {
                if t == town {
                    assert!((m - expected).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_rolling_mean_short_windows() {
        let df = sample_transactions();
        let base = FeatureDeriver::new().row_features(&df).unwrap();
        let result = add_rolling_means(&base).unwrap();

        let towns = str_column(&result, "town").unwrap();
        let ma3 = f64_column(&result, "price_ma_3").unwrap();
        let prices = f64_column(&base, "resale_price").unwrap();

        // first transaction of each town averages only itself
        let mut seen = std::collections::HashSet::new();
        for i in 0..towns.len() {
            if seen.insert(towns[i].clone()) {
                assert!((ma3[i] - prices[i]).abs() < 1e-9, "row {i}");
            }
        }
    }

    #[test]
    fn test_interactions() {
        let df = sample_transactions();
        let base = FeatureDeriver::new().row_features(&df).unwrap();
        let result = add_interactions(&base).unwrap();

        let areas = f64_column(&base, "floor_area_sqm").unwrap();
        let storeys = f64_column(&base, "avg_storey").unwrap();
        let inter = f64_column(&result, "area_storey_interaction").unwrap();
        for i in 0..areas.len() {
            assert!((inter[i] - areas[i] * storeys[i]).abs() < 1e-9);
        }
    }
}
