//! Column-role schema for the transaction table
//!
//! Column roles are declared explicitly here rather than inferred from dtypes
//! at runtime. Every component consumes these lists, so the feature layout
//! used at fit time is the same one used at projection time.

use serde::{Deserialize, Serialize};

/// Role a column plays in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRole {
    /// Raw categorical string column, label-encoded before modeling
    Categorical,
    /// Raw numeric column usable as-is
    Numeric,
    /// Column added by the feature deriver
    Derived,
    /// Prediction target
    Target,
}

/// Raw categorical columns, encoded in this order
pub const CATEGORICAL_COLUMNS: [&str; 4] = ["town", "flat_type", "flat_model", "street_name"];

/// Target column
pub const TARGET_COLUMN: &str = "resale_price";

/// Columns the outlier filter scores over
pub const OUTLIER_COLUMNS: [&str; 3] = ["resale_price", "floor_area_sqm", "price_per_sqm"];

/// Model feature columns, in the exact order the model is fit against.
/// This order travels with the trained model artifact.
pub const FEATURE_COLUMNS: [&str; 23] = [
    "floor_area_sqm",
    "property_age",
    "remaining_lease",
    "price_per_sqm",
    "avg_storey",
    "town_encoded",
    "flat_type_encoded",
    "flat_model_encoded",
    "street_name_encoded",
    "year",
    "month_num",
    "quarter",
    "town_price_mean",
    "town_price_std",
    "town_area_mean",
    "town_price_per_sqm_mean",
    "flat_type_price_mean",
    "flat_type_area_mean",
    "area_storey_interaction",
    "lease_storey_interaction",
    "area_lease_interaction",
    "price_ma_3",
    "price_ma_6",
];

/// Role of a feature column by name, for components that need to branch
pub fn role_of(column: &str) -> ColumnRole {
    if column == TARGET_COLUMN {
        ColumnRole::Target
    } else if CATEGORICAL_COLUMNS.contains(&column) {
        ColumnRole::Categorical
    } else if matches!(column, "floor_area_sqm" | "lease_commence_date") {
        ColumnRole::Numeric
    } else {
        ColumnRole::Derived
    }
}

/// Feature column names as owned strings, in model order
pub fn feature_columns() -> Vec<String> {
    FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect()
}
