//! Chronology-aware splitting: the cutoff-year train/eval partition and the
//! time-ordered cross-validation used by the grid search.

mod split;
mod validation;

pub use split::split_by_year;
pub use validation::{TimeSeriesCV, TimeSeriesSplit};
