//! Model training: regression trees, the bagged forest, and the
//! hyperparameter grid search that selects a configuration under
//! time-ordered validation.

mod decision_tree;
mod grid_search;
mod random_forest;

pub use decision_tree::{RegressionTree, TreeNode};
pub use grid_search::{GridSearch, ParamGrid, SearchResult};
pub use random_forest::{ForestParams, ForestRegressor, MaxFeatures};
