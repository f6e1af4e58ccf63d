//! Error types for the resale price forecasting pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Main error type for the forecasting pipeline
#[derive(Error, Debug)]
pub enum ForecastError {
    /// Storey range did not match the fixed "LOW TO HIGH" two-token format
    #[error("Malformed storey range '{0}': expected \"LOW TO HIGH\"")]
    MalformedRange(String),

    /// Encoder was asked to transform a value outside its fit universe
    #[error("Unknown category '{value}' in column '{column}': not seen during fit")]
    UnknownCategory { column: String, value: String },

    /// A cross-validation fold or split ended up empty
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for ForecastError {
    fn from(err: polars::error::PolarsError) -> Self {
        ForecastError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ForecastError {
    fn from(err: ndarray::ShapeError) -> Self {
        ForecastError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ForecastError::MalformedRange("4-6".to_string());
        assert_eq!(
            err.to_string(),
            "Malformed storey range '4-6': expected \"LOW TO HIGH\""
        );
    }

    #[test]
    fn test_unknown_category_context() {
        let err = ForecastError::UnknownCategory {
            column: "town".to_string(),
            value: "ATLANTIS".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("town"));
        assert!(msg.contains("ATLANTIS"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ForecastError = io_err.into();
        assert!(matches!(err, ForecastError::IoError(_)));
    }
}
