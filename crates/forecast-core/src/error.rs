//! Error types for forecasting and scoring operations

use chrono::NaiveDate;
use thiserror::Error;

/// Forecast pipeline errors
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Required configuration is absent
    #[error("Configuration missing: {0}")]
    ConfigMissing(String),

    /// Input rejected before reaching the model
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Date range with `from` after `to`
    #[error("Invalid range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    /// Window shorter than the model input length
    #[error("Insufficient history: need {required} bars, have {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    /// Weights cannot be bound to the model architecture
    #[error("Model load failure: {0}")]
    ModelLoadFailure(String),

    /// Model produced unusable output
    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    /// Downstream service returned an error or unparseable body
    #[error("Upstream error{}: {body}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    UpstreamError { status: Option<u16>, body: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ForecastError {
    /// Create an upstream error without an HTTP status
    pub fn upstream(body: impl Into<String>) -> Self {
        Self::UpstreamError {
            status: None,
            body: body.into(),
        }
    }

    /// Create an upstream error carrying the HTTP status
    pub fn upstream_status(status: u16, body: impl Into<String>) -> Self {
        Self::UpstreamError {
            status: Some(status),
            body: body.into(),
        }
    }

    /// Whether retrying the same request could succeed
    ///
    /// Only transport failures and 5xx upstream responses qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::UpstreamError { status: None, .. } => true,
            Self::UpstreamError {
                status: Some(status),
                ..
            } => *status >= 500,
            _ => false,
        }
    }
}

impl From<forecast_utils::EnvError> for ForecastError {
    fn from(err: forecast_utils::EnvError) -> Self {
        match err {
            forecast_utils::EnvError::Missing(name) => ForecastError::ConfigMissing(name),
            invalid @ forecast_utils::EnvError::Invalid { .. } => {
                ForecastError::InvalidInput(invalid.to_string())
            }
        }
    }
}

/// Result type alias for forecast operations
pub type Result<T> = std::result::Result<T, ForecastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ForecastError::InsufficientHistory {
            required: 30,
            actual: 20,
        };
        assert_eq!(err.to_string(), "Insufficient history: need 30 bars, have 20");

        let err = ForecastError::upstream_status(503, "busy");
        assert_eq!(err.to_string(), "Upstream error (HTTP 503): busy");

        let err = ForecastError::upstream("connection reset");
        assert_eq!(err.to_string(), "Upstream error: connection reset");
    }

    #[test]
    fn test_retryable() {
        assert!(ForecastError::upstream("timeout").is_retryable());
        assert!(ForecastError::upstream_status(502, "").is_retryable());
        assert!(!ForecastError::upstream_status(404, "").is_retryable());
        assert!(!ForecastError::InvalidInput("horizon".to_string()).is_retryable());
    }

    #[test]
    fn test_env_error_conversion() {
        let err: ForecastError =
            forecast_utils::EnvError::Missing("SERVICE_BASE_URL".to_string()).into();
        match err {
            ForecastError::ConfigMissing(name) => assert_eq!(name, "SERVICE_BASE_URL"),
            other => panic!("Expected ConfigMissing, got {other:?}"),
        }
    }
}
