//! HTTP error responses

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use forecast_core::ForecastError;
use serde_json::json;

/// Status code for a pipeline error
pub fn status_for(err: &ForecastError) -> StatusCode {
    match err {
        ForecastError::InvalidInput(_) | ForecastError::InvalidRange { .. } => {
            StatusCode::BAD_REQUEST
        }
        ForecastError::InsufficientHistory { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ForecastError::UpstreamError { .. } => StatusCode::BAD_GATEWAY,
        ForecastError::ConfigMissing(_)
        | ForecastError::ModelLoadFailure(_)
        | ForecastError::InferenceFailed(_)
        | ForecastError::Io(_)
        | ForecastError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Handler error rendered as `{"error": msg}`
#[derive(Debug)]
pub struct ApiError(pub ForecastError);

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self.0, "Request rejected");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
