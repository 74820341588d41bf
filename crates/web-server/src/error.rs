use analytics::AnalyticsError;
use analyzer::error::AnalyzerError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use core_types::CoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Analyzer error: {0}")]
    Analyzer(#[from] AnalyzerError),
    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
    #[error("Invalid parameter: {0}")]
    Core(#[from] CoreError),
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Converts our custom `AppError` into an HTTP response.
///
/// Rejected requests carry their reason; internal failures are logged and
/// answered with a generic message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Analyzer(err) if err.is_not_found() => (StatusCode::NOT_FOUND, err.to_string()),
            AppError::Analyzer(err) if err.is_validation() => {
                tracing::warn!(error = %err, "Request rejected.");
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            AppError::Analyzer(err) => {
                tracing::error!(error = ?err, "Analyzer error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred during analysis".to_string(),
                )
            }
            AppError::Analytics(err) if err.is_validation() => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::Analytics(err) => {
                tracing::error!(error = ?err, "Analytics error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred while rendering the result".to_string(),
                )
            }
            AppError::Core(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
