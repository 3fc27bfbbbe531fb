//! HTTP error response conversion.
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`; `AppError`
//! values become `HttpAppError` via `?` and render as a JSON body with the
//! status code, machine-readable code, and client-safe message the error
//! itself declares. Internal details are logged, never echoed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docstore_core::error::LogLevel;
use docstore_core::AppError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
}

/// Wrapper type for AppError to implement IntoResponse.
/// Needed because of the orphan rule: IntoResponse is external and AppError
/// lives in docstore-core.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<docstore_storage::StorageError> for HttpAppError {
    fn from(err: docstore_storage::StorageError) -> Self {
        HttpAppError(err.into())
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::Internal(err.to_string()))
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let err = self.0;
        match err.log_level() {
            LogLevel::Debug => tracing::debug!(error = %err, code = err.error_code(), "request failed"),
            LogLevel::Warn => tracing::warn!(error = %err, code = err.error_code(), "request failed"),
            LogLevel::Error => tracing::error!(error = %err, code = err.error_code(), "request failed"),
        }

        let status = StatusCode::from_u16(err.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse {
            error: err.client_message(),
            code: err.error_code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
