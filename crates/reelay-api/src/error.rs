//! HTTP error response conversion
//!
//! This module provides HTTP-specific error response conversion for AppError.
//!
//! **Preferred handler pattern:** Return `Result<impl IntoResponse, HttpAppError>`.
//! Use `AppError` (or types that implement `Into<HttpAppError>`) for errors so
//! they render consistently (status, body, logging).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reelay_core::{AppError, ErrorMetadata, LogLevel};
use reelay_processing::{NormalizeError, UploadValidationError};
use reelay_queue::{EnqueueError, JobStoreError};
use reelay_storage::StorageError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client (e.g., "Retry after a short delay")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorResponse {
    /// Create a simple error response with default values
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            error_type: None,
            code: code.into(),
            recoverable: false,
            suggested_action: None,
        }
    }
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from reelay-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        let is_production = is_production_env();

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Always hide details in production; otherwise only for sensitive errors.
        let body = if is_production || app_error.is_sensitive() {
            Json(ErrorResponse {
                error: app_error.client_message(),
                details: None,
                error_type: None,
                code: app_error.error_code().to_string(),
                recoverable: app_error.is_recoverable(),
                suggested_action: app_error.suggested_action().map(String::from),
            })
        } else {
            Json(ErrorResponse {
                error: app_error.client_message(),
                details: Some(app_error.detailed_message()),
                error_type: Some(app_error.error_type().to_string()),
                code: app_error.error_code().to_string(),
                recoverable: app_error.is_recoverable(),
                suggested_action: app_error.suggested_action().map(String::from),
            })
        };

        (status, body).into_response()
    }
}

// Convert domain errors to HttpAppError (avoids orphan rule: we impl for local HttpAppError)

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::UploadFailed(msg) => AppError::Storage(msg),
            StorageError::DownloadFailed(msg) => AppError::Storage(msg),
            StorageError::DeleteFailed(msg) => AppError::Storage(msg),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::BackendError(msg) => AppError::Storage(msg),
            StorageError::IoError(err) => AppError::Internal(format!("IO error: {}", err)),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
        };
        HttpAppError(app)
    }
}

impl From<UploadValidationError> for HttpAppError {
    fn from(err: UploadValidationError) -> Self {
        let message = err.to_string();
        let app = match err {
            UploadValidationError::FieldNameMismatch { .. } => AppError::FieldNameMismatch(message),
            UploadValidationError::UnsupportedMediaType { .. } => {
                AppError::UnsupportedMediaType(message)
            }
            UploadValidationError::FileTooLarge { .. }
            | UploadValidationError::TotalSizeExceeded { .. } => AppError::PayloadTooLarge(message),
            UploadValidationError::TooManyFiles { .. } => AppError::TooManyFiles(message),
            UploadValidationError::EmptyUpload => AppError::EmptyUpload,
            UploadValidationError::Malformed(msg) => {
                AppError::InvalidInput(format!("Malformed multipart body: {}", msg))
            }
        };
        HttpAppError(app)
    }
}

impl From<NormalizeError> for HttpAppError {
    fn from(err: NormalizeError) -> Self {
        HttpAppError(AppError::ImageProcessing(err.to_string()))
    }
}

impl From<EnqueueError> for HttpAppError {
    fn from(err: EnqueueError) -> Self {
        let message = err.to_string();
        let app = match err {
            EnqueueError::QueueFull => AppError::QueueFull(message),
            EnqueueError::WorkerGone => AppError::Internal(message),
            EnqueueError::Store(e) => AppError::Internal(format!("Job store error: {}", e)),
        };
        HttpAppError(app)
    }
}

impl From<JobStoreError> for HttpAppError {
    fn from(err: JobStoreError) -> Self {
        let app = match err {
            JobStoreError::NotFound(id) => AppError::NotFound(format!("Job not found: {}", id)),
            other => AppError::Internal(format!("Job store error: {}", other)),
        };
        HttpAppError(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_not_found_maps_to_404() {
        let HttpAppError(app) = StorageError::NotFound("videos/x.mp4".to_string()).into();
        assert!(matches!(app, AppError::NotFound(_)));
        assert_eq!(app.http_status_code(), 404);
    }

    #[test]
    fn validation_errors_map_to_their_variants() {
        let HttpAppError(app) = UploadValidationError::FieldNameMismatch {
            expected: "image",
            got: "photo".to_string(),
        }
        .into();
        assert_eq!(app.error_code(), "FIELD_NAME_MISMATCH");

        let HttpAppError(app) = UploadValidationError::UnsupportedMediaType {
            content_type: "text/plain".to_string(),
            expected_prefix: "image/",
        }
        .into();
        assert_eq!(app.http_status_code(), 415);

        let HttpAppError(app) = UploadValidationError::TooManyFiles { count: 5, max: 4 }.into();
        assert_eq!(app.error_code(), "TOO_MANY_FILES");

        let HttpAppError(app) = UploadValidationError::FileTooLarge {
            size: 100,
            max: 50,
        }
        .into();
        assert_eq!(app.http_status_code(), 413);

        let HttpAppError(app) = UploadValidationError::EmptyUpload.into();
        assert_eq!(app.error_code(), "EMPTY_UPLOAD");
    }

    #[test]
    fn queue_full_maps_to_503() {
        let HttpAppError(app) = EnqueueError::QueueFull.into();
        assert_eq!(app.http_status_code(), 503);
    }

    #[test]
    fn job_store_not_found_maps_to_404() {
        let HttpAppError(app) = JobStoreError::NotFound("abc".to_string()).into();
        assert_eq!(app.http_status_code(), 404);
    }

    /// Verifies the public error response contract: serialized ErrorResponse has
    /// "error", "code", "recoverable", and optionally "details" / "error_type" /
    /// "suggested_action".
    #[test]
    fn error_response_shape() {
        let response = ErrorResponse {
            error: "Not found".to_string(),
            details: Some("Resource not found".to_string()),
            error_type: Some("NotFound".to_string()),
            code: "NOT_FOUND".to_string(),
            recoverable: false,
            suggested_action: None,
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert!(json.get("error").and_then(|v| v.as_str()).is_some());
        assert!(json.get("code").and_then(|v| v.as_str()).is_some());
        assert!(json.get("recoverable").and_then(|v| v.as_bool()).is_some());
        assert!(json.get("suggested_action").is_none());
    }
}
