use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bscan_core::error::CoreError;
use bscan_core::navigation::NavigationError;
use bscan_core::preview::PreviewError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`PreviewError`] for domain errors and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce consistent
/// JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `bscan_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A preview rendering or cache error.
    #[error(transparent)]
    Preview(#[from] PreviewError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<NavigationError<sqlx::Error>> for AppError {
    fn from(err: NavigationError<sqlx::Error>) -> Self {
        match err.into_parts() {
            Ok(core) => AppError::Core(core),
            Err(db) => AppError::Database(db),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::FrameNotFound { .. } => {
                    (StatusCode::NOT_FOUND, "FRAME_NOT_FOUND", core.to_string())
                }
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Preview errors ---
            AppError::Preview(err) => classify_preview_error(err),

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a preview error into an HTTP status, error code, and message.
///
/// The source path is not echoed back for `SourceNotFound`.
fn classify_preview_error(err: &PreviewError) -> (StatusCode, &'static str, String) {
    match err {
        PreviewError::SourceNotFound { path } => {
            tracing::warn!(path = %path.display(), "Preview source missing");
            (
                StatusCode::NOT_FOUND,
                "SOURCE_NOT_FOUND",
                "Source image not found".to_string(),
            )
        }
        PreviewError::UnsupportedFormat(msg) => {
            (StatusCode::BAD_REQUEST, "UNSUPPORTED_FORMAT", msg.clone())
        }
        PreviewError::InvalidParameters(msg) => {
            (StatusCode::BAD_REQUEST, "INVALID_PARAMETERS", msg.clone())
        }
        PreviewError::EncodeFailure(msg) => {
            tracing::error!(error = %msg, "Preview encode failure");
            (StatusCode::INTERNAL_SERVER_ERROR, "ENCODE_FAILURE", msg.clone())
        }
        PreviewError::Io(e) => {
            tracing::error!(error = %e, "Preview cache I/O error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // SQLite reports 2067 (UNIQUE) or 1555 (PRIMARY KEY); the
            // constraint name is not available, so the message is generic.
            if db_err.is_unique_violation() {
                return (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    "Duplicate value violates a unique constraint".to_string(),
                );
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
