//! Feed Error Types
//!
//! Feed-specific error variants that integrate with the unified
//! `kernel::error::AppError` system. Authorization failures keep the
//! auth taxonomy (401/403/429) by wrapping [`AuthError`].

use auth::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::deadline::DeadlineExceeded;
use thiserror::Error;

/// Feed-specific result type alias
pub type FeedResult<T> = Result<T, FeedError>;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("post not found")]
    NotFound,

    /// Stale version on a conditional write. Re-read before retrying.
    #[error("edit conflict: the post was changed or removed, reload it and try again")]
    VersionConflict,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("store call timed out: {0}")]
    Timeout(#[from] DeadlineExceeded),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl FeedError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FeedError::NotFound => ErrorKind::NotFound,
            FeedError::VersionConflict => ErrorKind::Conflict,
            FeedError::Validation(_) => ErrorKind::BadRequest,
            FeedError::Auth(e) => e.kind(),
            FeedError::Timeout(_) | FeedError::Database(_) | FeedError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            FeedError::Auth(e) => e.to_app_error(),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            FeedError::Database(e) => {
                tracing::error!(error = %e, "feed database error");
            }
            FeedError::Timeout(e) => {
                tracing::error!(error = %e, "feed store timeout");
            }
            FeedError::Internal(msg) => {
                tracing::error!(message = %msg, "feed internal error");
            }
            FeedError::Auth(e) => e.log(),
            FeedError::VersionConflict => {
                tracing::info!("post edit conflict");
            }
            _ => {
                tracing::debug!(error = %self, "feed error");
            }
        }
    }
}

impl From<FeedError> for AppError {
    fn from(err: FeedError) -> Self {
        err.to_app_error()
    }
}

impl IntoResponse for FeedError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_is_not_blindly_retryable() {
        let err = FeedError::VersionConflict;
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(!err.kind().is_blindly_retryable());
        assert!(err.to_string().starts_with("edit conflict"));
    }

    #[test]
    fn test_auth_errors_keep_their_status() {
        assert_eq!(
            FeedError::from(AuthError::Forbidden).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            FeedError::Timeout(DeadlineExceeded(std::time::Duration::from_secs(5))).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
