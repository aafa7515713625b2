//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system. Every outcome of the access-control
//! chain maps onto exactly one variant here.

use std::fmt;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use notify::NotifyError;
use platform::basic_auth::{BASIC_CHALLENGE, BasicAuthError};
use platform::deadline::DeadlineExceeded;
use thiserror::Error;

use crate::application::token::TokenError;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Unique field that collided during registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    Email,
    Username,
}

impl DuplicateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateField::Email => "email",
            DuplicateField::Username => "username",
        }
    }

    /// Map a Postgres unique constraint name to the field it guards
    pub fn from_constraint(constraint: &str) -> Option<Self> {
        match constraint {
            "users_email_key" => Some(DuplicateField::Email),
            "users_username_key" => Some(DuplicateField::Username),
            _ => None,
        }
    }
}

impl fmt::Display for DuplicateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a request was not authenticated. Diagnostic only; clients see one
/// opaque message per family.
#[derive(Debug)]
pub enum UnauthenticatedReason {
    /// No credential in the designated location
    MissingCredential,
    /// Token failed validation (signature, algorithm, expiry, issuer, audience)
    Token(TokenError),
    /// Token subject is not a user id
    MalformedSubject,
    /// Token names a principal that no longer resolves
    UnknownPrincipal,
    /// Principal lookup failed (store or cache fault)
    LookupFailed(String),
    /// Sign-in with unknown email or wrong password
    InvalidCredentials,
}

impl UnauthenticatedReason {
    fn public_message(&self) -> &'static str {
        match self {
            UnauthenticatedReason::MissingCredential => "authentication required",
            UnauthenticatedReason::InvalidCredentials => "invalid credentials",
            _ => "invalid or expired token",
        }
    }
}

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Rate limiter rejected the client
    #[error("rate limit exceeded")]
    AdmissionDenied { retry_after: Duration },

    #[error("{}", .0.public_message())]
    Unauthenticated(UnauthenticatedReason),

    /// Operational endpoint without valid Basic credentials
    #[error("{0}")]
    BasicAuthRequired(BasicAuthError),

    /// Known principal, not entitled
    #[error("you do not have permission to perform this action")]
    Forbidden,

    #[error("a user with that {0} already exists")]
    DuplicateConflict(DuplicateField),

    /// Activation token unmatched or expired
    #[error("invalid or expired activation token")]
    InvalidToken,

    #[error("{0}")]
    Validation(String),

    /// Invitation publish failed; registration was compensated
    #[error("notification failed: {0}")]
    Notification(#[source] NotifyError),

    #[error("store call timed out: {0}")]
    Timeout(#[from] DeadlineExceeded),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::AdmissionDenied { .. } => ErrorKind::TooManyRequests,
            AuthError::Unauthenticated(_) | AuthError::BasicAuthRequired(_) => {
                ErrorKind::Unauthorized
            }
            AuthError::Forbidden => ErrorKind::Forbidden,
            AuthError::DuplicateConflict(_) => ErrorKind::Conflict,
            AuthError::InvalidToken | AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::Notification(_)
            | AuthError::Timeout(_)
            | AuthError::Database(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let app_error = AppError::new(self.kind(), self.to_string());
        match self {
            AuthError::AdmissionDenied { retry_after } => app_error.with_retry_after(*retry_after),
            AuthError::BasicAuthRequired(_) => app_error.with_challenge(BASIC_CHALLENGE),
            _ => app_error,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "auth database error");
            }
            AuthError::Timeout(e) => {
                tracing::error!(error = %e, "auth store timeout");
            }
            AuthError::Notification(e) => {
                tracing::error!(error = %e, "invitation could not be published");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "auth internal error");
            }
            AuthError::Unauthenticated(reason) => {
                tracing::debug!(reason = ?reason, "unauthenticated request");
            }
            AuthError::BasicAuthRequired(e) => {
                tracing::warn!(error = %e, "basic auth rejected");
            }
            AuthError::AdmissionDenied { retry_after } => {
                tracing::debug!(retry_after_secs = retry_after.as_secs(), "admission denied");
            }
            _ => {
                tracing::debug!(error = %self, "auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<NotifyError> for AuthError {
    fn from(err: NotifyError) -> Self {
        AuthError::Notification(err)
    }
}

impl From<BasicAuthError> for AuthError {
    fn from(err: BasicAuthError) -> Self {
        AuthError::BasicAuthRequired(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn test_taxonomy_is_distinct() {
        let kinds = [
            AuthError::AdmissionDenied {
                retry_after: Duration::from_secs(1),
            }
            .status_code(),
            AuthError::Unauthenticated(UnauthenticatedReason::MissingCredential).status_code(),
            AuthError::Forbidden.status_code(),
            AuthError::DuplicateConflict(DuplicateField::Email).status_code(),
            AuthError::InvalidToken.status_code(),
            AuthError::Internal("x".into()).status_code(),
        ];
        assert_eq!(
            kinds.map(|s| s.as_u16()),
            [429, 401, 403, 409, 400, 500]
        );
    }

    #[test]
    fn test_unauthenticated_messages_are_opaque() {
        let err = AuthError::Unauthenticated(UnauthenticatedReason::UnknownPrincipal);
        assert_eq!(err.to_string(), "invalid or expired token");

        let err = AuthError::Unauthenticated(UnauthenticatedReason::MalformedSubject);
        assert_eq!(err.to_string(), "invalid or expired token");
    }

    #[test]
    fn test_duplicate_names_field() {
        let err = AuthError::DuplicateConflict(DuplicateField::Email);
        assert_eq!(err.to_string(), "a user with that email already exists");
        assert_eq!(
            DuplicateField::from_constraint("users_username_key"),
            Some(DuplicateField::Username)
        );
        assert_eq!(DuplicateField::from_constraint("posts_pkey"), None);
    }

    #[test]
    fn test_admission_denied_sets_retry_after() {
        let res = AuthError::AdmissionDenied {
            retry_after: Duration::from_secs(5),
        }
        .into_response();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(res.headers()[header::RETRY_AFTER], "5");
    }

    #[test]
    fn test_basic_auth_sets_challenge() {
        let res = AuthError::BasicAuthRequired(BasicAuthError::Missing).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers()[header::WWW_AUTHENTICATE], BASIC_CHALLENGE);
    }

    #[test]
    fn test_notification_failure_is_internal() {
        let err = AuthError::from(NotifyError::QueueClosed);
        assert_eq!(err.kind(), ErrorKind::InternalServerError);
        assert!(err.kind().is_blindly_retryable());
    }
}
