//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum shared by every crate in the pipeline.
//! Each kind maps to exactly one HTTP status code so that outcomes stay
//! stable for clients.

use serde::Serialize;

/// Error classification
///
/// The access-control taxonomy maps onto these kinds as follows:
///
/// | Outcome            | Kind                  |
/// |--------------------|-----------------------|
/// | AdmissionDenied    | `TooManyRequests`     |
/// | Unauthenticated    | `Unauthorized`        |
/// | Forbidden          | `Forbidden`           |
/// | VersionConflict    | `Conflict`            |
/// | DuplicateConflict  | `Conflict`            |
/// | InvalidToken       | `BadRequest`          |
/// | NotFound           | `NotFound`            |
/// | Internal           | `InternalServerError` |
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::NotFound;
/// assert_eq!(kind.status_code(), 404);
/// assert_eq!(kind.as_str(), "Not Found");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// 400 - malformed input or an unusable activation token
    BadRequest,
    /// 401 - credential missing, invalid, expired, or naming a vanished principal
    Unauthorized,
    /// 403 - known principal, not entitled
    Forbidden,
    /// 404 - resource absent
    NotFound,
    /// 409 - stale version or unique-constraint collision
    Conflict,
    /// 429 - admission denied by the rate limiter
    TooManyRequests,
    /// 500 - anything else (store unreachable, deadline exceeded, publish failure)
    InternalServerError,
    /// 503 - a dependency refused service (pool exhausted)
    ServiceUnavailable,
}

impl ErrorKind {
    /// HTTP status code for this kind
    ///
    /// ## Examples
    /// ```rust
    /// use kernel::error::kind::ErrorKind;
    /// assert_eq!(ErrorKind::TooManyRequests.status_code(), 429);
    /// assert_eq!(ErrorKind::Conflict.status_code(), 409);
    /// ```
    #[inline]
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::TooManyRequests => 429,
            ErrorKind::InternalServerError => 500,
            ErrorKind::ServiceUnavailable => 503,
        }
    }

    /// Standard reason phrase
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::TooManyRequests => "Too Many Requests",
            ErrorKind::InternalServerError => "Internal Server Error",
            ErrorKind::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// 5xx kinds. These should always be logged.
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// 4xx kinds
    #[inline]
    pub const fn is_client_error(&self) -> bool {
        let code = self.status_code();
        code >= 400 && code < 500
    }

    /// Whether a client may retry the identical request without changing anything.
    ///
    /// Every client-side outcome needs caller action first (wait for the
    /// window, re-authenticate, re-read the version, pick another email).
    #[inline]
    pub const fn is_blindly_retryable(&self) -> bool {
        self.is_server_error()
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
