//! HTTP Basic credentials for operational endpoints

use axum::http::{HeaderMap, header};
use thiserror::Error;

use crate::crypto::{constant_time_eq, from_base64};

/// Challenge sent with 401 responses from Basic-guarded routes
pub const BASIC_CHALLENGE: &str = r#"Basic realm="restricted", charset="UTF-8""#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BasicAuthError {
    #[error("authorization header is missing")]
    Missing,
    #[error("authorization header is malformed")]
    Malformed,
    #[error("invalid credentials")]
    Mismatch,
}

/// Decoded `user:pass` pair
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Parse `Authorization: Basic base64(user:pass)`
pub fn parse_basic_header(headers: &HeaderMap) -> Result<BasicCredentials, BasicAuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(BasicAuthError::Missing)?
        .to_str()
        .map_err(|_| BasicAuthError::Malformed)?;

    let (scheme, encoded) = value.split_once(' ').ok_or(BasicAuthError::Malformed)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(BasicAuthError::Malformed);
    }

    let decoded = from_base64(encoded.trim()).map_err(|_| BasicAuthError::Malformed)?;
    let decoded = String::from_utf8(decoded).map_err(|_| BasicAuthError::Malformed)?;
    let (username, password) = decoded.split_once(':').ok_or(BasicAuthError::Malformed)?;

    Ok(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Expected operator credentials
#[derive(Clone)]
pub struct BasicAuthConfig {
    pub username: String,
    pub password: String,
}

impl BasicAuthConfig {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parse and check the request's credentials
    ///
    /// An empty configured password matches nothing.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<(), BasicAuthError> {
        let creds = parse_basic_header(headers)?;
        if self.password.is_empty() {
            return Err(BasicAuthError::Mismatch);
        }

        // Evaluate both comparisons so timing does not reveal which one failed
        let user_ok = constant_time_eq(creds.username.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(creds.password.as_bytes(), self.password.as_bytes());

        if user_ok & pass_ok {
            Ok(())
        } else {
            Err(BasicAuthError::Mismatch)
        }
    }
}

impl std::fmt::Debug for BasicAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthConfig")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
