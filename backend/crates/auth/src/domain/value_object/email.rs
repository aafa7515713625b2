//! Email Value Object
//!
//! Basic shape validation only; ownership is proven by activation.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::ValidationError;

/// RFC 5321 path limit
const EMAIL_MAX_LENGTH: usize = 254;
const LOCAL_PART_MAX_LENGTH: usize = 64;

/// Lowercased email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn new(email: impl AsRef<str>) -> Result<Self, ValidationError> {
        let email = email.as_ref().trim().to_lowercase();

        if email.is_empty() {
            return Err(ValidationError::new("email", "must not be empty"));
        }
        if email.len() > EMAIL_MAX_LENGTH {
            return Err(ValidationError::new(
                "email",
                format!("must be at most {EMAIL_MAX_LENGTH} characters"),
            ));
        }

        let Some((local, domain)) = email.split_once('@') else {
            return Err(ValidationError::new("email", "invalid format"));
        };

        let local_ok = !local.is_empty() && local.len() <= LOCAL_PART_MAX_LENGTH;
        let domain_ok = domain.contains('.')
            && !domain.starts_with(['.', '-'])
            && !domain.ends_with(['.', '-'])
            && domain
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');

        if !local_ok || !domain_ok {
            return Err(ValidationError::new("email", "invalid format"));
        }

        Ok(Self(email))
    }

    /// Rehydrate a stored value without re-validating
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Email {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Email::new(s)
    }
}

impl TryFrom<String> for Email {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Email::new(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_valid() {
        assert!(Email::new("user@example.com").is_ok());
        assert!(Email::new("user+tag@example.co.uk").is_ok());
        assert_eq!(Email::new(" E@X.com ").unwrap().as_str(), "e@x.com");
    }

    #[test]
    fn test_email_invalid() {
        for bad in [
            "",
            "userexample.com",
            "user@",
            "@example.com",
            "a@b@c.com",
            "user@example",
            "u@-x.com",
        ] {
            assert!(Email::new(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_email_length_limit() {
        let long = format!("{}@example.com", "a".repeat(65));
        assert!(Email::new(long).is_err());
    }
}
