//! User Name Value Object
//!
//! Public handle shown next to posts. ASCII letters and digits only,
//! 3 to 30 characters after NFKC normalization. Case is preserved;
//! uniqueness is enforced by the store.

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

use super::ValidationError;

pub const USER_NAME_MIN_LENGTH: usize = 3;
pub const USER_NAME_MAX_LENGTH: usize = 30;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    pub fn new(input: impl AsRef<str>) -> Result<Self, ValidationError> {
        let normalized: String = input.as_ref().nfkc().collect::<String>().trim().to_string();

        let length = normalized.chars().count();
        if length < USER_NAME_MIN_LENGTH || length > USER_NAME_MAX_LENGTH {
            return Err(ValidationError::new(
                "username",
                format!(
                    "must be between {USER_NAME_MIN_LENGTH} and {USER_NAME_MAX_LENGTH} characters"
                ),
            ));
        }

        if let Some(ch) = normalized.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(ValidationError::new(
                "username",
                format!("invalid character '{ch}', only letters and digits are allowed"),
            ));
        }

        Ok(Self(normalized))
    }

    /// Rehydrate a stored value without re-validating
    pub fn from_db(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UserName::new(value)
    }
}

impl From<UserName> for String {
    fn from(name: UserName) -> Self {
        name.0
    }
}

impl fmt::Debug for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UserName").field(&self.0).finish()
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert_eq!(UserName::new("Ann42").unwrap().as_str(), "Ann42");
        assert!(UserName::new("abc").is_ok());
        assert!(UserName::new("a".repeat(30)).is_ok());
    }

    #[test]
    fn test_length_bounds() {
        assert!(UserName::new("ab").is_err());
        assert!(UserName::new("a".repeat(31)).is_err());
    }

    #[test]
    fn test_rejects_symbols_and_spaces() {
        assert!(UserName::new("ann_42").is_err());
        assert!(UserName::new("ann 42").is_err());
        assert!(UserName::new("ännä").is_err());
    }

    #[test]
    fn test_fullwidth_digits_normalize() {
        // NFKC folds fullwidth forms to ASCII
        assert_eq!(UserName::new("ａｎｎ１").unwrap().as_str(), "ann1");
    }
}
