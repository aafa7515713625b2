//! Value Object Module

pub mod email;
pub mod user_name;

pub use email::Email;
pub use user_name::UserName;

/// Input rejected by a value object constructor
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl From<ValidationError> for crate::error::AuthError {
    fn from(err: ValidationError) -> Self {
        crate::error::AuthError::Validation(err.to_string())
    }
}
