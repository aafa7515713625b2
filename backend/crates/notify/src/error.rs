//! Notify Error Types

use kernel::error::kind::ErrorKind;
use thiserror::Error;

pub type NotifyResult<T> = Result<T, NotifyError>;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// The queue no longer accepts messages
    #[error("message queue is closed")]
    QueueClosed,

    /// Broker refused or failed the publish
    #[error("publish failed: {0}")]
    Publish(String),

    #[error("message encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("unknown email template: {0}")]
    UnknownTemplate(String),

    #[error("template {template} is missing field {field}")]
    MissingField {
        template: &'static str,
        field: &'static str,
    },

    #[error("mail transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail API rejected the message with status {status}")]
    Rejected { status: u16 },

    #[error("mail delivery failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<NotifyError> },
}

impl NotifyError {
    /// Notification failures are never the caller's fault
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InternalServerError
    }

    /// Whether another attempt at the same send may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            NotifyError::Transport(_) => true,
            NotifyError::Rejected { status } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn log(&self) {
        match self {
            NotifyError::QueueClosed | NotifyError::Publish(_) => {
                tracing::error!(error = %self, "notification publish failed");
            }
            _ => {
                tracing::warn!(error = %self, "notification error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(NotifyError::Rejected { status: 503 }.is_transient());
        assert!(NotifyError::Rejected { status: 429 }.is_transient());
        assert!(!NotifyError::Rejected { status: 400 }.is_transient());
        assert!(!NotifyError::QueueClosed.is_transient());
        assert_eq!(NotifyError::QueueClosed.kind(), ErrorKind::InternalServerError);
    }
}
