//! Invitation Entity

use chrono::{DateTime, Duration, Utc};
use kernel::id::UserId;
use platform::crypto::sha256_hex;

/// Pending activation for an unactivated user
///
/// Only the SHA-256 of the token is stored; the plaintext travels in the
/// activation email and nowhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    pub token_hash: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

impl Invitation {
    pub fn new(plaintext_token: &str, user_id: UserId, ttl: Duration) -> Self {
        Self {
            token_hash: hash_token(plaintext_token),
            user_id,
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// One-way hash used to store and look up activation tokens
pub fn hash_token(plaintext_token: &str) -> String {
    sha256_hex(plaintext_token.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invitation_stores_hash_only() {
        let invitation = Invitation::new("plain", UserId::new(), Duration::hours(24));
        assert_ne!(invitation.token_hash, "plain");
        assert_eq!(invitation.token_hash, hash_token("plain"));
        assert!(!invitation.is_expired(Utc::now()));
        assert!(invitation.is_expired(Utc::now() + Duration::hours(25)));
    }
}
