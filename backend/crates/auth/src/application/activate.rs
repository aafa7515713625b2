//! Activate Use Case
//!
//! Consumes the plaintext invitation token from the activation link.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::UserId;

use crate::application::user_lookup::UserLookup;
use crate::domain::entity::invitation::hash_token;
use crate::domain::repository::{UserCache, UserRepository};
use crate::error::{AuthError, AuthResult};

pub struct ActivateUseCase<R, C> {
    users: Arc<R>,
    lookup: UserLookup<R, C>,
}

impl<R, C> ActivateUseCase<R, C>
where
    R: UserRepository,
    C: UserCache,
{
    pub fn new(users: Arc<R>, lookup: UserLookup<R, C>) -> Self {
        Self { users, lookup }
    }

    /// Unmatched and expired tokens both yield `InvalidToken`
    pub async fn execute(&self, plaintext_token: &str) -> AuthResult<UserId> {
        if plaintext_token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        let user_id = self
            .users
            .activate(&hash_token(plaintext_token), Utc::now())
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.lookup.invalidate(&user_id).await;

        tracing::info!(user_id = %user_id, "user activated");
        Ok(user_id)
    }
}
