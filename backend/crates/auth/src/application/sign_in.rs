//! Sign In Use Case
//!
//! Email and password against an active account, answered with a session
//! token.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use kernel::id::UserId;
use platform::password::ClearTextPassword;

use crate::application::token::TokenAuthenticator;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult, UnauthenticatedReason};

pub struct SignInInput {
    pub email: String,
    pub password: String,
}

pub struct SignInOutput {
    pub user_id: UserId,
    pub token: String,
    pub expires_in: Duration,
}

impl fmt::Debug for SignInOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInOutput")
            .field("user_id", &self.user_id)
            .field("token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

pub struct SignInUseCase<R> {
    users: Arc<R>,
    tokens: Arc<dyn TokenAuthenticator>,
}

impl<R: UserRepository> SignInUseCase<R> {
    pub fn new(users: Arc<R>, tokens: Arc<dyn TokenAuthenticator>) -> Self {
        Self { users, tokens }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutput> {
        // Same answer for a malformed email, an unknown one, and a wrong password
        let invalid = || AuthError::Unauthenticated(UnauthenticatedReason::InvalidCredentials);

        let email = Email::new(&input.email).map_err(|_| invalid())?;
        let user = self
            .users
            .find_active_by_email(&email)
            .await?
            .ok_or_else(invalid)?;

        let password = ClearTextPassword::unchecked(input.password);
        if !user.password_hash.verify(&password) {
            tracing::debug!(user_id = %user.user_id, "password mismatch");
            return Err(invalid());
        }

        let token = self
            .tokens
            .issue_for(&user.user_id)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        tracing::info!(user_id = %user.user_id, "user signed in");

        Ok(SignInOutput {
            user_id: user.user_id,
            token,
            expires_in: self.tokens.metadata().expiry,
        })
    }
}
