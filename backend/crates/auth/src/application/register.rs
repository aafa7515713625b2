//! Registration Saga
//!
//! Two steps with one compensation:
//!
//! 1. `register`: user and invitation are written in one store transaction.
//! 2. `send_invitation`: the activation link, carrying the plaintext token,
//!    is published to the notifier under its own deadline.
//!
//! A failed publish deletes the user (the invitation goes with it by
//! cascade) under a fresh deadline. Publish and rollback share one spawned
//! task, so neither depends on the caller still being around. The caller
//! always sees the publish failure, whether or not the rollback succeeded.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use kernel::id::UserId;
use notify::{Notifier, NotifyError, USER_INVITATION_TEMPLATE};
use platform::crypto::random_token;
use platform::deadline::with_deadline;
use platform::password::ClearTextPassword;
use serde_json::json;

use crate::application::config::AuthConfig;
use crate::domain::entity::{invitation::Invitation, user::User};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_name::UserName};
use crate::error::{AuthError, AuthResult};

/// Registration input
pub struct RegisterInput {
    pub user_name: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterInput")
            .field("user_name", &self.user_name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Committed registration awaiting its invitation
pub struct PendingRegistration {
    pub user: User,
    activation_token: String,
}

impl PendingRegistration {
    pub fn activation_token(&self) -> &str {
        &self.activation_token
    }
}

impl fmt::Debug for PendingRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRegistration")
            .field("user_id", &self.user.user_id)
            .finish_non_exhaustive()
    }
}

pub struct RegistrationSaga<R, N> {
    users: Arc<R>,
    notifier: Arc<N>,
    config: Arc<AuthConfig>,
}

impl<R, N> RegistrationSaga<R, N>
where
    R: UserRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    pub fn new(users: Arc<R>, notifier: Arc<N>, config: Arc<AuthConfig>) -> Self {
        Self {
            users,
            notifier,
            config,
        }
    }

    /// Register, then invite
    pub async fn execute(&self, input: RegisterInput) -> AuthResult<User> {
        let pending = self.register(input).await?;
        self.send_invitation(&pending).await?;
        Ok(pending.user)
    }

    pub async fn register(&self, input: RegisterInput) -> AuthResult<PendingRegistration> {
        let user_name = UserName::new(&input.user_name)?;
        let email = Email::new(&input.email)?;
        let password = ClearTextPassword::new(input.password)
            .map_err(|e| AuthError::Validation(format!("password: {e}")))?;
        let password_hash = password
            .hash()
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let user = User::new(user_name, email, password_hash);
        let activation_token = random_token();
        let invitation = Invitation::new(
            &activation_token,
            user.user_id,
            self.config.invitation_ttl_chrono(),
        );

        self.users.register(&user, &invitation).await?;

        tracing::info!(user_id = %user.user_id, user_name = %user.user_name, "user registered");

        Ok(PendingRegistration {
            user,
            activation_token,
        })
    }

    /// Publish the invitation; roll the registration back if that fails
    ///
    /// Publish and rollback run together on a spawned task, so dropping the
    /// returned future does not strand the committed user.
    pub async fn send_invitation(&self, pending: &PendingRegistration) -> AuthResult<()> {
        let user_id = pending.user.user_id;
        let to = pending.user.email.as_str().to_string();
        let data = json!({
            "username": pending.user.user_name.as_str(),
            "activation_url": self.config.activation_url(&pending.activation_token),
        });

        let users = Arc::clone(&self.users);
        let notifier = Arc::clone(&self.notifier);
        let publish_deadline = self.config.publish_deadline;
        let compensation_deadline = self.config.compensation_deadline;

        let invitation = tokio::spawn(async move {
            let published = with_deadline(
                publish_deadline,
                notifier.publish(&to, USER_INVITATION_TEMPLATE, data),
            )
            .await
            .unwrap_or_else(|elapsed| Err(NotifyError::Publish(elapsed.to_string())));

            if let Err(e) = &published {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "invitation publish failed, rolling back registration"
                );
                compensate(users.as_ref(), user_id, compensation_deadline).await;
            }
            published
        });

        match invitation.await {
            Ok(Ok(())) => {
                tracing::info!(user_id = %user_id, "invitation published");
                Ok(())
            }
            Ok(Err(publish_error)) => Err(AuthError::Notification(publish_error)),
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "invitation task aborted");
                Err(AuthError::Internal(format!("invitation task aborted: {e}")))
            }
        }
    }
}

/// Delete the user under its own deadline
async fn compensate<R: UserRepository>(users: &R, user_id: UserId, deadline: Duration) {
    match with_deadline(deadline, users.delete(&user_id)).await {
        Ok(Ok(true)) => {
            tracing::info!(user_id = %user_id, "registration rolled back");
        }
        Ok(Ok(false)) => {
            tracing::warn!(user_id = %user_id, "registration rollback found no user");
        }
        Ok(Err(e)) => {
            tracing::error!(
                user_id = %user_id,
                error = %e,
                "registration rollback failed, orphaned unactivated account"
            );
        }
        Err(e) => {
            tracing::error!(
                user_id = %user_id,
                error = %e,
                "registration rollback timed out, orphaned unactivated account"
            );
        }
    }
}
