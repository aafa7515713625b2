//! Repository Traits
//!
//! Interfaces for persistence and caching. Implementations live in the
//! infrastructure layer.

use std::time::Duration;

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use thiserror::Error;

use crate::domain::entity::{
    invitation::Invitation,
    role::{Role, RoleId},
    user::User,
};
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

/// User store
///
/// "Not found" is `Ok(None)`, never an error.
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert the user and its invitation atomically.
    ///
    /// A unique collision fails the whole write with
    /// `AuthError::DuplicateConflict` naming the field.
    async fn register(&self, user: &User, invitation: &Invitation) -> AuthResult<()>;

    /// Find a user regardless of activation state
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_active_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_active_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Consume an unexpired invitation: mark its user active and delete it.
    ///
    /// Returns the activated user's id, or `None` when no unexpired
    /// invitation carries `token_hash`.
    async fn activate(&self, token_hash: &str, now: DateTime<Utc>) -> AuthResult<Option<UserId>>;

    /// Delete the user and, by cascade, its invitation.
    /// Returns whether a row was removed.
    async fn delete(&self, user_id: &UserId) -> AuthResult<bool>;
}

/// Role reference data
#[trait_variant::make(RoleRepository: Send)]
pub trait LocalRoleRepository {
    async fn find_role_by_id(&self, role_id: RoleId) -> AuthResult<Option<Role>>;

    async fn find_role_by_name(&self, name: &str) -> AuthResult<Option<Role>>;
}

/// Cache fault. Never fatal to a lookup.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// User snapshot cache
///
/// All operations are idempotent and best-effort.
#[trait_variant::make(UserCache: Send)]
pub trait LocalUserCache {
    async fn get(&self, user_id: &UserId) -> Result<Option<User>, CacheError>;

    async fn set_with_ttl(&self, user: &User, ttl: Duration) -> Result<(), CacheError>;

    async fn invalidate(&self, user_id: &UserId) -> Result<(), CacheError>;
}
