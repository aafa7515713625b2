//! User Entity

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use platform::password::HashedPassword;

use crate::domain::entity::role::RoleId;
use crate::domain::value_object::{email::Email, user_name::UserName};

/// Registered account
///
/// Created inactive; activation flips `is_active`. The store is the source
/// of truth, caches hold snapshots of this struct.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub user_name: UserName,
    pub email: Email,
    pub password_hash: HashedPassword,
    pub role_id: RoleId,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// New unactivated account with the default role
    pub fn new(user_name: UserName, email: Email, password_hash: HashedPassword) -> Self {
        Self {
            user_id: UserId::new(),
            user_name,
            email,
            password_hash,
            role_id: RoleId::USER,
            is_active: false,
            created_at: Utc::now(),
        }
    }

    pub fn principal(&self) -> Principal {
        Principal {
            id: self.user_id,
            role_id: self.role_id,
            is_active: self.is_active,
        }
    }
}

/// Authenticated identity, resolved once per request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: UserId,
    pub role_id: RoleId,
    pub is_active: bool,
}
