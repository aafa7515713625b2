//! In-memory user store
//!
//! Same contract as the Postgres repository, including unique-field
//! conflicts and cascade of invitations on delete. Used by tests and by
//! local runs without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::entity::{
    invitation::Invitation,
    role::{Role, RoleId},
    user::User,
};
use crate::domain::repository::{RoleRepository, UserRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult, DuplicateField};

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    // keyed by token hash
    invitations: HashMap<String, Invitation>,
}

/// Process-local user store
#[derive(Clone)]
pub struct InMemoryUserRepository {
    state: Arc<Mutex<State>>,
    roles: Arc<Vec<Role>>,
    reads: Arc<AtomicUsize>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            roles: Arc::new(Role::defaults()),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn state(&self) -> AuthResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| AuthError::Internal("user store lock poisoned".to_string()))
    }

    /// Number of user reads served so far
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Insert or replace a user directly, bypassing registration
    pub fn insert(&self, user: User) -> AuthResult<()> {
        self.state()?.users.insert(user.user_id, user);
        Ok(())
    }

    pub fn user_count(&self) -> usize {
        self.state().map(|state| state.users.len()).unwrap_or_default()
    }

    pub fn invitation_for(&self, user_id: &UserId) -> Option<Invitation> {
        let state = self.state().ok()?;
        state
            .invitations
            .values()
            .find(|inv| inv.user_id == *user_id)
            .cloned()
    }

    fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }
}

impl UserRepository for InMemoryUserRepository {
    async fn register(&self, user: &User, invitation: &Invitation) -> AuthResult<()> {
        let mut state = self.state()?;

        for existing in state.users.values() {
            if existing.email == user.email {
                return Err(AuthError::DuplicateConflict(DuplicateField::Email));
            }
            if existing.user_name == user.user_name {
                return Err(AuthError::DuplicateConflict(DuplicateField::Username));
            }
        }

        state.users.insert(user.user_id, user.clone());
        state
            .invitations
            .insert(invitation.token_hash.clone(), invitation.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        self.record_read();
        Ok(self.state()?.users.get(user_id).cloned())
    }

    async fn find_active_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        self.record_read();
        Ok(self
            .state()?
            .users
            .get(user_id)
            .filter(|u| u.is_active)
            .cloned())
    }

    async fn find_active_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        self.record_read();
        Ok(self
            .state()?
            .users
            .values()
            .find(|u| u.is_active && u.email == *email)
            .cloned())
    }

    async fn activate(&self, token_hash: &str, now: DateTime<Utc>) -> AuthResult<Option<UserId>> {
        let mut state = self.state()?;

        let user_id = match state.invitations.get(token_hash) {
            Some(inv) if !inv.is_expired(now) => inv.user_id,
            _ => return Ok(None),
        };

        let Some(user) = state.users.get_mut(&user_id) else {
            return Ok(None);
        };
        user.is_active = true;
        state.invitations.remove(token_hash);

        Ok(Some(user_id))
    }

    async fn delete(&self, user_id: &UserId) -> AuthResult<bool> {
        let mut state = self.state()?;
        let removed = state.users.remove(user_id).is_some();
        state.invitations.retain(|_, inv| inv.user_id != *user_id);
        Ok(removed)
    }
}

impl RoleRepository for InMemoryUserRepository {
    async fn find_role_by_id(&self, role_id: RoleId) -> AuthResult<Option<Role>> {
        Ok(self.roles.iter().find(|r| r.id == role_id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> AuthResult<Option<Role>> {
        Ok(self.roles.iter().find(|r| r.name == name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::user;

    #[tokio::test]
    async fn test_register_rejects_duplicate_fields() {
        let repo = InMemoryUserRepository::new();
        let first = user("alice", "alice@example.com");
        repo.register(&first, &Invitation::new("t1", first.user_id, chrono::Duration::hours(1)))
            .await
            .unwrap();

        let same_email = user("bob", "alice@example.com");
        let invitation = Invitation::new("t2", same_email.user_id, chrono::Duration::hours(1));
        let err = repo.register(&same_email, &invitation).await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateConflict(DuplicateField::Email)));

        let same_name = user("alice", "other@example.com");
        let invitation = Invitation::new("t3", same_name.user_id, chrono::Duration::hours(1));
        let err = repo.register(&same_name, &invitation).await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateConflict(DuplicateField::Username)));

        // Failed registrations leave nothing behind
        assert!(repo.invitation_for(&same_email.user_id).is_none());
        assert!(repo.find_by_id(&first.user_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_cascades_invitation() {
        let repo = InMemoryUserRepository::new();
        let u = user("carol", "carol@example.com");
        repo.register(&u, &Invitation::new("t", u.user_id, chrono::Duration::hours(1)))
            .await
            .unwrap();

        assert!(repo.delete(&u.user_id).await.unwrap());
        assert!(repo.invitation_for(&u.user_id).is_none());
        assert!(!repo.delete(&u.user_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_roles_are_seeded() {
        let repo = InMemoryUserRepository::new();
        let admin = repo.find_role_by_name(Role::ADMIN).await.unwrap().unwrap();
        assert_eq!(admin.level, 3);
        assert!(repo.find_role_by_id(RoleId(9)).await.unwrap().is_none());
    }
}
