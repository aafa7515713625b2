//! User Lookup
//!
//! Read-through cache in front of the user store, run as three ordered
//! stages:
//!
//! 1. `lookup_cache`: a hit short-circuits. A cache fault counts as a miss.
//! 2. `lookup_store`: the store is authoritative. Not-found short-circuits
//!    and is never cached.
//! 3. `populate_cache`: best-effort; the outcome is reported in
//!    [`LookupOrigin::Store`] instead of failing the lookup.
//!
//! Only active users resolve. Mutations go to the store; callers then
//! [`UserLookup::invalidate`] or let the entry expire.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use kernel::id::UserId;

use crate::domain::entity::user::User;
use crate::domain::repository::{UserCache, UserRepository};
use crate::error::AuthResult;

/// Where a resolved user came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOrigin {
    Cache,
    Store { cache_populated: bool },
}

#[derive(Debug, Clone)]
pub enum Resolution {
    Found { user: User, origin: LookupOrigin },
    NotFound,
}

impl Resolution {
    pub fn into_user(self) -> Option<User> {
        match self {
            Resolution::Found { user, .. } => Some(user),
            Resolution::NotFound => None,
        }
    }

    pub fn origin(&self) -> Option<LookupOrigin> {
        match self {
            Resolution::Found { origin, .. } => Some(*origin),
            Resolution::NotFound => None,
        }
    }
}

pub struct UserLookup<R, C> {
    store: Arc<R>,
    cache: Arc<C>,
    ttl: Duration,
}

impl<R, C> Clone for UserLookup<R, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            ttl: self.ttl,
        }
    }
}

impl<R, C> UserLookup<R, C>
where
    R: UserRepository,
    C: UserCache,
{
    pub fn new(store: Arc<R>, cache: Arc<C>, ttl: Duration) -> Self {
        Self { store, cache, ttl }
    }

    pub async fn resolve(&self, user_id: &UserId) -> AuthResult<Resolution> {
        if let ControlFlow::Break(user) = self.lookup_cache(user_id).await {
            return Ok(Resolution::Found {
                user,
                origin: LookupOrigin::Cache,
            });
        }

        let user = match self.lookup_store(user_id).await? {
            ControlFlow::Break(()) => return Ok(Resolution::NotFound),
            ControlFlow::Continue(user) => user,
        };

        let cache_populated = self.populate_cache(&user).await;
        Ok(Resolution::Found {
            user,
            origin: LookupOrigin::Store { cache_populated },
        })
    }

    /// Drop the cached snapshot of `user_id`. Best-effort.
    pub async fn invalidate(&self, user_id: &UserId) {
        if let Err(e) = self.cache.invalidate(user_id).await {
            tracing::warn!(user_id = %user_id, error = %e, "user cache invalidation failed");
        }
    }

    async fn lookup_cache(&self, user_id: &UserId) -> ControlFlow<User> {
        match self.cache.get(user_id).await {
            Ok(Some(user)) => ControlFlow::Break(user),
            Ok(None) => ControlFlow::Continue(()),
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "user cache read failed, using store"
                );
                ControlFlow::Continue(())
            }
        }
    }

    async fn lookup_store(&self, user_id: &UserId) -> AuthResult<ControlFlow<(), User>> {
        Ok(match self.store.find_active_by_id(user_id).await? {
            Some(user) => ControlFlow::Continue(user),
            None => ControlFlow::Break(()),
        })
    }

    async fn populate_cache(&self, user: &User) -> bool {
        match self.cache.set_with_ttl(user, self.ttl).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(user_id = %user.user_id, error = %e, "user cache populate failed");
                false
            }
        }
    }
}
