//! In-process user cache
//!
//! Expired entries are dropped when read, and in bulk by `purge_expired`,
//! which the server runs on an interval. Between sweeps the map holds at
//! most the users seen within one TTL plus one sweep interval.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use kernel::id::UserId;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::domain::entity::user::User;
use crate::domain::repository::{CacheError, UserCache};

struct CacheEntry {
    user: User,
    expires_at: Instant,
}

/// DashMap-backed snapshot cache
///
/// A disabled cache always misses and stores nothing.
#[derive(Clone)]
pub struct MemoryUserCache {
    entries: Arc<DashMap<UserId, CacheEntry>>,
    enabled: bool,
}

impl Default for MemoryUserCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryUserCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    pub fn with_enabled(enabled: bool) -> Self {
        if enabled { Self::new() } else { Self::disabled() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry past its TTL; returns how many went
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    /// Sweep on `every` until `shutdown` fires
    pub async fn run_sweeper(&self, every: Duration, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let purged = self.purge_expired();
                    if purged > 0 {
                        tracing::debug!(purged, remaining = self.len(), "user cache swept");
                    }
                }
            }
        }
    }
}

impl UserCache for MemoryUserCache {
    async fn get(&self, user_id: &UserId) -> Result<Option<User>, CacheError> {
        if !self.enabled {
            return Ok(None);
        }

        let now = Instant::now();
        if let Some(entry) = self.entries.get(user_id) {
            if entry.expires_at > now {
                return Ok(Some(entry.user.clone()));
            }
        }

        self.entries.remove_if(user_id, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn set_with_ttl(&self, user: &User, ttl: Duration) -> Result<(), CacheError> {
        if self.enabled {
            self.entries.insert(
                user.user_id,
                CacheEntry {
                    user: user.clone(),
                    expires_at: Instant::now() + ttl,
                },
            );
        }
        Ok(())
    }

    async fn invalidate(&self, user_id: &UserId) -> Result<(), CacheError> {
        self.entries.remove(user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::active_user;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = MemoryUserCache::new();
        let u = active_user("dave", "dave@example.com");

        cache.set_with_ttl(&u, Duration::from_secs(10)).await.unwrap();
        assert!(cache.get(&u.user_id).await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(cache.get(&u.user_id).await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_drops_only_expired_entries() {
        let cache = MemoryUserCache::new();
        let stale = active_user("gwen", "gwen@example.com");
        let fresh = active_user("hugo", "hugo@example.com");

        cache.set_with_ttl(&stale, Duration::from_secs(10)).await.unwrap();
        cache.set_with_ttl(&fresh, Duration::from_secs(60)).await.unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;

        // Never read again, still removed
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&fresh.user_id).await.unwrap().is_some());
        assert_eq!(cache.purge_expired(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_purges_until_shutdown() {
        let cache = MemoryUserCache::new();
        let shutdown = CancellationToken::new();
        let sweeper = tokio::spawn({
            let cache = cache.clone();
            let shutdown = shutdown.clone();
            async move { cache.run_sweeper(Duration::from_secs(30), shutdown).await }
        });

        for (name, email) in [("ivy", "ivy@example.com"), ("jon", "jon@example.com")] {
            let u = active_user(name, email);
            cache.set_with_ttl(&u, Duration::from_secs(5)).await.unwrap();
        }
        assert_eq!(cache.len(), 2);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(cache.is_empty());

        shutdown.cancel();
        sweeper.await.unwrap();
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let cache = MemoryUserCache::new();
        let u = active_user("erin", "erin@example.com");

        cache.set_with_ttl(&u, Duration::from_secs(60)).await.unwrap();
        cache.invalidate(&u.user_id).await.unwrap();
        cache.invalidate(&u.user_id).await.unwrap();
        assert!(cache.get(&u.user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disabled_cache_never_hits() {
        let cache = MemoryUserCache::disabled();
        let u = active_user("frank", "frank@example.com");

        cache.set_with_ttl(&u, Duration::from_secs(60)).await.unwrap();
        assert!(cache.get(&u.user_id).await.unwrap().is_none());
        assert_eq!(cache.len(), 0);
    }
}
