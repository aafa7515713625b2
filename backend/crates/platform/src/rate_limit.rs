//! Rate Limiting Infrastructure
//!
//! Fixed-window admission control keyed by client identity.
//!
//! ## Policy
//! The first request from a key opens a window and schedules its eviction
//! exactly one window later. Requests under quota are counted and admitted;
//! at quota they are denied with the static window length as retry hint.
//! Eviction resets the counter rather than sliding it, so a client can burst
//! up to twice the quota across a window boundary.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests admitted per window
    pub max_requests: u32,
    /// Window duration (also the retry hint on denial)
    pub window: Duration,
    /// When false, every request is admitted
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 20,
            window: Duration::from_secs(5),
            enabled: true,
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Build the limiter this configuration describes
    pub fn build(&self) -> Arc<dyn RateLimiter> {
        if self.enabled {
            Arc::new(FixedWindowLimiter::new(self.clone()))
        } else {
            Arc::new(UnlimitedLimiter)
        }
    }
}

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub admitted: bool,
    /// Zero when admitted
    pub retry_after: Duration,
}

impl RateLimitDecision {
    pub const fn admit() -> Self {
        Self {
            admitted: true,
            retry_after: Duration::ZERO,
        }
    }

    pub const fn deny(retry_after: Duration) -> Self {
        Self {
            admitted: false,
            retry_after,
        }
    }
}

/// Admission control seam
///
/// Denial is a normal outcome, not an error; implementations never fail.
pub trait RateLimiter: Send + Sync {
    fn allow(&self, key: &str) -> RateLimitDecision;
}

// ============================================================================
// Fixed window
// ============================================================================

#[derive(Debug)]
struct ClientWindow {
    count: u32,
    /// Identifies the window instance its eviction task belongs to
    generation: u64,
}

/// In-process fixed-window limiter
///
/// Each `allow` runs its check-and-increment under the key's shard lock.
/// Evictions are spawned onto the current tokio runtime, so `allow` must be
/// called from within one.
pub struct FixedWindowLimiter {
    config: RateLimitConfig,
    windows: Arc<DashMap<String, ClientWindow>>,
    generations: AtomicU64,
}

impl FixedWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(DashMap::new()),
            generations: AtomicU64::new(0),
        }
    }

    /// Number of clients with an open window
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    fn schedule_eviction(&self, key: String, generation: u64) {
        let windows = Arc::clone(&self.windows);
        let window = self.config.window;

        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            // Only the window this task was scheduled for is removed
            windows.remove_if(&key, |_, w| w.generation == generation);
            tracing::trace!(client = %key, "rate limit window evicted");
        });
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn allow(&self, key: &str) -> RateLimitDecision {
        let mut opened = None;

        let decision = {
            let mut entry = self.windows.entry(key.to_owned()).or_insert_with(|| {
                let generation = self.generations.fetch_add(1, Ordering::Relaxed);
                opened = Some(generation);
                ClientWindow { count: 0, generation }
            });

            if entry.count < self.config.max_requests {
                entry.count += 1;
                RateLimitDecision::admit()
            } else {
                RateLimitDecision::deny(self.config.window)
            }
        };

        if let Some(generation) = opened {
            self.schedule_eviction(key.to_owned(), generation);
        }

        if !decision.admitted {
            tracing::debug!(client = %key, "request denied by rate limiter");
        }
        decision
    }
}

/// Limiter used when admission control is switched off
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlimitedLimiter;

impl RateLimiter for UnlimitedLimiter {
    fn allow(&self, _key: &str) -> RateLimitDecision {
        RateLimitDecision::admit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_ms: u64) -> FixedWindowLimiter {
        FixedWindowLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_millis(window_ms),
            enabled: true,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn third_call_in_window_is_denied_with_window_hint() {
        let limiter = limiter(2, 1000);

        assert_eq!(limiter.allow("A"), RateLimitDecision::admit());
        assert_eq!(limiter.allow("A"), RateLimitDecision::admit());
        assert_eq!(
            limiter.allow("A"),
            RateLimitDecision::deny(Duration::from_secs(1))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_counted_independently() {
        let limiter = limiter(1, 1000);

        assert!(limiter.allow("A").admitted);
        assert!(!limiter.allow("A").admitted);
        assert!(limiter.allow("B").admitted);
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn eviction_resets_the_counter() {
        let limiter = limiter(2, 1000);

        assert!(limiter.allow("A").admitted);
        assert!(limiter.allow("A").admitted);
        assert!(!limiter.allow("A").admitted);

        // Still inside the window
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!limiter.allow("A").admitted);

        tokio::time::sleep(Duration::from_millis(501)).await;
        assert_eq!(limiter.tracked_clients(), 0);
        assert!(limiter.allow("A").admitted);
        assert!(limiter.allow("A").admitted);
        assert!(!limiter.allow("A").admitted);
    }

    #[tokio::test(start_paused = true)]
    async fn window_is_fixed_not_sliding() {
        let limiter = limiter(2, 1000);

        assert!(limiter.allow("A").admitted);
        tokio::time::sleep(Duration::from_millis(900)).await;
        assert!(limiter.allow("A").admitted);

        // The window opened at t=0 closes at t=1000 regardless of the t=900 call
        tokio::time::sleep(Duration::from_millis(101)).await;
        assert!(limiter.allow("A").admitted);
        assert!(limiter.allow("A").admitted);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_quota_denies_everything() {
        let limiter = limiter(0, 1000);
        assert!(!limiter.allow("A").admitted);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_never_exceed_quota() {
        let limiter = Arc::new(limiter(50, 60_000));

        let handles: Vec<_> = (0..200)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.allow("shared").admitted })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 50);
    }

    #[test]
    fn disabled_config_admits_everything() {
        let limiter = RateLimitConfig::disabled().build();
        for _ in 0..1000 {
            assert!(limiter.allow("A").admitted);
        }
    }
}
