//! Fixed-window rate limiting keyed by client IP.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// Key shared by every client whose IP could not be resolved.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Counter for one client in the current window.
#[derive(Debug, Clone, Copy)]
struct Bucket {
    points_consumed: u32,
    window_start: Instant,
}

impl Bucket {
    fn new(now: Instant) -> Self {
        Self {
            points_consumed: 0,
            window_start: now,
        }
    }

    fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.duration_since(self.window_start) >= window
    }
}

/// Result of one `consume` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitOutcome {
    pub allowed: bool,
    /// Quota per window.
    pub limit: u32,
    /// Points left in the current window.
    pub remaining: u32,
    /// Unix timestamp (seconds) when the window resets.
    pub reset_at: u64,
    /// Whole seconds until the window resets, never zero.
    pub retry_after: u64,
}

/// Process-wide limiter. Callers only ever see `consume`.
pub struct FixedWindowLimiter {
    buckets: DashMap<String, Bucket>,
    points: u32,
    window: Duration,
}

impl FixedWindowLimiter {
    pub fn new(points: u32, window: Duration) -> Self {
        Self {
            buckets: DashMap::new(),
            points,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.points, Duration::from_secs(config.duration_secs))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Spend one point for `key`.
    pub fn consume(&self, key: &str) -> RateLimitOutcome {
        self.consume_at(key, Instant::now())
    }

    /// Spend one point for `key` as of `now`.
    ///
    /// The entry guard holds the shard lock for the whole read-modify-write,
    /// so concurrent calls for one key never both take the last point.
    pub fn consume_at(&self, key: &str, now: Instant) -> RateLimitOutcome {
        let key = if key.is_empty() { UNKNOWN_CLIENT } else { key };

        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::new(now));

        if bucket.is_expired(now, self.window) {
            *bucket = Bucket::new(now);
        }

        let allowed = bucket.points_consumed < self.points;
        if allowed {
            bucket.points_consumed += 1;
        }

        let elapsed = now.duration_since(bucket.window_start);
        let until_reset = self.window.saturating_sub(elapsed);
        let remaining = self.points.saturating_sub(bucket.points_consumed);
        drop(bucket);

        RateLimitOutcome {
            allowed,
            limit: self.points,
            remaining,
            reset_at: unix_now().saturating_add(ceil_secs(until_reset)),
            retry_after: ceil_secs(until_reset).max(1),
        }
    }

    /// Drop buckets whose window has elapsed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| !bucket.is_expired(now, self.window));
        before - self.buckets.len()
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    /// Sweep expired buckets every `interval` until shutdown.
    pub fn spawn_purge_task(self: &Arc<Self>, interval: Duration, shutdown: &Shutdown) {
        let limiter = Arc::clone(self);
        let mut shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let purged = limiter.purge_expired();
                        metrics::record_tracked_clients(limiter.tracked_clients());
                        if purged > 0 {
                            tracing::debug!(purged, remaining = limiter.tracked_clients(), "Purged expired rate limit buckets");
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_then_reject() {
        let limiter = FixedWindowLimiter::new(5, Duration::from_secs(60));
        let now = Instant::now();

        let remaining: Vec<u32> = (0..5)
            .map(|_| {
                let outcome = limiter.consume_at("1.2.3.4", now);
                assert!(outcome.allowed);
                outcome.remaining
            })
            .collect();
        assert_eq!(remaining, vec![4, 3, 2, 1, 0]);

        let rejected = limiter.consume_at("1.2.3.4", now + Duration::from_secs(1));
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
        assert_eq!(rejected.limit, 5);
        assert!(rejected.retry_after > 0 && rejected.retry_after <= 60);
    }

    #[test]
    fn test_window_reset() {
        let limiter = FixedWindowLimiter::new(2, Duration::from_secs(10));
        let start = Instant::now();

        assert!(limiter.consume_at("ip", start).allowed);
        assert!(limiter.consume_at("ip", start).allowed);
        assert!(!limiter.consume_at("ip", start + Duration::from_secs(9)).allowed);

        let after = limiter.consume_at("ip", start + Duration::from_secs(10));
        assert!(after.allowed);
        assert_eq!(after.remaining, 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.consume_at("a", now).allowed);
        assert!(!limiter.consume_at("a", now).allowed);
        assert!(limiter.consume_at("b", now).allowed);
    }

    #[test]
    fn test_empty_key_shares_unknown_bucket() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.consume_at("", now).allowed);
        assert!(!limiter.consume_at(UNKNOWN_CLIENT, now).allowed);
    }

    #[test]
    fn test_retry_after_counts_down() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();
        limiter.consume_at("ip", start);
        let outcome = limiter.consume_at("ip", start + Duration::from_millis(30_500));
        assert!(!outcome.allowed);
        assert_eq!(outcome.retry_after, 30);
    }

    #[test]
    fn test_purge_expired() {
        let limiter = FixedWindowLimiter::new(3, Duration::from_secs(5));
        let start = Instant::now();
        limiter.consume_at("old", start);
        limiter.consume_at("new", start + Duration::from_secs(4));

        assert_eq!(limiter.purge_expired_at(start + Duration::from_secs(6)), 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_concurrent_consume_never_exceeds_quota() {
        let quota = 50;
        let limiter = Arc::new(FixedWindowLimiter::new(quota, Duration::from_secs(60)));

        let handles: Vec<_> = (0..quota * 2)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || limiter.consume("9.9.9.9").allowed)
            })
            .collect();

        let allowed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|allowed| *allowed)
            .count();
        assert_eq!(allowed, quota as usize);
    }
}
