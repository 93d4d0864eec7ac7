//! Rate Limiting Infrastructure
//!
//! Fixed-window request counting per `(actor, action)` pair.
//!
//! A window opens on the first request after the previous one expired and
//! lasts `window`. Up to `max_requests` calls pass inside it; the rest are
//! denied with a `retry_after_secs` hint. Bursts of up to `2 * max_requests`
//! straddling a window boundary are accepted.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;

/// Rate limit configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }
}

/// Rate limit check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at_ms: i64,
    /// Only set on denial; always at least 1
    pub retry_after_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
struct WindowRecord {
    count: u32,
    reset_at_ms: i64,
}

/// In-memory fixed-window rate limiter
pub struct RateLimiter {
    records: DashMap<String, WindowRecord>,
    suspicious: DashMap<String, u32>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::new(),
            suspicious: DashMap::new(),
            clock,
        }
    }

    fn key(actor: &str, action: &str) -> String {
        format!("{}:{}", actor, action)
    }

    /// Count one request for `(actor, action)` and decide whether it passes
    pub fn check(&self, actor: &str, action: &str, config: &RateLimitConfig) -> RateLimitResult {
        let now_ms = self.clock.now_ms();
        let window_ms = config.window_ms();

        let outcome = {
            let mut record = self
                .records
                .entry(Self::key(actor, action))
                .or_insert(WindowRecord {
                    count: 0,
                    reset_at_ms: now_ms + window_ms,
                });

            if record.count == 0 || now_ms >= record.reset_at_ms {
                *record = WindowRecord {
                    count: 1,
                    reset_at_ms: now_ms + window_ms,
                };
                RateLimitResult {
                    allowed: true,
                    remaining: config.max_requests.saturating_sub(1),
                    reset_at_ms: record.reset_at_ms,
                    retry_after_secs: None,
                }
            } else if record.count >= config.max_requests {
                let wait_ms = (record.reset_at_ms - now_ms).max(1);
                RateLimitResult {
                    allowed: false,
                    remaining: 0,
                    reset_at_ms: record.reset_at_ms,
                    retry_after_secs: Some(((wait_ms + 999) / 1000) as u64),
                }
            } else {
                record.count += 1;
                RateLimitResult {
                    allowed: true,
                    remaining: config.max_requests.saturating_sub(record.count),
                    reset_at_ms: record.reset_at_ms,
                    retry_after_secs: None,
                }
            }
        };

        if !outcome.allowed {
            let strikes = {
                let mut counter = self.suspicious.entry(actor.to_string()).or_insert(0);
                *counter += 1;
                *counter
            };
            tracing::warn!(
                actor = actor,
                action = action,
                max = config.max_requests,
                retry_after_secs = outcome.retry_after_secs,
                strikes = strikes,
                "Rate limit exceeded"
            );
        }

        outcome
    }

    /// Number of denied requests recorded for an actor
    pub fn suspicious_count(&self, actor: &str) -> u32 {
        self.suspicious.get(actor).map(|c| *c).unwrap_or(0)
    }

    /// Forget the window for `(actor, action)`
    pub fn reset(&self, actor: &str, action: &str) {
        self.records.remove(&Self::key(actor, action));
    }

    /// Drop windows that have already expired
    pub fn purge_expired(&self) -> usize {
        let now_ms = self.clock.now_ms();
        let before = self.records.len();
        self.records.retain(|_, record| now_ms < record.reset_at_ms);
        before - self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn limiter() -> (Arc<ManualClock>, RateLimiter) {
        let clock = Arc::new(ManualClock::at_ms(1_000_000));
        let limiter = RateLimiter::new(clock.clone());
        (clock, limiter)
    }

    #[test]
    fn test_allows_exactly_max_requests_then_denies() {
        let (_clock, limiter) = limiter();
        let config = RateLimitConfig::new(3, 60);

        for expected_remaining in [2, 1, 0] {
            let result = limiter.check("alice", "create_session", &config);
            assert!(result.allowed);
            assert_eq!(result.remaining, expected_remaining);
        }

        let denied = limiter.check("alice", "create_session", &config);
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert!(denied.retry_after_secs.unwrap() > 0);
    }

    #[test]
    fn test_window_reset_starts_fresh() {
        let (clock, limiter) = limiter();
        let config = RateLimitConfig::new(2, 60);

        assert!(limiter.check("bob", "upload", &config).allowed);
        assert!(limiter.check("bob", "upload", &config).allowed);
        assert!(!limiter.check("bob", "upload", &config).allowed);

        clock.advance(Duration::from_secs(60));

        let fresh = limiter.check("bob", "upload", &config);
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, 1);
        assert_eq!(fresh.reset_at_ms, clock.now_ms() + 60_000);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let (clock, limiter) = limiter();
        let config = RateLimitConfig::new(1, 10);

        assert!(limiter.check("carol", "read", &config).allowed);
        clock.advance_ms(8_500);

        let denied = limiter.check("carol", "read", &config);
        assert_eq!(denied.retry_after_secs, Some(2));
    }

    #[test]
    fn test_keys_are_per_actor_and_action() {
        let (_clock, limiter) = limiter();
        let config = RateLimitConfig::new(1, 60);

        assert!(limiter.check("dave", "a", &config).allowed);
        assert!(limiter.check("dave", "b", &config).allowed);
        assert!(limiter.check("erin", "a", &config).allowed);
        assert!(!limiter.check("dave", "a", &config).allowed);
    }

    #[test]
    fn test_denials_count_as_suspicious() {
        let (_clock, limiter) = limiter();
        let config = RateLimitConfig::new(1, 60);

        limiter.check("mallory", "create_session", &config);
        assert_eq!(limiter.suspicious_count("mallory"), 0);

        limiter.check("mallory", "create_session", &config);
        limiter.check("mallory", "create_session", &config);
        assert_eq!(limiter.suspicious_count("mallory"), 2);
        assert_eq!(limiter.suspicious_count("nobody"), 0);
    }

    #[test]
    fn test_purge_and_reset() {
        let (clock, limiter) = limiter();
        let config = RateLimitConfig::new(1, 1);

        limiter.check("a", "x", &config);
        limiter.check("b", "x", &config);
        limiter.reset("b", "x");
        assert!(limiter.check("b", "x", &config).allowed);

        clock.advance(Duration::from_secs(2));
        assert_eq!(limiter.purge_expired(), 2);
    }
}
