//! Best-effort, per-process request limiter for the presence endpoints.
//!
//! A mutex-guarded last-seen map denies repeat calls for the same key
//! within the configured minimum interval. Per instance only; it does
//! not participate in any correctness guarantee.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Entry count above which a call opportunistically evicts stale keys.
const EVICTION_THRESHOLD: usize = 10_000;

/// Minimum-interval limiter keyed by caller-scoped strings such as
/// `"status:<hotel>:<client>"`.
#[derive(Debug, Default)]
pub struct RequestRateLimiter {
    last_seen: Mutex<HashMap<String, Instant>>,
}

impl RequestRateLimiter {
    /// Creates an empty limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the key may proceed, recording the attempt.
    ///
    /// Empty keys and non-positive intervals are never limited.
    pub fn allow(&self, key: &str, min_interval: Duration) -> bool {
        let key = key.trim();
        if key.is_empty() || min_interval.is_zero() {
            return true;
        }

        let now = Instant::now();
        let Ok(mut last_seen) = self.last_seen.lock() else {
            // A poisoned map only ever contains timestamps; failing open
            // keeps the endpoints usable.
            return true;
        };

        if let Some(previous) = last_seen.get(key)
            && now.duration_since(*previous) < min_interval
        {
            return false;
        }
        last_seen.insert(key.to_string(), now);

        if last_seen.len() > EVICTION_THRESHOLD {
            let cutoff = min_interval * 10;
            last_seen.retain(|_, seen| now.duration_since(*seen) < cutoff);
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denies_within_interval_and_allows_after() {
        let limiter = RequestRateLimiter::new();
        let interval = Duration::from_millis(40);

        assert!(limiter.allow("status:h:c", interval));
        assert!(!limiter.allow("status:h:c", interval));

        std::thread::sleep(interval + Duration::from_millis(10));
        assert!(limiter.allow("status:h:c", interval));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RequestRateLimiter::new();
        let interval = Duration::from_secs(60);

        assert!(limiter.allow("status:h1:c", interval));
        assert!(limiter.allow("status:h2:c", interval));
        assert!(!limiter.allow("status:h1:c", interval));
    }

    #[test]
    fn blank_keys_and_zero_intervals_pass() {
        let limiter = RequestRateLimiter::new();
        assert!(limiter.allow("", Duration::from_secs(60)));
        assert!(limiter.allow("status:h:c", Duration::ZERO));
        assert!(limiter.allow("status:h:c", Duration::ZERO));
    }
}
