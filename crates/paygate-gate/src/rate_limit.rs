//! Fixed-window rate limiting per source identifier.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paygate_core::clock::Clock;
use paygate_core::rate::{RateCounter, RateDecision};

/// Counts requests per source within a fixed window and rejects the
/// excess with a retry-after hint. The counting backend sits behind
/// [`RateCounter`] so a shared key-value store can replace the in-process
/// map without touching this logic.
pub struct FixedWindowLimiter {
    counter: Arc<dyn RateCounter>,
    max_requests: u64,
    window: Duration,
}

impl FixedWindowLimiter {
    /// Creates a limiter allowing `max_requests` per `window` per key.
    #[must_use]
    pub fn new(counter: Arc<dyn RateCounter>, max_requests: u64, window: Duration) -> Self {
        Self {
            counter,
            max_requests,
            window,
        }
    }

    /// Counts this request against `source` and decides whether it may
    /// proceed.
    pub async fn check(&self, source: &str) -> RateDecision {
        let (count, window_remaining) = self.counter.increment(source, self.window).await;
        if count > self.max_requests {
            RateDecision::Limited {
                retry_after: window_remaining,
            }
        } else {
            RateDecision::Allowed
        }
    }
}

/// In-process [`RateCounter`]: one `(window start, count)` slot per key.
pub struct InMemoryRateCounter {
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<String, (DateTime<Utc>, u64)>>,
}

impl InMemoryRateCounter {
    /// Creates an empty counter reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RateCounter for InMemoryRateCounter {
    async fn increment(&self, key: &str, window: Duration) -> (u64, Duration) {
        let now = self.clock.now();
        let mut windows = self.windows.lock().unwrap();
        let slot = windows.entry(key.to_owned()).or_insert((now, 0));

        let elapsed = (now - slot.0).to_std().unwrap_or_default();
        if elapsed >= window {
            *slot = (now, 0);
        }
        slot.1 += 1;

        let elapsed = (now - slot.0).to_std().unwrap_or_default();
        (slot.1, window.saturating_sub(elapsed))
    }
}
