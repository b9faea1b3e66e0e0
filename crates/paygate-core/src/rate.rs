//! Rate limiting abstractions.
//!
//! The counter is a narrow atomic increment-with-expiry primitive so the
//! counting backend (in-process map, shared key-value store) is swappable
//! without touching gate logic.

use std::time::Duration;

use async_trait::async_trait;

/// Decision for one inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Under the threshold; let the request through.
    Allowed,
    /// Over the threshold; reject and tell the caller when to come back.
    Limited {
        /// Time remaining in the current window.
        retry_after: Duration,
    },
}

/// Shared counter keyed by source identifier.
#[async_trait]
pub trait RateCounter: Send + Sync {
    /// Atomically increments the counter for `key` within the current
    /// window, returning the count after the increment and the time
    /// remaining until the window resets.
    async fn increment(&self, key: &str, window: Duration) -> (u64, Duration);
}
