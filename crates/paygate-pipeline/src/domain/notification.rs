//! Notification fallback chain.
//!
//! Delivery paths are interchangeable implementations of one interface,
//! tried in configured order. Which error classes fall through to the
//! next path is policy, not a hard-coded rule.

use std::sync::Arc;
use std::time::Duration;

use paygate_core::error::NotifyError;
use paygate_core::notify::{Notification, Notifier};

/// When a failed attempt may fall through to the next notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Any failure moves on to the next path.
    AnyError,
    /// Only failures a different path could plausibly fix (timeouts,
    /// provider errors) fall through; a bad recipient stops the chain.
    TransientOnly,
}

impl FallbackPolicy {
    fn falls_through(self, error: &NotifyError) -> bool {
        match self {
            Self::AnyError => true,
            Self::TransientOnly => {
                matches!(error, NotifyError::Timeout | NotifyError::Provider(_))
            }
        }
    }
}

/// An ordered list of notifiers tried until one delivers.
pub struct NotifierChain {
    notifiers: Vec<Arc<dyn Notifier>>,
    policy: FallbackPolicy,
    attempt_timeout: Duration,
}

impl NotifierChain {
    /// Creates a chain trying `notifiers` in order, each attempt bounded
    /// by `attempt_timeout`.
    #[must_use]
    pub fn new(
        notifiers: Vec<Arc<dyn Notifier>>,
        policy: FallbackPolicy,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            notifiers,
            policy,
            attempt_timeout,
        }
    }

    /// Attempts delivery, returning the name of the notifier that
    /// succeeded.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's [`NotifyError`] once the chain is
    /// exhausted or the policy stops fallback.
    pub async fn deliver(&self, notification: &Notification) -> Result<String, NotifyError> {
        let mut last = NotifyError::Provider("no notifiers configured".into());

        for notifier in &self.notifiers {
            let attempt = tokio::time::timeout(self.attempt_timeout, notifier.send(notification));
            let error = match attempt.await {
                Ok(Ok(())) => return Ok(notifier.name().to_owned()),
                Ok(Err(err)) => err,
                Err(_) => NotifyError::Timeout,
            };

            tracing::warn!(
                notifier = notifier.name(),
                error = %error,
                "notification attempt failed"
            );
            let stop = !self.policy.falls_through(&error);
            last = error;
            if stop {
                break;
            }
        }

        Err(last)
    }
}
