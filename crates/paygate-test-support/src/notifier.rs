//! Mock `Notifier` implementations for tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use paygate_core::error::NotifyError;
use paygate_core::notify::{Notification, Notifier};

/// A notifier that records every send and always succeeds.
#[derive(Debug)]
pub struct RecordingNotifier {
    name: String,
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Creates a recording notifier with the given name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all notifications sent through this notifier.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of notifications sent.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// A notifier that always fails with the configured error.
#[derive(Debug)]
pub struct FailingNotifier {
    name: String,
    error: NotifyError,
    attempts: Mutex<usize>,
}

impl FailingNotifier {
    /// Creates a notifier that fails every send with `error`.
    #[must_use]
    pub fn new(name: &str, error: NotifyError) -> Self {
        Self {
            name: name.to_owned(),
            error,
            attempts: Mutex::new(0),
        }
    }

    /// Number of send attempts made against this notifier.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn attempt_count(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl Notifier for FailingNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
        *self.attempts.lock().unwrap() += 1;
        Err(self.error.clone())
    }
}

/// A notifier that sleeps before succeeding, for exercising per-attempt
/// timeouts.
#[derive(Debug)]
pub struct SlowNotifier {
    name: String,
    delay: Duration,
}

impl SlowNotifier {
    /// Creates a notifier that takes `delay` to deliver.
    #[must_use]
    pub fn new(name: &str, delay: Duration) -> Self {
        Self {
            name: name.to_owned(),
            delay,
        }
    }
}

#[async_trait]
impl Notifier for SlowNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}
