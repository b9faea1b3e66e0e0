//! Notification service abstraction.

use async_trait::async_trait;

use crate::error::NotifyError;

/// A user-facing notification derived from a payment event.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Template identifier understood by the rendering engine.
    pub template: String,
    /// Recipient address.
    pub recipient: String,
    /// Template parameters.
    pub parameters: serde_json::Value,
}

/// One way of delivering a notification. Implementations are
/// interchangeable; the pipeline chains them in fallback order.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A stable name for logging which path delivered.
    fn name(&self) -> &str;

    /// Sends the notification.
    ///
    /// # Errors
    ///
    /// Returns a [`NotifyError`] classifying why the send did not happen.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}
