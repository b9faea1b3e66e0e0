//! Boundary adapters for the external collaborators.
//!
//! The business data layer and the mail delivery backends live outside
//! this service. These adapters are the wiring points: deployments link
//! the real implementations here, and environments without them (local
//! runs, smoke tests) fall back to the tracing stand-ins, which accept
//! every call and emit a structured log instead of a side effect.

use async_trait::async_trait;
use paygate_core::error::{LedgerError, NotifyError};
use paygate_core::ledger::{LedgerChange, PaymentLedger};
use paygate_core::notify::{Notification, Notifier};

/// Stand-in notifier that logs deliveries instead of sending them.
#[derive(Debug)]
pub struct TracingNotifier {
    name: String,
}

impl TracingNotifier {
    /// Creates a stand-in notifier with the given path name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
        }
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            notifier = %self.name,
            template = %notification.template,
            recipient = %notification.recipient,
            "notification dispatched"
        );
        Ok(())
    }
}

/// Stand-in ledger that logs changes instead of persisting them.
#[derive(Debug, Clone, Copy)]
pub struct TracingLedger;

#[async_trait]
impl PaymentLedger for TracingLedger {
    async fn apply(&self, change: LedgerChange) -> Result<(), LedgerError> {
        tracing::info!(kind = %change.kind, "ledger change applied");
        Ok(())
    }
}
