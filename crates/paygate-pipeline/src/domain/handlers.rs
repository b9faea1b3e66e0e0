//! Concrete per-event-type handlers.
//!
//! Every handler follows the same discipline: the durable ledger change
//! decides the fate of the event, the customer notification is
//! best-effort. A notification that cannot be delivered is logged and
//! dropped; it never fails an event whose money state is already
//! correct.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use paygate_core::error::{LedgerError, ProcessError};
use paygate_core::event::{EventKind, VerifiedEvent};
use paygate_core::ledger::{LedgerChange, PaymentLedger};
use paygate_core::notify::Notification;

use super::notification::NotifierChain;

/// Applies one event type's business effects.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Applies the handler's effects for `event`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Transient`] when a retry can succeed and
    /// [`ProcessError::Permanent`] when it cannot.
    async fn apply(&self, event: &VerifiedEvent) -> Result<(), ProcessError>;
}

/// Shared collaborators for the lifecycle handlers.
pub struct HandlerDeps {
    /// Business data layer.
    pub ledger: Arc<dyn PaymentLedger>,
    /// Notification fallback chain.
    pub notifiers: Arc<NotifierChain>,
    /// Timeout for one ledger apply call.
    pub ledger_timeout: Duration,
}

impl HandlerDeps {
    async fn apply_ledger(&self, kind: EventKind, event: &VerifiedEvent) -> Result<(), ProcessError> {
        let change = LedgerChange {
            kind,
            payload: event.data.clone(),
        };
        let applied = tokio::time::timeout(self.ledger_timeout, self.ledger.apply(change)).await;
        match applied {
            Ok(Ok(())) => Ok(()),
            Ok(Err(LedgerError::Unavailable(reason))) => Err(ProcessError::Transient(reason)),
            Ok(Err(LedgerError::Rejected(reason))) => Err(ProcessError::Permanent(reason)),
            Err(_) => Err(ProcessError::Transient("ledger apply timed out".into())),
        }
    }

    /// Best-effort customer notification. Failure is logged, never
    /// propagated; the state update has already succeeded.
    async fn notify(&self, event: &VerifiedEvent, template: &str) {
        let Some(recipient) = event
            .data
            .get("customer_email")
            .and_then(serde_json::Value::as_str)
            .filter(|r| !r.is_empty())
        else {
            tracing::debug!(
                provider_event_id = %event.provider_event_id,
                "event carries no recipient; skipping notification"
            );
            return;
        };

        let notification = Notification {
            template: template.to_owned(),
            recipient: recipient.to_owned(),
            parameters: event.data.clone(),
        };
        match self.notifiers.deliver(&notification).await {
            Ok(via) => tracing::info!(
                provider_event_id = %event.provider_event_id,
                via = %via,
                template,
                "notification delivered"
            ),
            Err(err) => tracing::warn!(
                provider_event_id = %event.provider_event_id,
                error = %err,
                template,
                "notification undeliverable; event outcome unaffected"
            ),
        }
    }
}

/// Reacts to `payment.succeeded`: records the settled payment, then sends
/// the receipt.
pub struct PaymentSucceededHandler(pub Arc<HandlerDeps>);

#[async_trait]
impl EventHandler for PaymentSucceededHandler {
    async fn apply(&self, event: &VerifiedEvent) -> Result<(), ProcessError> {
        self.0.apply_ledger(EventKind::PaymentSucceeded, event).await?;
        self.0.notify(event, "payment-receipt").await;
        Ok(())
    }
}

/// Reacts to `payment.failed`: records the failed payment, then sends the
/// dunning notice.
pub struct PaymentFailedHandler(pub Arc<HandlerDeps>);

#[async_trait]
impl EventHandler for PaymentFailedHandler {
    async fn apply(&self, event: &VerifiedEvent) -> Result<(), ProcessError> {
        self.0.apply_ledger(EventKind::PaymentFailed, event).await?;
        self.0.notify(event, "payment-failed").await;
        Ok(())
    }
}

/// Reacts to `charge.succeeded`: records the charge, then sends the
/// charge receipt.
pub struct ChargeSucceededHandler(pub Arc<HandlerDeps>);

#[async_trait]
impl EventHandler for ChargeSucceededHandler {
    async fn apply(&self, event: &VerifiedEvent) -> Result<(), ProcessError> {
        self.0.apply_ledger(EventKind::ChargeSucceeded, event).await?;
        self.0.notify(event, "charge-receipt").await;
        Ok(())
    }
}

/// Reacts to `charge.failed`: records the declined charge, then notifies
/// the customer.
pub struct ChargeFailedHandler(pub Arc<HandlerDeps>);

#[async_trait]
impl EventHandler for ChargeFailedHandler {
    async fn apply(&self, event: &VerifiedEvent) -> Result<(), ProcessError> {
        self.0.apply_ledger(EventKind::ChargeFailed, event).await?;
        self.0.notify(event, "charge-failed").await;
        Ok(())
    }
}

/// Default handler for well-formed event types this pipeline does not
/// react to. Accepting them as successful no-ops keeps the endpoint
/// forward-compatible as the provider adds types.
pub struct UnrecognizedEventHandler;

#[async_trait]
impl EventHandler for UnrecognizedEventHandler {
    async fn apply(&self, event: &VerifiedEvent) -> Result<(), ProcessError> {
        tracing::info!(
            provider_event_id = %event.provider_event_id,
            kind = %event.kind,
            "no handler for event type; accepting as no-op"
        );
        Ok(())
    }
}
