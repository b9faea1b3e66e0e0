//! Business data layer abstraction.
//!
//! The pipeline does not own payment or subscription state; it hands each
//! event's durable effect to this interface and only interprets the
//! success/failure result. Implementations are expected to check current
//! state before overwriting, since events about the same business entity
//! may arrive out of order under distinct provider event ids.

use async_trait::async_trait;

use crate::error::LedgerError;
use crate::event::EventKind;

/// A durable state change derived from one provider event.
#[derive(Debug, Clone)]
pub struct LedgerChange {
    /// The event kind driving the change.
    pub kind: EventKind,
    /// The event's `data` object, opaque to the pipeline.
    pub payload: serde_json::Value,
}

/// Applies payment lifecycle changes to durable business state.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Applies the change.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unavailable`] when the data layer cannot be
    /// reached (retryable) and [`LedgerError::Rejected`] when the change
    /// can never be applied.
    async fn apply(&self, change: LedgerChange) -> Result<(), LedgerError>;
}
