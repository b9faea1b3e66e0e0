//! Event store abstraction.
//!
//! The store is the single source of truth for idempotency. Uniqueness of
//! `provider_event_id` is enforced at the storage layer, and a claim holds
//! a row-level lock (or an equivalent guard) for the whole read-modify-
//! write of one processing attempt, so concurrent handlers for the same
//! event serialize rather than race.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::event::{NewWebhookEvent, WebhookEvent};

/// Result of recording a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was created with status `received`.
    Inserted,
    /// A row for this provider event id already existed.
    AlreadySeen,
}

/// Result of claiming an event for processing.
pub enum Claim {
    /// The event is ours to process; the guard holds the row lock.
    Attempt(Box<dyn ClaimedAttempt>),
    /// The event already reached `processed`; do not re-apply.
    AlreadyProcessed,
}

/// An exclusive, in-flight processing attempt on one event row.
///
/// The row was transitioned to `processing` and its attempt count
/// incremented when the claim was granted. The guard must be consumed by
/// exactly one of [`complete`](Self::complete) or [`fail`](Self::fail);
/// dropping it releases the lock without publishing a terminal status, so
/// a later delivery can claim the row again.
#[async_trait]
pub trait ClaimedAttempt: Send {
    /// The claimed row as of the start of this attempt.
    fn event(&self) -> &WebhookEvent;

    /// Publishes terminal success: `status = processed`, `processed_at`
    /// set.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the transition cannot be
    /// confirmed; the event must then be treated as not-yet-processed.
    async fn complete(self: Box<Self>, processed_at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Publishes failure: `status = failed`, `last_error` recorded. The
    /// row remains claimable by a later delivery.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the transition cannot be
    /// confirmed.
    async fn fail(self: Box<Self>, error: &str) -> Result<(), StoreError>;
}

/// Durable table of processed event identifiers with status and attempt
/// metadata.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Atomic insert-or-detect: creates the row with `status = received`,
    /// or reports that this provider event id has been seen before.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the insert cannot be
    /// confirmed.
    async fn record(&self, event: NewWebhookEvent) -> Result<InsertOutcome, StoreError>;

    /// Fetches the stored row for a provider event id, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] on store failure.
    async fn fetch(&self, provider_event_id: &str) -> Result<Option<WebhookEvent>, StoreError>;

    /// Claims the event for exclusive processing. Blocks while another
    /// claim for the same id is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Missing`] if no row exists (record first) and
    /// [`StoreError::Unavailable`] on store failure.
    async fn claim(&self, provider_event_id: &str) -> Result<Claim, StoreError>;

    /// Rows stuck in `processing` since before `cutoff`, as input for
    /// the external sweep process that re-queues abandoned attempts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] on store failure.
    async fn find_stale_processing(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<WebhookEvent>, StoreError>;
}
