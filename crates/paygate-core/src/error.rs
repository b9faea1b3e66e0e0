//! The pipeline error taxonomy.
//!
//! Gate-level rejections live in the gate crate; everything that can
//! happen after an event passes the gate is classified here. The split
//! that matters for the provider is retryable (`TransientFailure`, HTTP
//! 5xx) versus terminal (`Outcome`, HTTP 200).

use thiserror::Error;

/// Failure classes for a single processing attempt.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Expected to succeed on a later redelivery (network blip, downstream
    /// outage, timeout).
    #[error("transient failure: {0}")]
    Transient(String),

    /// Will never succeed regardless of retries; recorded and surfaced as
    /// a 200 so the provider stops redelivering.
    #[error("permanent failure: {0}")]
    Permanent(String),
}

/// Errors surfaced by the event store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or the operation could not be
    /// confirmed. Always treated as retryable.
    #[error("event store unavailable: {0}")]
    Unavailable(String),

    /// No row exists for the given provider event id.
    #[error("no stored event for provider event {0}")]
    Missing(String),
}

/// Errors surfaced by the business data layer.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// The data layer could not be reached; retryable.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The data layer refused the change; no retry will help.
    #[error("ledger rejected change: {0}")]
    Rejected(String),
}

/// Errors surfaced by a notification send attempt.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    /// The send did not complete within its timeout.
    #[error("notification send timed out")]
    Timeout,

    /// The notification provider reported an error.
    #[error("notification provider error: {0}")]
    Provider(String),

    /// The recipient address is unusable; retrying the same send is
    /// pointless.
    #[error("invalid recipient: {0}")]
    Recipient(String),
}

/// A failure the provider should resolve by redelivering the event.
///
/// Maps to an HTTP 5xx. Nothing that produces this error leaves the event
/// in a state a retry cannot recover from.
#[derive(Debug, Error)]
#[error("transient failure: {0}")]
pub struct TransientFailure(pub String);

impl From<StoreError> for TransientFailure {
    fn from(err: StoreError) -> Self {
        Self(err.to_string())
    }
}

/// Terminal result of handling a verified event. All variants map to an
/// HTTP 200; the provider has nothing left to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Business effects applied on this delivery.
    Processed,
    /// The event had already been processed; nothing was re-applied.
    DuplicateIgnored,
    /// The event can never succeed; recorded as `failed` and logged for
    /// manual investigation.
    PermanentlyFailed,
}

impl Outcome {
    /// Returns the wire representation used in response bodies.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::DuplicateIgnored => "duplicate_ignored",
            Self::PermanentlyFailed => "failed",
        }
    }
}
