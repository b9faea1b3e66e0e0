//! The webhook event model — the unit of idempotency and audit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing status of a stored webhook event.
///
/// Status only moves forward: `received → processing → {processed |
/// failed}`. A `failed` event may be claimed again, transitioning back to
/// `processing` and incrementing the attempt count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Row created, no processing attempt started yet.
    Received,
    /// A handler currently owns this event.
    Processing,
    /// Business effects applied; terminal success.
    Processed,
    /// Last attempt failed; eligible for retry on redelivery.
    Failed,
}

impl EventStatus {
    /// Returns the storage representation of this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Processing => "processing",
            Self::Processed => "processed",
            Self::Failed => "failed",
        }
    }

    /// Parses the storage representation back into a status.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "received" => Some(Self::Received),
            "processing" => Some(Self::Processing),
            "processed" => Some(Self::Processed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// The closed set of provider event types this pipeline reacts to.
///
/// Providers add new event types over time; anything outside the known
/// set is carried as `Unrecognized` and routed to the default no-op
/// handler rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A payment settled successfully.
    PaymentSucceeded,
    /// A payment attempt failed.
    PaymentFailed,
    /// An individual charge succeeded.
    ChargeSucceeded,
    /// An individual charge failed.
    ChargeFailed,
    /// A well-formed type tag this pipeline has no handler for.
    Unrecognized(String),
}

impl EventKind {
    /// Maps a provider type tag onto the known set.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        match tag {
            "payment.succeeded" => Self::PaymentSucceeded,
            "payment.failed" => Self::PaymentFailed,
            "charge.succeeded" => Self::ChargeSucceeded,
            "charge.failed" => Self::ChargeFailed,
            other => Self::Unrecognized(other.to_owned()),
        }
    }

    /// Returns the provider type tag for this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::PaymentSucceeded => "payment.succeeded",
            Self::PaymentFailed => "payment.failed",
            Self::ChargeSucceeded => "charge.succeeded",
            Self::ChargeFailed => "charge.failed",
            Self::Unrecognized(tag) => tag,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored representation of a provider event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Globally unique identifier assigned by the provider; natural key.
    pub provider_event_id: String,
    /// Raw provider type tag (e.g. `payment.succeeded`).
    pub event_type: String,
    /// Current processing status.
    pub status: EventStatus,
    /// Number of processing attempts so far.
    pub attempts: i32,
    /// Reason the last attempt failed, if any.
    pub last_error: Option<String>,
    /// Verbatim decoded event body, retained for replay and audit.
    pub raw_payload: serde_json::Value,
    /// When the event was first seen.
    pub received_at: DateTime<Utc>,
    /// When the event reached `processed`; unset otherwise.
    pub processed_at: Option<DateTime<Utc>>,
}

/// A not-yet-persisted event row, as built from a verified delivery.
#[derive(Debug, Clone)]
pub struct NewWebhookEvent {
    /// Globally unique identifier assigned by the provider.
    pub provider_event_id: String,
    /// Raw provider type tag.
    pub event_type: String,
    /// Verbatim decoded event body.
    pub raw_payload: serde_json::Value,
    /// When the event was received.
    pub received_at: DateTime<Utc>,
}

/// An event that has passed the security gate.
///
/// Carries both the extracted fields the pipeline dispatches on and the
/// full decoded envelope for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedEvent {
    /// Globally unique identifier assigned by the provider.
    pub provider_event_id: String,
    /// Dispatch key derived from the provider type tag.
    pub kind: EventKind,
    /// The event's `data` object.
    pub data: serde_json::Value,
    /// The full decoded envelope.
    pub raw_payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_storage_representation() {
        for status in [
            EventStatus::Received,
            EventStatus::Processing,
            EventStatus::Processed,
            EventStatus::Failed,
        ] {
            assert_eq!(EventStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_status_parse_rejects_unknown_value() {
        assert_eq!(EventStatus::parse("pending"), None);
    }

    #[test]
    fn test_event_kind_parses_known_tags() {
        assert_eq!(
            EventKind::parse("payment.succeeded"),
            EventKind::PaymentSucceeded
        );
        assert_eq!(EventKind::parse("charge.failed"), EventKind::ChargeFailed);
    }

    #[test]
    fn test_event_kind_preserves_unrecognized_tag() {
        let kind = EventKind::parse("invoice.finalized");
        assert_eq!(kind, EventKind::Unrecognized("invoice.finalized".into()));
        assert_eq!(kind.as_str(), "invoice.finalized");
    }
}
