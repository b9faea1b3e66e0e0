//! Turns one verified delivery into exactly one recorded processing
//! attempt.
//!
//! Idempotency rests on the event store: the insert-or-detect on
//! `record` plus the row lock held by a claim guarantee that for any
//! provider event id, business effects are applied at most once no
//! matter how many times or how concurrently the provider delivers.

use std::sync::Arc;

use paygate_core::clock::Clock;
use paygate_core::error::{Outcome, ProcessError, TransientFailure};
use paygate_core::event::{EventStatus, NewWebhookEvent, VerifiedEvent};
use paygate_core::store::{Claim, EventStore, InsertOutcome};

use crate::domain::registry::HandlerRegistry;

/// The orchestrator: idempotency check, dispatch, outcome persistence.
pub struct Orchestrator {
    store: Arc<dyn EventStore>,
    registry: HandlerRegistry,
    clock: Arc<dyn Clock>,
}

impl Orchestrator {
    /// Creates an orchestrator over the given store and handler registry.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>, registry: HandlerRegistry, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            registry,
            clock,
        }
    }

    /// Handles one verified delivery.
    ///
    /// A duplicate of an already-processed event short-circuits without
    /// touching business logic. A row found `received`, `failed`, or
    /// left `processing` by a crashed attempt is claimed and processed;
    /// that is what makes provider redelivery a working retry mechanism.
    ///
    /// # Errors
    ///
    /// Returns [`TransientFailure`] when the store cannot confirm the
    /// attempt or the handler failed in a retryable way; the provider is
    /// expected to redeliver.
    pub async fn handle(&self, event: &VerifiedEvent) -> Result<Outcome, TransientFailure> {
        let provider_event_id = event.provider_event_id.as_str();

        let inserted = self
            .store
            .record(NewWebhookEvent {
                provider_event_id: provider_event_id.to_owned(),
                event_type: event.kind.as_str().to_owned(),
                raw_payload: event.raw_payload.clone(),
                received_at: self.clock.now(),
            })
            .await?;

        // Fast path: a finished duplicate needs no row lock.
        if inserted == InsertOutcome::AlreadySeen {
            if let Some(existing) = self.store.fetch(provider_event_id).await? {
                if existing.status == EventStatus::Processed {
                    tracing::info!(provider_event_id, "duplicate delivery ignored");
                    return Ok(Outcome::DuplicateIgnored);
                }
            }
        }

        let attempt = match self.store.claim(provider_event_id).await? {
            Claim::AlreadyProcessed => {
                // Lost the race against a concurrent delivery of the same
                // event; its success is ours.
                tracing::info!(provider_event_id, "duplicate delivery ignored");
                return Ok(Outcome::DuplicateIgnored);
            }
            Claim::Attempt(attempt) => attempt,
        };
        let attempts = attempt.event().attempts;

        let handler = self.registry.resolve(&event.kind);
        match handler.apply(event).await {
            Ok(()) => {
                attempt.complete(self.clock.now()).await?;
                tracing::info!(provider_event_id, attempts, kind = %event.kind, "event processed");
                Ok(Outcome::Processed)
            }
            Err(ProcessError::Permanent(reason)) => {
                attempt.fail(&reason).await?;
                tracing::error!(
                    provider_event_id,
                    attempts,
                    reason = %reason,
                    "permanent failure; recorded and not retried"
                );
                Ok(Outcome::PermanentlyFailed)
            }
            Err(ProcessError::Transient(reason)) => {
                attempt.fail(&reason).await?;
                tracing::warn!(
                    provider_event_id,
                    attempts,
                    reason = %reason,
                    "transient failure; provider will redeliver"
                );
                Err(TransientFailure(reason))
            }
        }
    }
}
