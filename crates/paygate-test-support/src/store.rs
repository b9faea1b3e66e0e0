//! In-memory `EventStore` for tests.
//!
//! Mirrors the semantics of the Postgres store: insert-or-detect on
//! record, per-id serialization of claims, and rollback of the
//! `processing` transition when an attempt guard is dropped without a
//! terminal transition.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paygate_core::error::StoreError;
use paygate_core::event::{EventStatus, NewWebhookEvent, WebhookEvent};
use paygate_core::store::{Claim, ClaimedAttempt, EventStore, InsertOutcome};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Rows = Arc<Mutex<HashMap<String, WebhookEvent>>>;

/// An event store held entirely in memory.
#[derive(Default)]
pub struct InMemoryEventStore {
    rows: Rows,
    row_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    unavailable: AtomicBool,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row directly, bypassing the `record` path. Useful for
    /// staging crash-recovery scenarios.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn seed(&self, event: WebhookEvent) {
        self.rows
            .lock()
            .unwrap()
            .insert(event.provider_event_id.clone(), event);
    }

    /// Returns a snapshot of the row for `provider_event_id`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn get(&self, provider_event_id: &str) -> Option<WebhookEvent> {
        self.rows.lock().unwrap().get(provider_event_id).cloned()
    }

    /// Number of stored rows.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Whether the store holds no rows.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.lock().unwrap().is_empty()
    }

    /// Toggles simulated store outage: while set, every trait operation
    /// returns [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated outage".into()));
        }
        Ok(())
    }

    fn lock_for(&self, provider_event_id: &str) -> Arc<AsyncMutex<()>> {
        self.row_locks
            .lock()
            .unwrap()
            .entry(provider_event_id.to_owned())
            .or_default()
            .clone()
    }
}

struct InMemoryAttempt {
    rows: Rows,
    event: WebhookEvent,
    prior: WebhookEvent,
    done: bool,
    _lock: OwnedMutexGuard<()>,
}

impl Drop for InMemoryAttempt {
    fn drop(&mut self) {
        // Abandoned attempt: roll the processing transition back, the way
        // the Postgres transaction does on drop.
        if !self.done {
            self.rows
                .lock()
                .unwrap()
                .insert(self.prior.provider_event_id.clone(), self.prior.clone());
        }
    }
}

#[async_trait]
impl ClaimedAttempt for InMemoryAttempt {
    fn event(&self) -> &WebhookEvent {
        &self.event
    }

    async fn complete(mut self: Box<Self>, processed_at: DateTime<Utc>) -> Result<(), StoreError> {
        self.done = true;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&self.event.provider_event_id)
            .ok_or_else(|| StoreError::Missing(self.event.provider_event_id.clone()))?;
        row.status = EventStatus::Processed;
        row.processed_at = Some(processed_at);
        Ok(())
    }

    async fn fail(mut self: Box<Self>, error: &str) -> Result<(), StoreError> {
        self.done = true;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&self.event.provider_event_id)
            .ok_or_else(|| StoreError::Missing(self.event.provider_event_id.clone()))?;
        row.status = EventStatus::Failed;
        row.last_error = Some(error.to_owned());
        Ok(())
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn record(&self, event: NewWebhookEvent) -> Result<InsertOutcome, StoreError> {
        self.check_available()?;
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&event.provider_event_id) {
            return Ok(InsertOutcome::AlreadySeen);
        }
        rows.insert(
            event.provider_event_id.clone(),
            WebhookEvent {
                provider_event_id: event.provider_event_id,
                event_type: event.event_type,
                status: EventStatus::Received,
                attempts: 0,
                last_error: None,
                raw_payload: event.raw_payload,
                received_at: event.received_at,
                processed_at: None,
            },
        );
        Ok(InsertOutcome::Inserted)
    }

    async fn fetch(&self, provider_event_id: &str) -> Result<Option<WebhookEvent>, StoreError> {
        self.check_available()?;
        Ok(self.get(provider_event_id))
    }

    async fn claim(&self, provider_event_id: &str) -> Result<Claim, StoreError> {
        self.check_available()?;
        let lock = self.lock_for(provider_event_id).lock_owned().await;

        let (prior, event) = {
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .get_mut(provider_event_id)
                .ok_or_else(|| StoreError::Missing(provider_event_id.to_owned()))?;
            if row.status == EventStatus::Processed {
                return Ok(Claim::AlreadyProcessed);
            }
            let prior = row.clone();
            row.status = EventStatus::Processing;
            row.attempts += 1;
            (prior, row.clone())
        };

        Ok(Claim::Attempt(Box::new(InMemoryAttempt {
            rows: Arc::clone(&self.rows),
            event,
            prior,
            done: false,
            _lock: lock,
        })))
    }

    async fn find_stale_processing(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<WebhookEvent>, StoreError> {
        self.check_available()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|row| row.status == EventStatus::Processing && row.received_at < cutoff)
            .cloned()
            .collect())
    }
}
