//! `PostgreSQL` implementation of the `EventStore` trait.
//!
//! `record` is an `INSERT ... ON CONFLICT DO NOTHING` against the unique
//! key; `claim` opens a transaction and takes the row lock with
//! `SELECT ... FOR UPDATE`, holding it through the guard until the
//! attempt commits a terminal status. Dropping a guard rolls the
//! `processing` transition back, so an abandoned attempt never pins a
//! row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use paygate_core::error::StoreError;
use paygate_core::event::{EventStatus, NewWebhookEvent, WebhookEvent};
use paygate_core::store::{Claim, ClaimedAttempt, EventStore, InsertOutcome};

const SELECT_FOR_UPDATE: &str = "
SELECT provider_event_id, event_type, status, attempts, last_error,
       raw_payload, received_at, processed_at
FROM webhook_events
WHERE provider_event_id = $1
FOR UPDATE
";

/// PostgreSQL-backed event store.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Creates a new `PgEventStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_err(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn row_to_event(row: &PgRow) -> Result<WebhookEvent, StoreError> {
    let status_raw: String = row.try_get("status").map_err(store_err)?;
    let status = EventStatus::parse(&status_raw)
        .ok_or_else(|| StoreError::Unavailable(format!("unknown status value: {status_raw}")))?;
    Ok(WebhookEvent {
        provider_event_id: row.try_get("provider_event_id").map_err(store_err)?,
        event_type: row.try_get("event_type").map_err(store_err)?,
        status,
        attempts: row.try_get("attempts").map_err(store_err)?,
        last_error: row.try_get("last_error").map_err(store_err)?,
        raw_payload: row.try_get("raw_payload").map_err(store_err)?,
        received_at: row.try_get("received_at").map_err(store_err)?,
        processed_at: row.try_get("processed_at").map_err(store_err)?,
    })
}

struct PgClaimedAttempt {
    tx: Transaction<'static, Postgres>,
    event: WebhookEvent,
}

#[async_trait]
impl ClaimedAttempt for PgClaimedAttempt {
    fn event(&self) -> &WebhookEvent {
        &self.event
    }

    async fn complete(mut self: Box<Self>, processed_at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE webhook_events
             SET status = 'processed', processed_at = $2
             WHERE provider_event_id = $1",
        )
        .bind(&self.event.provider_event_id)
        .bind(processed_at)
        .execute(&mut *self.tx)
        .await
        .map_err(store_err)?;
        self.tx.commit().await.map_err(store_err)
    }

    async fn fail(mut self: Box<Self>, error: &str) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE webhook_events
             SET status = 'failed', last_error = $2
             WHERE provider_event_id = $1",
        )
        .bind(&self.event.provider_event_id)
        .bind(error)
        .execute(&mut *self.tx)
        .await
        .map_err(store_err)?;
        self.tx.commit().await.map_err(store_err)
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn record(&self, event: NewWebhookEvent) -> Result<InsertOutcome, StoreError> {
        let result = sqlx::query(
            "INSERT INTO webhook_events
                 (provider_event_id, event_type, status, attempts, raw_payload, received_at)
             VALUES ($1, $2, 'received', 0, $3, $4)
             ON CONFLICT (provider_event_id) DO NOTHING",
        )
        .bind(&event.provider_event_id)
        .bind(&event.event_type)
        .bind(&event.raw_payload)
        .bind(event.received_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        if result.rows_affected() == 1 {
            Ok(InsertOutcome::Inserted)
        } else {
            tracing::debug!(
                provider_event_id = %event.provider_event_id,
                "insert conflicted with an existing row"
            );
            Ok(InsertOutcome::AlreadySeen)
        }
    }

    async fn fetch(&self, provider_event_id: &str) -> Result<Option<WebhookEvent>, StoreError> {
        let row = sqlx::query(
            "SELECT provider_event_id, event_type, status, attempts, last_error,
                    raw_payload, received_at, processed_at
             FROM webhook_events
             WHERE provider_event_id = $1",
        )
        .bind(provider_event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.as_ref().map(row_to_event).transpose()
    }

    async fn claim(&self, provider_event_id: &str) -> Result<Claim, StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let row = sqlx::query(SELECT_FOR_UPDATE)
            .bind(provider_event_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_err)?;
        let Some(row) = row else {
            return Err(StoreError::Missing(provider_event_id.to_owned()));
        };
        let event = row_to_event(&row)?;

        if event.status == EventStatus::Processed {
            // Dropping the transaction releases the lock.
            return Ok(Claim::AlreadyProcessed);
        }

        sqlx::query(
            "UPDATE webhook_events
             SET status = 'processing', attempts = attempts + 1
             WHERE provider_event_id = $1",
        )
        .bind(provider_event_id)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        let event = WebhookEvent {
            status: EventStatus::Processing,
            attempts: event.attempts + 1,
            ..event
        };
        Ok(Claim::Attempt(Box::new(PgClaimedAttempt { tx, event })))
    }

    async fn find_stale_processing(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<WebhookEvent>, StoreError> {
        let rows = sqlx::query(
            "SELECT provider_event_id, event_type, status, attempts, last_error,
                    raw_payload, received_at, processed_at
             FROM webhook_events
             WHERE status = 'processing' AND received_at < $1
             ORDER BY received_at",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.iter().map(row_to_event).collect()
    }
}
