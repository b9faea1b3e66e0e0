//! Paygate Event Store — PostgreSQL implementation of the `EventStore`
//! trait.
//!
//! The `webhook_events` table (see `migrations/`) carries a UNIQUE
//! primary key on `provider_event_id`; at-most-once processing is
//! anchored there, not in application code.

pub mod pg_event_store;
