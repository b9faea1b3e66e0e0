//! Paygate Pipeline — the webhook pipeline's bounded context.
//!
//! `domain` holds the per-event-type business logic: the handler trait,
//! the concrete handlers, the dispatch registry, and the notification
//! fallback chain. `application` holds the orchestrator that turns one
//! verified delivery into exactly one recorded processing attempt.

pub mod application;
pub mod domain;
