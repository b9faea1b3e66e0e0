//! The webhook ingestion endpoint.
//!
//! The body is extracted as raw `Bytes` so signature verification runs
//! over the exact wire bytes, before any JSON parsing.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Json, Router, routing::post};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the provider's `t=...,v1=...` signature.
pub const SIGNATURE_HEADER: &str = "x-payment-signature";

/// Acknowledgement returned for every terminal outcome.
#[derive(Serialize)]
pub struct WebhookAck {
    /// `processed`, `duplicate_ignored`, or `failed`.
    pub status: &'static str,
    /// Provider event id the acknowledgement refers to.
    pub event_id: String,
}

/// POST /webhooks/payments
async fn receive_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let source = client_source(&headers);
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let event = state.gate.admit(&source, signature, &body).await?;
    let outcome = state.orchestrator.handle(&event).await?;

    Ok(Json(WebhookAck {
        status: outcome.as_str(),
        event_id: event.provider_event_id,
    }))
}

/// First `X-Forwarded-For` entry set by the edge proxy, else a shared
/// bucket for unproxied traffic.
fn client_source(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or_else(|| "unknown".to_owned(), ToOwned::to_owned)
}

/// Returns the webhook router.
pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks/payments", post(receive_payment_webhook))
}
