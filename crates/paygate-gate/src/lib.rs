//! Paygate Security Gate.
//!
//! Everything that must be true before an event touches business logic:
//! the request is under the source's rate limit, the signature proves the
//! body came from the provider unmodified, and the decoded envelope has
//! the minimal shape the pipeline relies on. Failures here are HTTP-level
//! rejections; nothing is persisted for a request turned away at the
//! door.

pub mod rate_limit;
pub mod shape;
pub mod signature;

use std::sync::Arc;
use std::time::Duration;

use paygate_core::clock::Clock;
use paygate_core::event::VerifiedEvent;
use paygate_core::rate::RateDecision;
use thiserror::Error;

use crate::rate_limit::FixedWindowLimiter;
use crate::shape::ShapeError;
use crate::signature::SignatureError;

/// A request rejected by the gate.
#[derive(Debug, Error)]
pub enum GateError {
    /// The source exceeded its request allowance for the current window.
    #[error("rate limit exceeded")]
    RateLimited {
        /// How long the caller should wait before retrying.
        retry_after: Duration,
    },

    /// The signature was missing, malformed, stale, or did not match.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// The decoded event failed structural validation.
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// The gate itself: rate limit, then signature, then shape.
///
/// Rate limiting runs first so a delivery storm is shed before any MAC
/// computation; the count therefore includes requests that would have
/// failed verification anyway.
pub struct SecurityGate {
    secret: String,
    tolerance: Duration,
    limiter: FixedWindowLimiter,
    clock: Arc<dyn Clock>,
}

impl SecurityGate {
    /// Creates a gate with the shared `secret`, signature timestamp
    /// `tolerance`, and per-source `limiter`.
    #[must_use]
    pub fn new(
        secret: String,
        tolerance: Duration,
        limiter: FixedWindowLimiter,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            secret,
            tolerance,
            limiter,
            clock,
        }
    }

    /// Admits a raw delivery or rejects it with the reason.
    ///
    /// # Errors
    ///
    /// Returns [`GateError`] for a rate-limited source, a failed
    /// signature check, or a malformed envelope.
    pub async fn admit(
        &self,
        source: &str,
        signature_header: Option<&str>,
        raw_body: &[u8],
    ) -> Result<VerifiedEvent, GateError> {
        if let RateDecision::Limited { retry_after } = self.limiter.check(source).await {
            tracing::warn!(source, ?retry_after, "rate limit exceeded");
            return Err(GateError::RateLimited { retry_after });
        }

        let header = signature_header.ok_or(SignatureError::Missing)?;
        signature::verify_signature(
            raw_body,
            header,
            &self.secret,
            self.tolerance,
            self.clock.now(),
        )?;

        let event = shape::validate_shape(raw_body)?;
        tracing::debug!(
            provider_event_id = %event.provider_event_id,
            kind = %event.kind,
            "delivery admitted"
        );
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paygate_core::event::EventKind;
    use paygate_test_support::FixedClock;

    use crate::rate_limit::InMemoryRateCounter;

    const SECRET: &str = "whsec_gate_secret";

    fn fixed_now() -> chrono::DateTime<chrono::Utc> {
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn gate(max_requests: u64) -> SecurityGate {
        let clock = Arc::new(FixedClock(fixed_now()));
        let counter = Arc::new(InMemoryRateCounter::new(clock.clone()));
        let limiter = FixedWindowLimiter::new(counter, max_requests, Duration::from_secs(60));
        SecurityGate::new(
            SECRET.to_owned(),
            Duration::from_secs(300),
            limiter,
            clock,
        )
    }

    fn signed(body: &[u8]) -> String {
        signature::signature_header(SECRET, fixed_now().timestamp(), body)
    }

    #[tokio::test]
    async fn test_signed_well_formed_delivery_admitted() {
        let gate = gate(10);
        let body = br#"{"id":"evt_1","type":"payment.succeeded","data":{"amount":100}}"#;

        let event = gate
            .admit("10.0.0.1", Some(&signed(body)), body)
            .await
            .unwrap();
        assert_eq!(event.provider_event_id, "evt_1");
        assert_eq!(event.kind, EventKind::PaymentSucceeded);
    }

    #[tokio::test]
    async fn test_missing_signature_header_rejected() {
        let gate = gate(10);
        let body = br#"{"id":"evt_1","type":"payment.succeeded","data":{"a":1}}"#;

        let err = gate.admit("10.0.0.1", None, body).await.unwrap_err();
        assert!(matches!(
            err,
            GateError::Signature(SignatureError::Missing)
        ));
    }

    #[tokio::test]
    async fn test_bad_signature_rejected_before_shape_check() {
        let gate = gate(10);
        // Shape is also invalid; the signature failure must win.
        let body = b"not json at all";

        let err = gate
            .admit("10.0.0.1", Some("t=1,v1=00"), body)
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::Signature(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_applies_before_signature() {
        let gate = gate(1);
        let body = br#"{"id":"evt_1","type":"payment.succeeded","data":{"a":1}}"#;
        let header = signed(body);

        gate.admit("10.0.0.9", Some(&header), body).await.unwrap();
        let err = gate
            .admit("10.0.0.9", Some(&header), body)
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn test_malformed_envelope_rejected_after_valid_signature() {
        let gate = gate(10);
        let body = br#"{"id":"","type":"payment.succeeded","data":{"a":1}}"#;

        let err = gate
            .admit("10.0.0.1", Some(&signed(body)), body)
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::Shape(ShapeError::Id)));
    }
}
