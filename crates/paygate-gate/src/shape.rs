//! Structural validation of the decoded event envelope.
//!
//! A well-formed event carries a non-empty `id`, a non-empty `type` tag,
//! and a non-empty `data` object. Unrecognized type tags pass through,
//! since providers add event types over time; broken structure is
//! rejected before anything is persisted.

use paygate_core::event::{EventKind, VerifiedEvent};
use thiserror::Error;

/// Why the decoded event was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    /// The body is not valid JSON.
    #[error("body is not valid JSON: {0}")]
    Json(String),

    /// The body decoded to something other than a JSON object.
    #[error("event envelope must be a JSON object")]
    NotAnObject,

    /// `id` is missing, not a string, or empty.
    #[error("missing or empty event id")]
    Id,

    /// `type` is missing, not a string, or empty.
    #[error("missing or empty event type")]
    Type,

    /// `data` is missing or not a non-empty object.
    #[error("missing or empty event data")]
    Data,
}

/// Decodes `raw_body` and checks the minimal envelope shape.
///
/// # Errors
///
/// Returns a [`ShapeError`] naming the first structural problem found.
pub fn validate_shape(raw_body: &[u8]) -> Result<VerifiedEvent, ShapeError> {
    let envelope: serde_json::Value =
        serde_json::from_slice(raw_body).map_err(|e| ShapeError::Json(e.to_string()))?;

    let object = envelope.as_object().ok_or(ShapeError::NotAnObject)?;

    let id = object
        .get("id")
        .and_then(serde_json::Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or(ShapeError::Id)?
        .to_owned();

    let tag = object
        .get("type")
        .and_then(serde_json::Value::as_str)
        .filter(|tag| !tag.is_empty())
        .ok_or(ShapeError::Type)?;

    let data = object
        .get("data")
        .and_then(serde_json::Value::as_object)
        .filter(|data| !data.is_empty())
        .ok_or(ShapeError::Data)?;

    Ok(VerifiedEvent {
        provider_event_id: id,
        kind: EventKind::parse(tag),
        data: serde_json::Value::Object(data.clone()),
        raw_payload: envelope.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_event_passes() {
        let body = br#"{"id":"evt_1","type":"payment.succeeded","data":{"amount":4200}}"#;

        let event = validate_shape(body).unwrap();
        assert_eq!(event.provider_event_id, "evt_1");
        assert_eq!(event.kind, EventKind::PaymentSucceeded);
        assert_eq!(event.data["amount"], 4200);
        assert_eq!(event.raw_payload["type"], "payment.succeeded");
    }

    #[test]
    fn test_unrecognized_type_passes_through() {
        let body = br#"{"id":"evt_2","type":"invoice.finalized","data":{"k":"v"}}"#;

        let event = validate_shape(body).unwrap();
        assert_eq!(
            event.kind,
            EventKind::Unrecognized("invoice.finalized".into())
        );
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(
            validate_shape(b"{not json"),
            Err(ShapeError::Json(_))
        ));
    }

    #[test]
    fn test_non_object_body_rejected() {
        assert_eq!(validate_shape(b"[1,2,3]"), Err(ShapeError::NotAnObject));
    }

    #[test]
    fn test_missing_id_rejected() {
        let body = br#"{"type":"payment.succeeded","data":{"k":"v"}}"#;
        assert_eq!(validate_shape(body), Err(ShapeError::Id));
    }

    #[test]
    fn test_empty_id_rejected() {
        let body = br#"{"id":"","type":"payment.succeeded","data":{"k":"v"}}"#;
        assert_eq!(validate_shape(body), Err(ShapeError::Id));
    }

    #[test]
    fn test_missing_type_rejected() {
        let body = br#"{"id":"evt_1","data":{"k":"v"}}"#;
        assert_eq!(validate_shape(body), Err(ShapeError::Type));
    }

    #[test]
    fn test_empty_data_rejected() {
        let body = br#"{"id":"evt_1","type":"payment.succeeded","data":{}}"#;
        assert_eq!(validate_shape(body), Err(ShapeError::Data));
    }

    #[test]
    fn test_missing_data_rejected() {
        let body = br#"{"id":"evt_1","type":"payment.succeeded"}"#;
        assert_eq!(validate_shape(body), Err(ShapeError::Data));
    }
}
