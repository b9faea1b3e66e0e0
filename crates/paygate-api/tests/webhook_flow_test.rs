//! End-to-end integration tests for the webhook ingestion endpoint:
//! security gate, idempotent orchestration, and business effects driven
//! through the real router.

mod common;

use axum::http::StatusCode;
use paygate_core::event::EventStatus;

fn payment_succeeded(id: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "id": id,
        "type": "payment.succeeded",
        "data": {"customer_email": "c@example.com", "amount": 4200}
    }))
    .unwrap()
}

#[tokio::test]
async fn test_valid_delivery_is_processed() {
    let app = common::build_test_app(100);
    let body = payment_succeeded("evt_1");
    let header = common::signed_header(&body);

    let (status, json) =
        common::deliver(app.router.clone(), &body, Some(&header), "203.0.113.7").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "processed");
    assert_eq!(json["event_id"], "evt_1");

    let row = app.store.get("evt_1").unwrap();
    assert_eq!(row.status, EventStatus::Processed);
    assert_eq!(row.attempts, 1);
    assert_eq!(app.ledger.applied_count(), 1);
    assert_eq!(app.primary.sent_count(), 1);
}

#[tokio::test]
async fn test_double_delivery_applies_effects_once() {
    let app = common::build_test_app(100);
    let body = payment_succeeded("evt_1");
    let header = common::signed_header(&body);

    let (first_status, first) =
        common::deliver(app.router.clone(), &body, Some(&header), "203.0.113.7").await;
    let (second_status, second) =
        common::deliver(app.router.clone(), &body, Some(&header), "203.0.113.7").await;

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(first["status"], "processed");
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(second["status"], "duplicate_ignored");

    // Exactly one state update and one notification.
    assert_eq!(app.ledger.applied_count(), 1);
    assert_eq!(app.primary.sent_count(), 1);
    assert_eq!(app.store.get("evt_1").unwrap().attempts, 1);
}

#[tokio::test]
async fn test_tampered_body_rejected_and_never_persisted() {
    let app = common::build_test_app(100);
    let body = payment_succeeded("evt_1");
    let header = common::signed_header(&body);
    let tampered = payment_succeeded("evt_1_tampered");

    let (status, json) =
        common::deliver(app.router.clone(), &tampered, Some(&header), "203.0.113.7").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "invalid_signature");
    assert!(app.store.is_empty());
    assert_eq!(app.ledger.applied_count(), 0);
}

#[tokio::test]
async fn test_missing_signature_rejected() {
    let app = common::build_test_app(100);
    let body = payment_succeeded("evt_1");

    let (status, json) = common::deliver(app.router.clone(), &body, None, "203.0.113.7").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "invalid_signature");
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn test_malformed_envelope_rejected_despite_valid_signature() {
    let app = common::build_test_app(100);
    let body = br#"{"id":"evt_1","type":"payment.succeeded"}"#;
    let header = common::signed_header(body);

    let (status, json) =
        common::deliver(app.router.clone(), body, Some(&header), "203.0.113.7").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "malformed_event");
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn test_rate_limit_rejects_excess_with_retry_after() {
    let app = common::build_test_app(2);

    for n in 1..=2 {
        let body = payment_succeeded(&format!("evt_{n}"));
        let header = common::signed_header(&body);
        let (status, _) =
            common::deliver(app.router.clone(), &body, Some(&header), "203.0.113.7").await;
        assert_eq!(status, StatusCode::OK);
    }

    let body = payment_succeeded("evt_3");
    let header = common::signed_header(&body);
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/webhooks/payments")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.7")
        .header(paygate_api::routes::webhooks::SIGNATURE_HEADER, header.as_str())
        .body(axum::body::Body::from(body))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
    // Only the two admitted events were persisted.
    assert_eq!(app.store.len(), 2);
}

#[tokio::test]
async fn test_other_sources_unaffected_by_limited_source() {
    let app = common::build_test_app(1);
    let first = payment_succeeded("evt_1");
    let second = payment_succeeded("evt_2");

    let (status, _) = common::deliver(
        app.router.clone(),
        &first,
        Some(&common::signed_header(&first)),
        "203.0.113.7",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (limited, _) = common::deliver(
        app.router.clone(),
        &second,
        Some(&common::signed_header(&second)),
        "203.0.113.7",
    )
    .await;
    assert_eq!(limited, StatusCode::TOO_MANY_REQUESTS);

    let (status, _) = common::deliver(
        app.router.clone(),
        &second,
        Some(&common::signed_header(&second)),
        "198.51.100.4",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unrecognized_event_type_accepted_as_noop() {
    let app = common::build_test_app(100);
    let body = serde_json::to_vec(&serde_json::json!({
        "id": "evt_new",
        "type": "subscription.renewed",
        "data": {"plan": "pro"}
    }))
    .unwrap();
    let header = common::signed_header(&body);

    let (status, json) =
        common::deliver(app.router.clone(), &body, Some(&header), "203.0.113.7").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "processed");
    assert_eq!(app.store.get("evt_new").unwrap().status, EventStatus::Processed);
    // No business effects for an unhandled type.
    assert_eq!(app.ledger.applied_count(), 0);
    assert_eq!(app.primary.sent_count(), 0);
}
