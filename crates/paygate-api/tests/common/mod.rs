//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use paygate_api::routes;
use paygate_api::routes::webhooks::SIGNATURE_HEADER;
use paygate_api::state::AppState;
use paygate_core::clock::Clock;
use paygate_core::notify::Notifier;
use paygate_gate::rate_limit::{FixedWindowLimiter, InMemoryRateCounter};
use paygate_gate::{SecurityGate, signature};
use paygate_pipeline::application::orchestrator::Orchestrator;
use paygate_pipeline::domain::handlers::HandlerDeps;
use paygate_pipeline::domain::notification::{FallbackPolicy, NotifierChain};
use paygate_pipeline::domain::registry::HandlerRegistry;
use paygate_test_support::{FixedClock, InMemoryEventStore, RecordingLedger, RecordingNotifier};

/// Shared secret used across all integration tests.
pub const SECRET: &str = "whsec_api_test";

/// Fixed timestamp used across all integration tests.
pub fn fixed_now() -> DateTime<Utc> {
    chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 1, 15, 10, 0, 0).unwrap()
}

/// The app under test plus handles on its observable collaborators.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryEventStore>,
    pub ledger: Arc<RecordingLedger>,
    pub primary: Arc<RecordingNotifier>,
}

/// Build the full app router with the real gate and orchestrator, an
/// in-memory event store, and recording collaborators. Uses the same
/// route structure as `main.rs`.
pub fn build_test_app(rate_limit_max: u64) -> TestApp {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(fixed_now()));
    let store = Arc::new(InMemoryEventStore::new());
    let ledger = Arc::new(RecordingLedger::new());
    let primary = Arc::new(RecordingNotifier::new("primary"));

    let counter = Arc::new(InMemoryRateCounter::new(clock.clone()));
    let limiter = FixedWindowLimiter::new(counter, rate_limit_max, Duration::from_secs(60));
    let gate = Arc::new(SecurityGate::new(
        SECRET.to_owned(),
        Duration::from_secs(300),
        limiter,
        clock.clone(),
    ));

    let notifiers: Vec<Arc<dyn Notifier>> = vec![primary.clone()];
    let deps = Arc::new(HandlerDeps {
        ledger: ledger.clone(),
        notifiers: Arc::new(NotifierChain::new(
            notifiers,
            FallbackPolicy::AnyError,
            Duration::from_secs(5),
        )),
        ledger_timeout: Duration::from_secs(5),
    });
    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        HandlerRegistry::with_builtin_handlers(deps),
        clock,
    ));

    let router = Router::new()
        .merge(routes::health::router())
        .merge(routes::webhooks::router())
        .with_state(AppState::new(gate, orchestrator));

    TestApp {
        router,
        store,
        ledger,
        primary,
    }
}

/// Signature header the provider would send for `body` right now.
pub fn signed_header(body: &[u8]) -> String {
    signature::signature_header(SECRET, fixed_now().timestamp(), body)
}

/// Deliver a webhook body and return the response.
pub async fn deliver(
    app: Router,
    body: &[u8],
    signature_header: Option<&str>,
    source: &str,
) -> (StatusCode, serde_json::Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri("/webhooks/payments")
        .header("content-type", "application/json")
        .header("x-forwarded-for", source);
    if let Some(header) = signature_header {
        request = request.header(SIGNATURE_HEADER, header);
    }
    let request = request.body(Body::from(body.to_vec())).unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
