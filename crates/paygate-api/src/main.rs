//! Paygate webhook API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use paygate_api::adapters::{TracingLedger, TracingNotifier};
use paygate_api::config::Config;
use paygate_api::error::AppError;
use paygate_api::routes;
use paygate_api::state::AppState;
use paygate_core::clock::{Clock, SystemClock};
use paygate_core::notify::Notifier;
use paygate_core::store::EventStore;
use paygate_event_store::pg_event_store::PgEventStore;
use paygate_gate::SecurityGate;
use paygate_gate::rate_limit::{FixedWindowLimiter, InMemoryRateCounter};
use paygate_pipeline::application::orchestrator::Orchestrator;
use paygate_pipeline::domain::handlers::HandlerDeps;
use paygate_pipeline::domain::notification::NotifierChain;
use paygate_pipeline::domain::registry::HandlerRegistry;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Paygate webhook API server");

    let config = Config::from_env()?;

    // Create database connection pool and bring the schema up to date.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: Arc<dyn EventStore> = Arc::new(PgEventStore::new(pool));

    // Security gate.
    let counter = Arc::new(InMemoryRateCounter::new(clock.clone()));
    let limiter = FixedWindowLimiter::new(counter, config.rate_limit_max, config.rate_limit_window);
    let gate = Arc::new(SecurityGate::new(
        config.webhook_secret.clone(),
        config.signature_tolerance,
        limiter,
        clock.clone(),
    ));

    // Event processor: primary and legacy notification paths in fallback
    // order, business effects behind the ledger boundary.
    let notifiers: Vec<Arc<dyn Notifier>> = vec![
        Arc::new(TracingNotifier::new("email-primary")),
        Arc::new(TracingNotifier::new("email-legacy")),
    ];
    let deps = Arc::new(HandlerDeps {
        ledger: Arc::new(TracingLedger),
        notifiers: Arc::new(NotifierChain::new(
            notifiers,
            config.notify_fallback_policy,
            config.notify_timeout,
        )),
        ledger_timeout: config.ledger_timeout,
    });
    let registry = HandlerRegistry::with_builtin_handlers(deps);
    let orchestrator = Arc::new(Orchestrator::new(store.clone(), registry, clock.clone()));

    spawn_stale_processing_monitor(store, clock, config.stale_processing_after);

    // Build router.
    let app_state = AppState::new(gate, orchestrator);
    let app = Router::new()
        .merge(routes::health::router())
        .merge(routes::webhooks::router())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically reports rows stuck in `processing`. Requeueing them is
/// the sweep process's job; this keeps the backlog visible in logs
/// until it runs.
fn spawn_stale_processing_monitor(
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    staleness: Duration,
) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(staleness.max(Duration::from_secs(60)));
        interval.tick().await;
        loop {
            interval.tick().await;
            let cutoff = clock.now() - chrono::Duration::from_std(staleness).unwrap_or_default();
            match store.find_stale_processing(cutoff).await {
                Ok(stale) if stale.is_empty() => {}
                Ok(stale) => tracing::warn!(
                    count = stale.len(),
                    "events stuck in processing; awaiting sweep"
                ),
                Err(err) => tracing::warn!(error = %err, "stale processing check failed"),
            }
        }
    });
}
