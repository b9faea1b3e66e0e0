//! Shared application state.

use std::sync::Arc;

use paygate_gate::SecurityGate;
use paygate_pipeline::application::orchestrator::Orchestrator;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The security gate every delivery passes first.
    pub gate: Arc<SecurityGate>,
    /// The orchestrator behind the gate.
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(gate: Arc<SecurityGate>, orchestrator: Arc<Orchestrator>) -> Self {
        Self { gate, orchestrator }
    }
}
