//! Dispatch registry: event kind → handler.

use std::collections::HashMap;
use std::sync::Arc;

use paygate_core::event::EventKind;

use super::handlers::{
    ChargeFailedHandler, ChargeSucceededHandler, EventHandler, HandlerDeps, PaymentFailedHandler,
    PaymentSucceededHandler, UnrecognizedEventHandler,
};

/// Maps each known event kind to its handler, with a mandatory default
/// for everything else. Dispatch is a lookup, not a conditional ladder,
/// so adding a type means registering a handler and nothing more.
pub struct HandlerRegistry {
    handlers: HashMap<EventKind, Arc<dyn EventHandler>>,
    unrecognized: Arc<dyn EventHandler>,
}

impl HandlerRegistry {
    /// Creates an empty registry around the default no-op handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            unrecognized: Arc::new(UnrecognizedEventHandler),
        }
    }

    /// Wires the built-in payment lifecycle handlers around shared
    /// collaborators.
    #[must_use]
    pub fn with_builtin_handlers(deps: Arc<HandlerDeps>) -> Self {
        let mut registry = Self::new();
        registry.register(
            EventKind::PaymentSucceeded,
            Arc::new(PaymentSucceededHandler(deps.clone())),
        );
        registry.register(
            EventKind::PaymentFailed,
            Arc::new(PaymentFailedHandler(deps.clone())),
        );
        registry.register(
            EventKind::ChargeSucceeded,
            Arc::new(ChargeSucceededHandler(deps.clone())),
        );
        registry.register(EventKind::ChargeFailed, Arc::new(ChargeFailedHandler(deps)));
        registry
    }

    /// Registers (or replaces) the handler for `kind`.
    pub fn register(&mut self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        self.handlers.insert(kind, handler);
    }

    /// Resolves the handler for `kind`, falling back to the default
    /// no-op.
    #[must_use]
    pub fn resolve(&self, kind: &EventKind) -> &Arc<dyn EventHandler> {
        self.handlers.get(kind).unwrap_or(&self.unrecognized)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
