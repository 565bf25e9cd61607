//! Shared application state injected into all Axum handlers.

use crate::domain::EventBus;
use crate::service::RelayService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Relay core for all command handling.
    pub relay: RelayService,
    /// Event bus for session broadcast subscriptions.
    pub event_bus: EventBus,
}
