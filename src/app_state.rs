//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::bridge::BridgeStats;
use crate::domain::EventBus;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event bus the bridge publishes to.
    pub event_bus: EventBus,
    /// Greeting broadcast whenever a web client connects.
    pub greeting: Arc<str>,
    /// Whether payload text is included in log lines.
    pub log_payloads: bool,
    /// Native bridge counters, reported by the health endpoint.
    pub bridge_stats: Arc<BridgeStats>,
}
