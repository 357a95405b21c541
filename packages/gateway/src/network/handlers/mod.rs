//! HTTP and WebSocket handlers for the gateway.
//!
//! Defines `AppState` (shared state carried through axum extractors) and
//! re-exports the handler functions used when assembling the router.

pub mod health;
pub mod intercept;
pub mod websocket;

pub use health::{health_handler, liveness_handler, readiness_handler};
pub use intercept::{intercept_fallback, intercept_handler};
pub use websocket::ws_attach_handler;

use std::sync::Arc;
use std::time::Instant;

use super::config::GatewayConfig;
use super::endpoint::EndpointRegistry;
use super::relay::RelayTable;
use super::shutdown::ShutdownController;

/// Shared application state passed to all handlers via `State` extraction.
#[derive(Clone)]
pub struct AppState {
    /// Registry of attached processing endpoints.
    pub endpoints: Arc<EndpointRegistry>,
    /// Pending-reply table pairing dispatches with endpoint replies.
    pub relay: Arc<RelayTable>,
    /// Graceful shutdown controller with in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Gateway configuration (credentials, deadlines, connection settings).
    pub config: Arc<GatewayConfig>,
    /// Process start time, for uptime reporting.
    pub start_time: Instant,
}

#[cfg(test)]
impl AppState {
    /// State with default configuration plus the given API keys, for
    /// handler-level tests.
    pub(crate) fn for_tests(api_keys: &[&str]) -> Self {
        let mut config = GatewayConfig::default();
        config.intercept.api_keys = api_keys.iter().map(ToString::to_string).collect();
        Self {
            endpoints: Arc::new(EndpointRegistry::new()),
            relay: Arc::new(RelayTable::new()),
            shutdown: Arc::new(ShutdownController::new()),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }
}
