//! Sentinel gateway — intercepts honeypot API submissions at the edge and
//! relays each one to a live processing endpoint attached over WebSocket,
//! returning the analyzer's reply to the original caller.

pub mod network;

pub use network::{AppState, GatewayConfig, GatewayModule};
