//! Processing endpoint registry.
//!
//! Tracks the application instances currently attached over WebSocket and
//! able to answer relayed submissions. Endpoints get a bounded outbound
//! frame channel for backpressure; the registry is a `DashMap` so selection
//! can run concurrently from many in-flight intercepts without locking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use sentinel_core::Frame;
use tokio::sync::mpsc;

use super::config::ConnectionConfig;

/// Unique identifier for an attached endpoint, assigned by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointId(pub u64);

impl std::fmt::Display for EndpointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message queued toward an endpoint's write loop.
#[derive(Debug)]
pub enum OutboundFrame {
    /// A relay frame to serialize and send as a text message.
    Relay(Frame),
    /// A close frame with an optional reason.
    Close(Option<String>),
}

/// Error returned when delivering a frame to an endpoint fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The outbound channel remained full for the whole send timeout.
    Timeout,
    /// The endpoint has detached; the receiver was dropped.
    Detached,
}

/// Handle to a single attached endpoint.
///
/// The receiver end of `tx` is held by the endpoint's WebSocket write loop;
/// when that loop exits the channel closes and the endpoint stops being
/// reachable.
#[derive(Debug)]
pub struct EndpointHandle {
    /// Registry-assigned identifier.
    pub id: EndpointId,
    /// Sender end of the bounded outbound frame channel.
    pub tx: mpsc::Sender<OutboundFrame>,
    /// When this endpoint attached.
    pub attached_at: Instant,
}

impl EndpointHandle {
    /// Attempts to queue a frame without blocking.
    ///
    /// Returns `true` if enqueued, `false` if the channel is full or the
    /// endpoint has detached.
    #[must_use]
    pub fn try_send(&self, frame: OutboundFrame) -> bool {
        self.tx.try_send(frame).is_ok()
    }

    /// Queues a frame, waiting up to `timeout` for channel capacity.
    ///
    /// # Errors
    ///
    /// `SendError::Timeout` if the channel stayed full; `SendError::Detached`
    /// if the endpoint's write loop has exited.
    pub async fn send_timeout(
        &self,
        frame: OutboundFrame,
        timeout: Duration,
    ) -> Result<(), SendError> {
        match tokio::time::timeout(timeout, self.tx.send(frame)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(SendError::Detached),
            Err(_) => Err(SendError::Timeout),
        }
    }

    /// Whether the endpoint can still receive frames.
    #[must_use]
    pub fn is_reachable(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Thread-safe registry of attached processing endpoints.
#[derive(Debug)]
pub struct EndpointRegistry {
    endpoints: DashMap<EndpointId, Arc<EndpointHandle>>,
    next_id: AtomicU64,
}

impl EndpointRegistry {
    /// Creates an empty registry. Endpoint ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoints: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a newly attached endpoint, returning its handle and the
    /// receiver to hand to the WebSocket write loop.
    pub fn register(
        &self,
        config: &ConnectionConfig,
    ) -> (Arc<EndpointHandle>, mpsc::Receiver<OutboundFrame>) {
        let id = EndpointId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(config.outbound_channel_capacity);

        let handle = Arc::new(EndpointHandle {
            id,
            tx,
            attached_at: Instant::now(),
        });

        self.endpoints.insert(id, Arc::clone(&handle));
        (handle, rx)
    }

    /// Removes an endpoint from the registry, returning its handle if found.
    pub fn remove(&self, id: EndpointId) -> Option<Arc<EndpointHandle>> {
        self.endpoints.remove(&id).map(|(_, handle)| handle)
    }

    /// Picks a reachable endpoint, or `None` if nothing live is attached.
    ///
    /// First-found selection over a read-only snapshot: no side effects, so
    /// concurrent in-flight intercepts can call this freely. Handles whose
    /// write loop has already exited are skipped even if deregistration has
    /// not caught up yet.
    #[must_use]
    pub fn select_reachable(&self) -> Option<Arc<EndpointHandle>> {
        self.endpoints
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .find(|handle| handle.is_reachable())
    }

    /// Returns the number of registered endpoints.
    #[must_use]
    pub fn count(&self) -> usize {
        self.endpoints.len()
    }

    /// Removes and returns all endpoints. Used during graceful shutdown.
    pub fn drain_all(&self) -> Vec<Arc<EndpointHandle>> {
        let keys: Vec<EndpointId> = self.endpoints.iter().map(|entry| *entry.key()).collect();

        let mut handles = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some((_, handle)) = self.endpoints.remove(&key) {
                handles.push(handle);
            }
        }
        handles
    }
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use sentinel_core::CorrelationId;
    use serde_json::json;

    use super::*;

    fn test_config() -> ConnectionConfig {
        ConnectionConfig::default()
    }

    fn relay_frame() -> OutboundFrame {
        OutboundFrame::Relay(Frame::ApiRequest {
            id: CorrelationId::new(1),
            payload: json!({}),
        })
    }

    #[test]
    fn register_assigns_increasing_ids() {
        let registry = EndpointRegistry::new();
        let config = test_config();

        let (h1, _rx1) = registry.register(&config);
        let (h2, _rx2) = registry.register(&config);

        assert_eq!(h1.id, EndpointId(1));
        assert_eq!(h2.id, EndpointId(2));
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn select_reachable_none_when_empty() {
        let registry = EndpointRegistry::new();
        assert!(registry.select_reachable().is_none());
    }

    #[test]
    fn select_reachable_returns_live_endpoint() {
        let registry = EndpointRegistry::new();
        let (handle, _rx) = registry.register(&test_config());

        let selected = registry.select_reachable().unwrap();
        assert_eq!(selected.id, handle.id);
    }

    #[test]
    fn select_reachable_skips_detached_endpoints() {
        let registry = EndpointRegistry::new();
        let (_dead, dead_rx) = registry.register(&test_config());
        let (live, _live_rx) = registry.register(&test_config());

        // Simulate a write loop that exited before deregistration
        drop(dead_rx);

        let selected = registry.select_reachable().unwrap();
        assert_eq!(selected.id, live.id);
    }

    #[test]
    fn select_reachable_none_when_all_detached() {
        let registry = EndpointRegistry::new();
        let (_h, rx) = registry.register(&test_config());
        drop(rx);

        assert!(registry.select_reachable().is_none());
        // Still registered until the session task removes it
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let registry = EndpointRegistry::new();
        let (handle, _rx) = registry.register(&test_config());

        assert!(registry.remove(handle.id).is_some());
        assert!(registry.remove(handle.id).is_none());
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn drain_all_empties_registry() {
        let registry = EndpointRegistry::new();
        let config = test_config();
        let (_h1, _rx1) = registry.register(&config);
        let (_h2, _rx2) = registry.register(&config);

        let drained = registry.drain_all();
        assert_eq!(drained.len(), 2);
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn try_send_reports_detached() {
        let registry = EndpointRegistry::new();
        let (handle, rx) = registry.register(&test_config());

        assert!(handle.try_send(relay_frame()));
        drop(rx);
        assert!(!handle.try_send(relay_frame()));
        assert!(!handle.is_reachable());
    }

    #[tokio::test]
    async fn send_timeout_detached() {
        let registry = EndpointRegistry::new();
        let (handle, rx) = registry.register(&test_config());
        drop(rx);

        let result = handle
            .send_timeout(relay_frame(), Duration::from_millis(100))
            .await;
        assert_eq!(result, Err(SendError::Detached));
    }

    #[tokio::test]
    async fn send_timeout_full_channel() {
        let config = ConnectionConfig {
            outbound_channel_capacity: 1,
            ..ConnectionConfig::default()
        };
        let registry = EndpointRegistry::new();
        let (handle, _rx) = registry.register(&config);

        assert!(handle.try_send(relay_frame()));
        let result = handle
            .send_timeout(relay_frame(), Duration::from_millis(20))
            .await;
        assert_eq!(result, Err(SendError::Timeout));
    }
}
