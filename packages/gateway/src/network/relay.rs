//! Relay table: per-request correlation between dispatched submissions and
//! endpoint replies.
//!
//! Every dispatch allocates a fresh correlation id and a private oneshot
//! channel, records the sender in a pending map, and queues an
//! `API_REQUEST` frame toward the chosen endpoint. The endpoint's read loop
//! resolves entries via [`RelayTable::complete`]. Replies are paired per
//! correlation id, never globally ordered, so concurrent dispatches to one
//! endpoint cannot cross-talk.
//!
//! Cleanup is RAII: the pending entry is removed on every exit path —
//! reply, deadline expiry, send failure, and caller cancellation — so a
//! late reply for an expired id is dropped instead of reaching a consumer
//! that no longer exists.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use metrics::counter;
use sentinel_core::{CorrelationId, Frame};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use super::endpoint::{EndpointHandle, OutboundFrame};

/// Error outcome of a single dispatch.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The endpoint accepted the frame but did not answer within the deadline.
    #[error("endpoint did not reply within {0:?}")]
    DeadlineElapsed(Duration),
    /// The endpoint detached (or its outbound queue stayed full) before the
    /// frame could be delivered.
    #[error("endpoint detached before the dispatch was delivered")]
    EndpointGone,
}

/// Pending-reply table keyed by correlation id.
#[derive(Debug, Default)]
pub struct RelayTable {
    pending: DashMap<CorrelationId, oneshot::Sender<Value>>,
    seq: AtomicU64,
}

impl RelayTable {
    /// Creates an empty relay table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `payload` to `endpoint` and awaits its reply or the deadline.
    ///
    /// The correlation id and pending entry are allocated only here, after
    /// the caller has already authenticated the request, decoded the body,
    /// and selected a reachable endpoint.
    ///
    /// # Errors
    ///
    /// [`DispatchError::EndpointGone`] if the frame could not be delivered;
    /// [`DispatchError::DeadlineElapsed`] if no reply arrived in time. In
    /// both cases the pending entry has been released.
    pub async fn dispatch(
        &self,
        endpoint: &EndpointHandle,
        payload: Value,
        deadline: Duration,
        send_timeout: Duration,
    ) -> Result<Value, DispatchError> {
        let id = CorrelationId::new(self.seq.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id.clone(), tx);

        // Removes the pending entry when dispatch exits by any path,
        // including the caller dropping this future mid-await.
        let _guard = PendingGuard { table: self, id: id.clone() };

        counter!("sentinel_relay_dispatched_total").increment(1);

        let frame = Frame::ApiRequest { id: id.clone(), payload };
        if let Err(err) = endpoint
            .send_timeout(OutboundFrame::Relay(frame), send_timeout)
            .await
        {
            debug!(%id, endpoint = %endpoint.id, ?err, "dispatch delivery failed");
            return Err(DispatchError::EndpointGone);
        }

        match tokio::time::timeout(deadline, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            // Sender dropped without a reply: the entry was evicted, which
            // only happens if the table was cleared underneath us.
            Ok(Err(_)) => Err(DispatchError::EndpointGone),
            Err(_) => {
                counter!("sentinel_relay_timeouts_total").increment(1);
                debug!(%id, endpoint = %endpoint.id, ?deadline, "dispatch deadline elapsed");
                Err(DispatchError::DeadlineElapsed(deadline))
            }
        }
    }

    /// Resolves the pending dispatch for `id` with the endpoint's payload.
    ///
    /// Returns `false` when the id is unknown — already answered, expired,
    /// or fabricated — in which case the reply has no observable effect.
    pub fn complete(&self, id: &CorrelationId, payload: Value) -> bool {
        match self.pending.remove(id) {
            Some((_, tx)) => tx.send(payload).is_ok(),
            None => {
                counter!("sentinel_relay_stale_replies_total").increment(1);
                debug!(%id, "dropping stale reply");
                false
            }
        }
    }

    /// Number of dispatches currently awaiting a reply.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// Removes a pending entry when dropped.
struct PendingGuard<'a> {
    table: &'a RelayTable,
    id: CorrelationId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.table.pending.remove(&self.id);
    }
}
