//! Endpoint attachment over WebSocket.
//!
//! A processing endpoint (the application instance that runs the message
//! analyzer) attaches with an authenticated `GET /ws` upgrade. The session
//! registers the endpoint, runs a write loop draining its bounded outbound
//! channel, and a read loop feeding `API_REPLY` frames back into the relay
//! table. Detach by close, error, or gateway shutdown deregisters the
//! endpoint; its unanswered dispatches then resolve by deadline.

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use sentinel_core::Frame;
use tracing::{debug, info, warn};

use super::intercept::authorize;
use super::AppState;
use crate::network::endpoint::{EndpointId, OutboundFrame};

/// Upgrades an attachment request after checking its credential.
///
/// Endpoints present the same `x-api-key` as intercepted callers; the
/// original design relied on same-origin for this, which a network
/// transport no longer provides.
pub async fn ws_attach_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    if !authorize(&headers, &state.config.intercept.api_keys) {
        return crate::network::respond::InterceptError::Unauthorized.into_response();
    }
    ws.on_upgrade(move |socket| endpoint_session(socket, state))
}

/// Runs one attached endpoint until it detaches or the gateway drains.
async fn endpoint_session(socket: WebSocket, state: AppState) {
    let (handle, mut outbound) = state.endpoints.register(&state.config.connection);
    let endpoint_id = handle.id;
    info!(
        endpoint = %endpoint_id,
        attached = state.endpoints.count(),
        "processing endpoint attached"
    );

    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut shutdown = state.shutdown.shutdown_receiver();

    let write_task = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            match frame {
                OutboundFrame::Relay(relay_frame) => match serde_json::to_string(&relay_frame) {
                    Ok(text) => {
                        if ws_tx.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(%err, "failed to encode relay frame"),
                },
                OutboundFrame::Close(reason) => {
                    let close = reason.map(|reason| CloseFrame {
                        code: close_code::AWAY,
                        reason: reason.into(),
                    });
                    let _ = ws_tx.send(Message::Close(close)).await;
                    break;
                }
            }
        }
    });

    loop {
        tokio::select! {
            message = ws_rx.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        handle_endpoint_frame(&state, endpoint_id, text.as_str());
                    }
                    // Pings and pongs are answered by axum itself
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(Message::Binary(_))) => {
                        warn!(endpoint = %endpoint_id, "ignoring binary frame from endpoint");
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        debug!(endpoint = %endpoint_id, %err, "endpoint socket error");
                        break;
                    }
                }
            }
            _ = shutdown.changed() => break,
        }
    }

    state.endpoints.remove(endpoint_id);
    write_task.abort();
    info!(
        endpoint = %endpoint_id,
        attached = state.endpoints.count(),
        "processing endpoint detached"
    );
}

/// Decodes one inbound text frame and resolves the matching relay entry.
///
/// Stale or unknown correlation ids are dropped by the relay table itself;
/// anything that is not an `API_REPLY` is logged and ignored.
fn handle_endpoint_frame(state: &AppState, endpoint_id: EndpointId, text: &str) {
    match serde_json::from_str::<Frame>(text) {
        Ok(Frame::ApiReply { id, payload }) => {
            state.relay.complete(&id, payload);
        }
        Ok(Frame::ApiRequest { id, .. }) => {
            warn!(endpoint = %endpoint_id, %id, "endpoint sent a request frame; dropping");
        }
        Err(err) => {
            warn!(endpoint = %endpoint_id, %err, "undecodable frame from endpoint");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use sentinel_core::CorrelationId;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn reply_frame_resolves_pending_dispatch() {
        let state = AppState::for_tests(&[]);
        let (endpoint, mut rx) = state.endpoints.register(&state.config.connection);

        let dispatch = {
            let state = state.clone();
            let endpoint = Arc::clone(&endpoint);
            tokio::spawn(async move {
                state
                    .relay
                    .dispatch(
                        &endpoint,
                        json!({"text": "hi"}),
                        Duration::from_secs(5),
                        Duration::from_secs(1),
                    )
                    .await
            })
        };

        let Some(OutboundFrame::Relay(Frame::ApiRequest { id, .. })) = rx.recv().await else {
            panic!("expected a dispatched request");
        };

        let reply = serde_json::to_string(&Frame::ApiReply {
            id,
            payload: json!({"scamDetected": true}),
        })
        .unwrap();
        handle_endpoint_frame(&state, endpoint.id, &reply);

        assert_eq!(dispatch.await.unwrap().unwrap(), json!({"scamDetected": true}));
    }

    #[tokio::test]
    async fn garbage_and_stale_frames_are_ignored() {
        let state = AppState::for_tests(&[]);
        let endpoint_id = EndpointId(1);

        handle_endpoint_frame(&state, endpoint_id, "not json at all");
        handle_endpoint_frame(&state, endpoint_id, "{\"type\":\"UNKNOWN\"}");

        // A reply for an id nothing is waiting on has no effect
        let stale = serde_json::to_string(&Frame::ApiReply {
            id: CorrelationId::new(7),
            payload: json!({}),
        })
        .unwrap();
        handle_endpoint_frame(&state, endpoint_id, &stale);
        assert_eq!(state.relay.pending_count(), 0);
    }

    #[tokio::test]
    async fn request_frame_from_endpoint_is_dropped() {
        let state = AppState::for_tests(&[]);
        let bogus = serde_json::to_string(&Frame::ApiRequest {
            id: CorrelationId::new(1),
            payload: json!({}),
        })
        .unwrap();
        handle_endpoint_frame(&state, EndpointId(1), &bogus);
        assert_eq!(state.relay.pending_count(), 0);
    }
}
