//! Response synthesis: every interception outcome becomes exactly one
//! structured JSON wire response.
//!
//! Callers never see a raw transport failure for auth, decode, or routing
//! errors — each failure maps to a fixed status and a
//! `{"status":"error","message":...}` body. Successful relays forward the
//! endpoint payload verbatim.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

/// Failure outcomes of the interception pipeline.
///
/// `EndpointGone`-style internal endpoint failures do not appear here: an
/// endpoint that answers with an error-shaped payload is still a successful
/// relay and is passed through as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InterceptError {
    /// Missing or mismatched `x-api-key` header.
    #[error("Unauthorized: Missing or invalid x-api-key header")]
    Unauthorized,
    /// Request body was not valid JSON.
    #[error("Invalid JSON payload")]
    BadPayload,
    /// No live processing endpoint is attached.
    #[error("Sentinel dashboard offline: keep a live processing instance attached")]
    Offline,
    /// An endpoint was attached but did not answer within the deadline.
    #[error("Processing instance did not respond in time")]
    TimedOut,
}

impl InterceptError {
    /// The wire status for this failure. 503 (offline) and 504 (timeout)
    /// stay distinct so callers can tell "nothing attached" from "attached
    /// but unresponsive".
    #[must_use]
    pub fn status(self) -> StatusCode {
        match self {
            InterceptError::Unauthorized => StatusCode::UNAUTHORIZED,
            InterceptError::BadPayload => StatusCode::BAD_REQUEST,
            InterceptError::Offline => StatusCode::SERVICE_UNAVAILABLE,
            InterceptError::TimedOut => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for InterceptError {
    fn into_response(self) -> Response {
        let body = json!({
            "status": "error",
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

/// Wraps a relayed endpoint payload as the success response.
///
/// The payload is forwarded without transformation so round-trip fidelity
/// holds: whatever the endpoint produced is exactly what the caller reads.
#[must_use]
pub fn relayed(payload: Value) -> Response {
    (StatusCode::OK, Json(payload)).into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unauthorized_is_401_with_fixed_message() {
        let response = InterceptError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(
            body["message"],
            "Unauthorized: Missing or invalid x-api-key header"
        );
    }

    #[tokio::test]
    async fn bad_payload_is_400() {
        let response = InterceptError::BadPayload.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "Invalid JSON payload");
    }

    #[tokio::test]
    async fn offline_is_503_and_mentions_offline() {
        let response = InterceptError::Offline.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let message = body_json(response).await["message"]
            .as_str()
            .unwrap()
            .to_lowercase();
        assert!(message.contains("offline"));
    }

    #[tokio::test]
    async fn timeout_is_504_distinct_from_offline() {
        let response = InterceptError::TimedOut.into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            body_json(response).await["message"],
            "Processing instance did not respond in time"
        );
    }

    #[tokio::test]
    async fn relayed_payload_passes_through_unchanged() {
        let payload = json!({
            "status": "success",
            "scamDetected": true,
            "nextResponse": "Oh dear, which bank?",
            "nested": {"deep": [1, 2, 3]}
        });
        let response = relayed(payload.clone());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, payload);
    }
}
