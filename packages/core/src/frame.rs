//! Relay frames exchanged between the gateway and attached processing
//! endpoints over the WebSocket transport.
//!
//! Frames are JSON text with an explicit `type` tag. The tag values match
//! the original dashboard `postMessage` contract exactly, so an existing
//! endpoint implementation can attach unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::correlation::CorrelationId;

/// A single relay frame.
///
/// The gateway sends `API_REQUEST`; the endpoint answers with an
/// `API_REPLY` echoing the same correlation id. The payload is opaque JSON
/// in both directions — the gateway never inspects or rewrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Frame {
    /// Gateway → endpoint: one intercepted submission to process.
    #[serde(rename = "API_REQUEST")]
    ApiRequest {
        /// Correlation id the reply must echo.
        id: CorrelationId,
        /// The decoded submission body, forwarded verbatim.
        payload: Value,
    },

    /// Endpoint → gateway: the analyzer's answer to one request.
    #[serde(rename = "API_REPLY")]
    ApiReply {
        /// Correlation id of the request being answered.
        id: CorrelationId,
        /// The analyzer output, relayed to the caller unchanged.
        payload: Value,
    },
}

impl Frame {
    /// Returns the correlation id carried by this frame.
    #[must_use]
    pub fn id(&self) -> &CorrelationId {
        match self {
            Frame::ApiRequest { id, .. } | Frame::ApiReply { id, .. } => id,
        }
    }
}
