//! Inbound submission schema for intercepted honeypot traffic.
//!
//! The gateway itself relays submissions as opaque JSON; these types exist
//! for processing-endpoint integrators and for tests that need the exact
//! field names of the original API bridge (`services/api.ts`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One message in a honeypot conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    /// Who produced the message (e.g. `"scammer"`, `"agent"`).
    pub sender: String,
    /// Message text.
    pub text: String,
    /// ISO-8601 timestamp as produced by the caller.
    pub timestamp: String,
}

/// A full submission as POSTed to the gateway.
///
/// Callers either send a structured `message` or a bare `text` field; both
/// shapes occur in the wild, so both are optional and [`InboundSubmission::text`]
/// resolves the fallback order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundSubmission {
    /// Caller-assigned session identifier.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub session_id: Option<String>,

    /// The new inbound message, structured form.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<InboundMessage>,

    /// Bare-text fallback for the new inbound message.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,

    /// Ordered conversation so far, oldest first.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub conversation_history: Vec<InboundMessage>,

    /// Free-form caller metadata (channel, language, locale, ...).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub metadata: Option<Value>,
}

impl InboundSubmission {
    /// Resolves the new message text: `message.text` wins over the bare
    /// `text` field.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_ref()
            .map(|m| m.text.as_str())
            .or(self.text.as_deref())
    }
}
