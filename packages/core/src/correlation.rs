//! Correlation ids pairing a dispatched envelope with its eventual reply.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique token pairing a dispatched envelope with exactly one reply.
///
/// Rendered as `{seq:08x}-{uuid}` on the wire: the sequence half is
/// process-monotonic (no reuse within the outstanding window), the UUIDv4
/// half makes ids unguessable across processes. Stored as the formatted
/// string so it hashes and compares cheaply in the pending map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Builds an id from a monotonic sequence number and a fresh random token.
    #[must_use]
    pub fn new(seq: u64) -> Self {
        Self(format!("{seq:08x}-{}", Uuid::new_v4().simple()))
    }

    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error parsing a correlation id from its wire form.
#[derive(Debug, thiserror::Error)]
#[error("malformed correlation id: {0:?}")]
pub struct ParseCorrelationIdError(String);

impl FromStr for CorrelationId {
    type Err = ParseCorrelationIdError;

    /// Accepts the `{seq:08x}-{uuid}` shape produced by [`CorrelationId::new`].
    ///
    /// Replies echo ids verbatim, so parsing only guards against garbage
    /// frames from a misbehaving endpoint.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((seq, token)) = s.split_once('-') else {
            return Err(ParseCorrelationIdError(s.to_string()));
        };
        if seq.is_empty()
            || !seq.chars().all(|c| c.is_ascii_hexdigit())
            || Uuid::try_parse(token).is_err()
        {
            return Err(ParseCorrelationIdError(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}
