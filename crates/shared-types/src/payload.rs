//! Application payloads carried inside the ciphertext.
//!
//! These are the only fields the replay guard may trust: they are read after
//! the AEAD tag has been verified.

use crate::ids::RequestId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A request sent from the app to the vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultRequest {
    /// Correlation id echoed back in the response.
    pub id: RequestId,
    /// Operation name, e.g. `"ping"` or `"authenticate"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Operation arguments.
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Creation time (RFC 3339 on the wire).
    pub timestamp: DateTime<Utc>,
    /// Per-conversation sequence number, when the sender keeps one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,
}

impl VaultRequest {
    /// Build a request with a fresh id, stamped at `timestamp`.
    pub fn new(kind: impl Into<String>, payload: serde_json::Value, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: RequestId::new(),
            kind: kind.into(),
            payload,
            timestamp,
            sequence: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: RequestId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn with_sequence(mut self, sequence: i64) -> Self {
        self.sequence = Some(sequence);
        self
    }
}

/// A response sent from the vault to the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultResponse {
    /// Id of the request this answers.
    #[serde(alias = "request_id")]
    pub id: RequestId,
    /// Unique id of this response message, if the vault assigns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,
}

impl VaultResponse {
    /// A successful response carrying `result`.
    pub fn success(id: RequestId, result: serde_json::Value) -> Self {
        Self {
            id,
            event_id: None,
            success: true,
            result: Some(result),
            error: None,
            timestamp: None,
            sequence: None,
        }
    }

    /// An explicit failure response.
    pub fn failure(id: RequestId, error: impl Into<String>) -> Self {
        Self {
            id,
            event_id: None,
            success: false,
            result: None,
            error: Some(error.into()),
            timestamp: None,
            sequence: None,
        }
    }

    #[must_use]
    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn with_sequence(mut self, sequence: i64) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Key used for duplicate suppression: the event id when present,
    /// otherwise the correlation id.
    pub fn replay_key(&self) -> &str {
        self.event_id.as_deref().unwrap_or(self.id.as_str())
    }
}
