//! Message records: the unit stored in history and broadcast to sessions.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Synthetic channel used to surface listener transport failures to
/// sessions through the normal message path.
pub const ERROR_CHANNEL: &str = "_error";

/// Whether a record was published through the relay or received from the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Published by a web session through the relay.
    Sent,
    /// Received from the bus by the listener.
    Received,
}

/// A single relayed message. Immutable once created.
///
/// Serializes to the wire shape `{timestamp, channel, data, type}` with an
/// ISO-8601 timestamp taken at generation time.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRecord {
    /// Generation time (UTC).
    pub timestamp: DateTime<Utc>,
    /// Bus channel the message was sent to or received on.
    pub channel: String,
    /// Structured payload, or a raw string when the payload was not JSON.
    pub data: serde_json::Value,
    /// Message direction, serialized as `type`.
    #[serde(rename = "type")]
    pub direction: Direction,
}

impl MessageRecord {
    /// Creates a record for a message published through the relay.
    #[must_use]
    pub fn sent(channel: &str, data: serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            channel: channel.to_string(),
            data,
            direction: Direction::Sent,
        }
    }

    /// Creates a record for a message received from the bus.
    #[must_use]
    pub fn received(channel: &str, data: serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            channel: channel.to_string(),
            data,
            direction: Direction::Received,
        }
    }
}
