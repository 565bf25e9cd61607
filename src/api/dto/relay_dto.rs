//! DTOs for the relay status and history endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::MessageRecord;
use crate::domain::history::{HISTORY_CAPACITY, SESSION_REPLAY_LEN};
use crate::service::StatusSnapshot;

/// Relay status as returned by `GET /api/v1/status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// Result of a fresh liveness probe.
    pub connected: bool,
    /// Channels currently subscribed to.
    pub channels: Vec<String>,
    /// Whether the background listener is running.
    pub listening: bool,
}

impl From<StatusSnapshot> for StatusResponse {
    fn from(snapshot: StatusSnapshot) -> Self {
        Self {
            connected: snapshot.connected,
            channels: snapshot.channels,
            listening: snapshot.listening,
        }
    }
}

/// Query parameters for `GET /api/v1/history`.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryParams {
    /// Number of trailing records to return. Defaults to 50.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    SESSION_REPLAY_LEN
}

impl HistoryParams {
    /// Clamps `limit` to the history buffer capacity.
    #[must_use]
    pub fn clamped(&self) -> usize {
        self.limit.clamp(1, HISTORY_CAPACITY)
    }
}

/// History page as returned by `GET /api/v1/history`.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    /// Number of records returned.
    pub count: usize,
    /// Trailing records in original relative order.
    pub messages: Vec<MessageRecord>,
}
