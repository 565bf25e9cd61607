//! Events broadcast to every connected web session.

use super::MessageRecord;

/// Unsolicited event pushed through the [`super::EventBus`] to all live
/// sessions, independent of which session (if any) triggered it.
#[derive(Debug, Clone)]
pub enum RelayEvent {
    /// A message was relayed — published through the relay or received
    /// from the bus (including the synthetic `_error` channel).
    Message(MessageRecord),

    /// The bus connection or subscription set changed.
    StatusChanged {
        /// Result of a fresh liveness probe at emission time.
        connected: bool,
        /// Channels currently subscribed to.
        channels: Vec<String>,
    },
}
