//! Broadcast channel for relay events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. The relay core
//! publishes a [`RelayEvent`] for every relayed message and every status
//! change, and each WebSocket session subscribes to forward events to its
//! own client.

use tokio::sync::broadcast;

use super::RelayEvent;

/// Broadcast bus for [`RelayEvent`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity.
/// When the ring buffer is full, the oldest events are dropped for lagging
/// receivers; sessions log the lag and keep going.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<RelayEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribed sessions.
    ///
    /// Returns the number of receivers that got the event. With no live
    /// sessions the event is silently dropped — broadcast is fire-and-forget.
    pub fn publish(&self, event: RelayEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new receiver for all future events.
    ///
    /// Each WebSocket session calls this once on connect.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RelayEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of live receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
