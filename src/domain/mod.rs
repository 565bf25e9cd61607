//! Domain layer: message records, bounded history, and the event system.
//!
//! This module contains the relay's in-memory model: the records that flow
//! through the relay, the rolling history buffer, and the broadcast bus
//! that fans events out to WebSocket sessions.

pub mod event_bus;
pub mod history;
pub mod message_record;
pub mod relay_event;

pub use event_bus::EventBus;
pub use history::HistoryBuffer;
pub use message_record::{Direction, ERROR_CHANNEL, MessageRecord};
pub use relay_event::RelayEvent;
