//! WebSocket layer: session handling, command dispatch, wire types.
//!
//! The endpoint at `/ws` carries the relay's command/event protocol:
//! JSON frames `{event, data}` in both directions.

pub mod connection;
pub mod handler;
pub mod messages;
