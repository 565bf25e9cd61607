//! # pubsub-relay
//!
//! WebSocket relay bridging Redis pub/sub channels to live web clients.
//!
//! Browsers issue connect/subscribe/publish commands over a WebSocket; the
//! relay forwards them to a single shared bus connection, fans inbound bus
//! messages out to every connected session in real time, and keeps a short
//! rolling history that new sessions replay on connect.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── WS sessions (ws/)
//!     ├── REST handlers (api/)
//!     │
//!     ├── RelayService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     └── Bus collaborator (bus/) — Redis
//! ```

pub mod api;
pub mod app_state;
pub mod bus;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;
