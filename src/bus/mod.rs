//! Bus collaborator capability surface.
//!
//! The relay treats the external publish/subscribe broker as a black box
//! reachable through [`BusConnector`] and [`BusConnection`]. The production
//! implementation lives in [`redis`](crate::bus::redis); tests substitute an
//! in-memory bus behind the same traits.

pub mod redis;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

/// Parameters for establishing a bus connection.
#[derive(Debug, Clone)]
pub struct BusParams {
    /// Broker hostname or address.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Optional credential; `None` for unauthenticated brokers.
    pub credential: Option<String>,
    /// Logical database index.
    pub db: i64,
}

/// A single inbound message delivered by the bus.
#[derive(Debug, Clone)]
pub struct BusMessage {
    /// Channel the message arrived on.
    pub channel: String,
    /// Raw payload as delivered by the broker.
    pub payload: String,
}

/// Failure surfaced by the bus collaborator.
///
/// Variants carry the broker-provided reason verbatim; the relay layer
/// wraps them into its user-visible message strings.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BusError {
    /// The broker could not be reached.
    #[error("{0}")]
    Connection(String),

    /// The broker rejected the credentials.
    #[error("{0}")]
    Auth(String),

    /// A failure on an established connection, including mid-listen.
    #[error("{0}")]
    Transport(String),
}

/// Factory for establishing bus connections.
#[async_trait]
pub trait BusConnector: fmt::Debug + Send + Sync {
    /// Establishes a connection and verifies liveness with a round trip.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Connection`] when the broker is unreachable or
    /// the handshake times out, and [`BusError::Auth`] when credentials are
    /// rejected.
    async fn connect(&self, params: &BusParams) -> Result<Arc<dyn BusConnection>, BusError>;
}

/// A live connection to the bus.
///
/// At most one instance is held by the relay at a time; a new connect
/// supersedes it and a disconnect destroys it.
#[async_trait]
pub trait BusConnection: fmt::Debug + Send + Sync {
    /// Performs a fresh liveness round trip. Never cached.
    async fn probe(&self) -> bool;

    /// Publishes a payload to a channel.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Transport`] when the round trip fails or times
    /// out.
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BusError>;

    /// Registers a channel subscription with the broker.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Transport`] when registration fails.
    async fn subscribe(&self, channel: &str) -> Result<(), BusError>;

    /// Deregisters a channel subscription.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Transport`] when deregistration fails.
    async fn unsubscribe(&self, channel: &str) -> Result<(), BusError>;

    /// Waits for the next inbound message on any subscribed channel.
    ///
    /// Blocking-receive semantics: resolves once per message until the
    /// subscription stream ends, then yields a transport error.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Transport`] once when the stream fails or
    /// closes; callers treat that as terminal.
    async fn next_message(&self) -> Result<BusMessage, BusError>;

    /// Releases connection resources. Idempotent.
    async fn close(&self);
}
