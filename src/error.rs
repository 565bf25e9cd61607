//! Relay error types.
//!
//! [`RelayError`] is the central error type for the relay core. Every
//! variant renders to the human-readable message that is sent back to the
//! issuing web session as a `{success: false, message}` result event —
//! nothing propagates past the service boundary as a panic or fatal fault.

use crate::bus::BusError;

/// Relay-level error with stable, user-visible message strings.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RelayError {
    /// An operation required a live bus connection and none was available
    /// (or the liveness probe failed).
    #[error("Not connected to Redis")]
    NotConnected,

    /// A string payload could not be parsed as structured JSON.
    #[error("Invalid JSON format")]
    InvalidPayload,

    /// A command referenced an empty channel name.
    #[error("Channel name is required")]
    EmptyChannel,

    /// The bus could not be reached or the connection handshake failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The bus rejected the provided credentials.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// A publish round trip to the bus failed.
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    /// A subscribe registration with the bus failed.
    #[error("Subscribe failed: {0}")]
    SubscribeFailed(String),

    /// An unsubscribe deregistration with the bus failed.
    #[error("Unsubscribe failed: {0}")]
    UnsubscribeFailed(String),

    /// Unexpected internal failure.
    #[error("Error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Maps a connection-phase bus error, preserving the auth/connect
    /// distinction in the resulting message.
    #[must_use]
    pub fn from_connect(err: BusError) -> Self {
        match err {
            BusError::Auth(reason) => Self::AuthFailed(reason),
            BusError::Connection(reason) | BusError::Transport(reason) => {
                Self::ConnectionFailed(reason)
            }
        }
    }
}
