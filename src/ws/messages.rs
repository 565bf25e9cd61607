//! WebSocket wire types: client commands and server events.
//!
//! Frames are JSON objects `{"event": <name>, "data": <payload>}`. Event
//! names are the protocol surface; the serde renames below are load-bearing.

use serde::{Deserialize, Serialize};

use crate::domain::{MessageRecord, RelayEvent};

/// Command sent by a web client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Connect the relay to a bus.
    RedisConnect {
        /// Broker host. Defaults to `localhost`.
        #[serde(default = "default_host")]
        host: String,
        /// Broker port. Defaults to `6379`.
        #[serde(default = "default_port")]
        port: u16,
        /// Credential; empty means unauthenticated.
        #[serde(default)]
        password: String,
        /// Logical database index. Defaults to `0`.
        #[serde(default)]
        db: i64,
    },

    /// Disconnect the relay from the bus.
    RedisDisconnect,

    /// Publish a payload to a channel.
    RedisPublish {
        /// Target channel.
        #[serde(default)]
        channel: String,
        /// Payload; strings are validated as JSON before publishing.
        message: Option<serde_json::Value>,
    },

    /// Subscribe to a channel.
    RedisSubscribe {
        /// Channel to subscribe to.
        #[serde(default)]
        channel: String,
    },

    /// Unsubscribe from a channel.
    RedisUnsubscribe {
        /// Channel to unsubscribe from.
        #[serde(default)]
        channel: String,
    },
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6379
}

/// Event sent to a web client — either a correlated command result or an
/// unsolicited broadcast.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Web session handshake acknowledgment.
    ConnectionStatus {
        /// Always `true`; sent once per session on open.
        connected: bool,
    },

    /// Current bus connection status, broadcast to all sessions.
    RedisConnectionStatus {
        /// Fresh liveness probe result.
        connected: bool,
        /// Channels currently subscribed to.
        channels: Vec<String>,
    },

    /// Trailing history replayed to a newly opened session.
    MessageHistory(Vec<MessageRecord>),

    /// A relayed message, broadcast to all sessions.
    RedisMessage(MessageRecord),

    /// Correlated result of a connect or disconnect command.
    RedisConnectionResult {
        /// Whether the command succeeded.
        success: bool,
        /// Human-readable outcome.
        message: String,
        /// Fresh liveness probe result after the command.
        connected: bool,
    },

    /// Correlated result of a publish command.
    PublishResult {
        /// Whether the command succeeded.
        success: bool,
        /// Human-readable outcome.
        message: String,
    },

    /// Correlated result of a subscribe command.
    SubscribeResult {
        /// Whether the command succeeded.
        success: bool,
        /// Human-readable outcome.
        message: String,
        /// Channel the command named.
        channel: String,
    },

    /// Correlated result of an unsubscribe command.
    UnsubscribeResult {
        /// Whether the command succeeded.
        success: bool,
        /// Human-readable outcome.
        message: String,
        /// Channel the command named.
        channel: String,
    },
}

impl From<RelayEvent> for ServerEvent {
    fn from(event: RelayEvent) -> Self {
        match event {
            RelayEvent::Message(record) => Self::RedisMessage(record),
            RelayEvent::StatusChanged {
                connected,
                channels,
            } => Self::RedisConnectionStatus {
                connected,
                channels,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn connect_command_parses_with_defaults() {
        let frame = r#"{"event": "redis_connect", "data": {}}"#;
        let Ok(ClientCommand::RedisConnect {
            host,
            port,
            password,
            db,
        }) = serde_json::from_str(frame)
        else {
            panic!("frame should parse as a connect command");
        };
        assert_eq!(host, "localhost");
        assert_eq!(port, 6379);
        assert_eq!(password, "");
        assert_eq!(db, 0);
    }

    #[test]
    fn disconnect_parses_without_data() {
        let frame = r#"{"event": "redis_disconnect"}"#;
        let Ok(ClientCommand::RedisDisconnect) = serde_json::from_str(frame) else {
            panic!("frame should parse as a disconnect command");
        };
    }

    #[test]
    fn publish_command_carries_payload() {
        let frame =
            r#"{"event": "redis_publish", "data": {"channel": "alerts", "message": "{\"a\":1}"}}"#;
        let Ok(ClientCommand::RedisPublish { channel, message }) = serde_json::from_str(frame)
        else {
            panic!("frame should parse as a publish command");
        };
        assert_eq!(channel, "alerts");
        assert_eq!(message, Some(json!("{\"a\":1}")));
    }

    #[test]
    fn unknown_event_fails_to_parse() {
        let frame = r#"{"event": "redis_flush", "data": {}}"#;
        assert!(serde_json::from_str::<ClientCommand>(frame).is_err());
    }

    #[test]
    fn result_events_serialize_with_protocol_names() {
        let Ok(value) = serde_json::to_value(ServerEvent::SubscribeResult {
            success: true,
            message: "Subscribed to alerts".to_string(),
            channel: "alerts".to_string(),
        }) else {
            panic!("event should serialize");
        };
        assert_eq!(value.get("event"), Some(&json!("subscribe_result")));
        assert_eq!(
            value.pointer("/data/message"),
            Some(&json!("Subscribed to alerts"))
        );
    }

    #[test]
    fn relay_events_map_to_broadcast_events() {
        let event = RelayEvent::StatusChanged {
            connected: true,
            channels: vec!["alerts".to_string()],
        };
        let Ok(value) = serde_json::to_value(ServerEvent::from(event)) else {
            panic!("event should serialize");
        };
        assert_eq!(value.get("event"), Some(&json!("redis_connection_status")));
        assert_eq!(value.pointer("/data/channels"), Some(&json!(["alerts"])));
    }

    #[test]
    fn history_serializes_as_array_payload() {
        let records = vec![MessageRecord::received("alerts", json!({"n": 1}))];
        let Ok(value) = serde_json::to_value(ServerEvent::MessageHistory(records)) else {
            panic!("event should serialize");
        };
        assert_eq!(value.get("event"), Some(&json!("message_history")));
        assert!(value.get("data").is_some_and(serde_json::Value::is_array));
    }
}
