//! WebSocket session loop.
//!
//! Each session first receives a consistent snapshot (handshake ack, bus
//! status, trailing history), then runs a select loop that dispatches
//! client commands and forwards broadcast events. Every command yields
//! exactly one correlated result event to the issuing session; broadcasts
//! reach all sessions through the event bus.

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{ClientCommand, ServerEvent};
use crate::bus::BusParams;
use crate::domain::RelayEvent;
use crate::error::RelayError;
use crate::service::RelayService;

/// Runs the read/write loop for one WebSocket session.
pub async fn run_session(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<RelayEvent>,
    relay: RelayService,
) {
    let session_id = uuid::Uuid::new_v4();
    let (mut ws_tx, mut ws_rx) = socket.split();
    tracing::debug!(%session_id, "web session opened");

    // Status and history come from one lock capture so the snapshot
    // cannot tear against concurrent relaying.
    let (status, replay) = relay.session_snapshot().await;
    let opening = [
        ServerEvent::ConnectionStatus { connected: true },
        ServerEvent::RedisConnectionStatus {
            connected: status.connected,
            channels: status.channels,
        },
        ServerEvent::MessageHistory(replay),
    ];
    for event in opening {
        if send_event(&mut ws_tx, &event).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            // Incoming command from this session's client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let Some(command) = parse_command(&text) else {
                            continue;
                        };
                        let (ack, rebroadcast) = dispatch(command, &relay).await;
                        if send_event(&mut ws_tx, &ack).await.is_err() {
                            break;
                        }
                        // Subscription and disconnect commands re-announce
                        // the bus status to every session, issuer included.
                        if rebroadcast {
                            relay.broadcast_status().await;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Broadcast event from the relay core
            event = event_rx.recv() => {
                match event {
                    Ok(relay_event) => {
                        if send_event(&mut ws_tx, &ServerEvent::from(relay_event))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(%session_id, lagged = n, "session lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!(%session_id, "web session closed");
}

/// Parses a client frame; unknown or malformed frames are dropped with a
/// warning, matching a socket layer with no handler for them.
fn parse_command(text: &str) -> Option<ClientCommand> {
    match serde_json::from_str(text) {
        Ok(command) => Some(command),
        Err(err) => {
            tracing::warn!(error = %err, "ignoring unrecognized client frame");
            None
        }
    }
}

/// Executes one command and returns its correlated result event, plus
/// whether the bus status should be re-broadcast afterwards.
async fn dispatch(command: ClientCommand, relay: &RelayService) -> (ServerEvent, bool) {
    match command {
        ClientCommand::RedisConnect {
            host,
            port,
            password,
            db,
        } => {
            let params = BusParams {
                host,
                port,
                credential: (!password.is_empty()).then_some(password),
                db,
            };
            let result = relay.connect(params).await;
            let connected = relay.is_connected().await;
            let ack = match result {
                Ok(message) => ServerEvent::RedisConnectionResult {
                    success: true,
                    message,
                    connected,
                },
                Err(err) => ServerEvent::RedisConnectionResult {
                    success: false,
                    message: err.to_string(),
                    connected,
                },
            };
            (ack, false)
        }

        ClientCommand::RedisDisconnect => {
            let message = relay.disconnect().await;
            (
                ServerEvent::RedisConnectionResult {
                    success: true,
                    message,
                    connected: false,
                },
                true,
            )
        }

        ClientCommand::RedisPublish { channel, message } => {
            if channel.is_empty() {
                return (
                    ServerEvent::PublishResult {
                        success: false,
                        message: RelayError::EmptyChannel.to_string(),
                    },
                    false,
                );
            }
            let payload = message.unwrap_or_else(|| serde_json::json!({}));
            let ack = match relay.publish(&channel, payload).await {
                Ok(message) => ServerEvent::PublishResult {
                    success: true,
                    message,
                },
                Err(err) => ServerEvent::PublishResult {
                    success: false,
                    message: err.to_string(),
                },
            };
            (ack, false)
        }

        ClientCommand::RedisSubscribe { channel } => {
            if channel.is_empty() {
                return (
                    ServerEvent::SubscribeResult {
                        success: false,
                        message: RelayError::EmptyChannel.to_string(),
                        channel,
                    },
                    false,
                );
            }
            let ack = match relay.subscribe(&channel).await {
                Ok(message) => ServerEvent::SubscribeResult {
                    success: true,
                    message,
                    channel,
                },
                Err(err) => ServerEvent::SubscribeResult {
                    success: false,
                    message: err.to_string(),
                    channel,
                },
            };
            (ack, true)
        }

        ClientCommand::RedisUnsubscribe { channel } => {
            if channel.is_empty() {
                return (
                    ServerEvent::UnsubscribeResult {
                        success: false,
                        message: RelayError::EmptyChannel.to_string(),
                        channel,
                    },
                    false,
                );
            }
            let ack = match relay.unsubscribe(&channel).await {
                Ok(message) => ServerEvent::UnsubscribeResult {
                    success: true,
                    message,
                    channel,
                },
                Err(err) => ServerEvent::UnsubscribeResult {
                    success: false,
                    message: err.to_string(),
                    channel,
                },
            };
            (ack, true)
        }
    }
}

/// Serializes and sends one event. `Err` means the socket is gone and the
/// session loop should end; serialization failures are logged and skipped.
async fn send_event(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), ()> {
    match serde_json::to_string(event) {
        Ok(json) => ws_tx.send(Message::text(json)).await.map_err(|_| ()),
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize server event");
            Ok(())
        }
    }
}
