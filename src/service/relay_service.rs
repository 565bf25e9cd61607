//! Relay core: connection/subscription state machine and message fan-out.
//!
//! [`RelayService`] owns the single shared bus connection, the subscription
//! set, the listener handle, and the rolling history — all behind one
//! mutex, the relay's explicit mutual-exclusion boundary. Every mutation
//! follows the pattern: lock → act on the bus → update state → emit events.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::bus::{BusConnection, BusConnector, BusError, BusParams};
use crate::domain::history::SESSION_REPLAY_LEN;
use crate::domain::{ERROR_CHANNEL, EventBus, HistoryBuffer, MessageRecord, RelayEvent};
use crate::error::RelayError;
use crate::service::listener::{self, ListenerHandle};

/// Point-in-time view of the relay's connection state.
///
/// `connected` is the result of a fresh liveness probe taken while the
/// snapshot was captured, never a cached flag.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    /// Whether the bus answered a liveness probe.
    pub connected: bool,
    /// Channels currently subscribed to.
    pub channels: Vec<String>,
    /// Whether the background listener is running.
    pub listening: bool,
}

/// Shared mutable relay state. Guarded by a single mutex; the listener
/// task and all command paths serialize through it.
#[derive(Debug)]
struct RelayState {
    connection: Option<Arc<dyn BusConnection>>,
    channels: BTreeSet<String>,
    listener: Option<ListenerHandle>,
    history: HistoryBuffer,
}

/// The relay core.
///
/// Cheap to clone; clones share the same state, connector, and event bus.
#[derive(Debug, Clone)]
pub struct RelayService {
    connector: Arc<dyn BusConnector>,
    state: Arc<Mutex<RelayState>>,
    event_bus: EventBus,
    listener_stop_timeout: Duration,
}

impl RelayService {
    /// Creates a relay service over the given bus connector.
    #[must_use]
    pub fn new(
        connector: Arc<dyn BusConnector>,
        event_bus: EventBus,
        listener_stop_timeout: Duration,
    ) -> Self {
        Self {
            connector,
            state: Arc::new(Mutex::new(RelayState {
                connection: None,
                channels: BTreeSet::new(),
                listener: None,
                history: HistoryBuffer::new(),
            })),
            event_bus,
            listener_stop_timeout,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Connects to the bus, tearing down any existing connection first.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ConnectionFailed`] when the broker is
    /// unreachable and [`RelayError::AuthFailed`] when credentials are
    /// rejected. The previous connection is gone either way.
    pub async fn connect(&self, params: BusParams) -> Result<String, RelayError> {
        self.teardown().await;

        let conn = self
            .connector
            .connect(&params)
            .await
            .map_err(RelayError::from_connect)?;
        tracing::info!(host = %params.host, port = params.port, db = params.db, "connected to bus");

        let superseded = {
            let mut state = self.state.lock().await;
            state.connection.replace(Arc::clone(&conn))
        };
        // A concurrent connect can land between teardown and here; the
        // newer connection wins and the older one is released.
        if let Some(old) = superseded {
            old.close().await;
        }

        Ok("Connected successfully".to_string())
    }

    /// Disconnects from the bus: stops the listener, clears the
    /// subscription set, and releases the connection. Idempotent.
    pub async fn disconnect(&self) -> String {
        self.teardown().await;
        tracing::info!("disconnected from bus");
        "Disconnected from Redis".to_string()
    }

    /// Performs a fresh liveness probe. Returns `false` when no connection
    /// exists or the probe fails.
    pub async fn is_connected(&self) -> bool {
        let conn = {
            let state = self.state.lock().await;
            state.connection.as_ref().map(Arc::clone)
        };
        match conn {
            Some(conn) => conn.probe().await,
            None => false,
        }
    }

    /// Captures the current status under a single lock acquisition.
    pub async fn status(&self) -> StatusSnapshot {
        let state = self.state.lock().await;
        Self::snapshot_locked(&state).await
    }

    /// Captures status plus the trailing history replayed to a new
    /// session. One lock acquisition, so the pair cannot tear.
    pub async fn session_snapshot(&self) -> (StatusSnapshot, Vec<MessageRecord>) {
        let state = self.state.lock().await;
        let status = Self::snapshot_locked(&state).await;
        let replay = state.history.tail(SESSION_REPLAY_LEN);
        (status, replay)
    }

    /// Returns the trailing `limit` history records.
    pub async fn history(&self, limit: usize) -> Vec<MessageRecord> {
        let state = self.state.lock().await;
        state.history.tail(limit)
    }

    /// Broadcasts the current connection status to every session.
    pub async fn broadcast_status(&self) {
        let status = self.status().await;
        self.event_bus.publish(RelayEvent::StatusChanged {
            connected: status.connected,
            channels: status.channels,
        });
    }

    /// Subscribes to a channel, lazily starting the listener.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::NotConnected`] without a live (probed)
    /// connection and [`RelayError::SubscribeFailed`] when bus
    /// registration fails. Already-subscribed channels succeed without
    /// starting a second listener.
    pub async fn subscribe(&self, channel: &str) -> Result<String, RelayError> {
        let mut state = self.state.lock().await;

        let Some(conn) = state.connection.as_ref().map(Arc::clone) else {
            return Err(RelayError::NotConnected);
        };
        if !conn.probe().await {
            return Err(RelayError::NotConnected);
        }
        if state.channels.contains(channel) {
            return Ok(format!("Already subscribed to {channel}"));
        }

        conn.subscribe(channel)
            .await
            .map_err(|err| RelayError::SubscribeFailed(err.to_string()))?;
        state.channels.insert(channel.to_string());

        if state.listener.is_none() {
            state.listener = Some(listener::spawn(Arc::clone(&conn), self.clone()));
        }

        tracing::info!(channel, "subscribed");
        Ok(format!("Subscribed to {channel}"))
    }

    /// Unsubscribes from a channel, stopping the listener when the set
    /// drains. Not-subscribed channels succeed as a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::UnsubscribeFailed`] when bus deregistration
    /// fails; the channel then stays in the set.
    pub async fn unsubscribe(&self, channel: &str) -> Result<String, RelayError> {
        let stopped = {
            let mut state = self.state.lock().await;

            if !state.channels.contains(channel) {
                return Ok(format!("Not subscribed to {channel}"));
            }
            if let Some(conn) = state.connection.as_ref().map(Arc::clone) {
                conn.unsubscribe(channel)
                    .await
                    .map_err(|err| RelayError::UnsubscribeFailed(err.to_string()))?;
            }
            state.channels.remove(channel);

            if state.channels.is_empty() {
                state.listener.take()
            } else {
                None
            }
        };

        // Join outside the lock: the listener may be waiting on it to
        // record an in-flight message.
        if let Some(handle) = stopped {
            handle.stop(self.listener_stop_timeout).await;
        }

        tracing::info!(channel, "unsubscribed");
        Ok(format!("Unsubscribed from {channel}"))
    }

    /// Publishes a payload to a channel.
    ///
    /// String payloads are parsed as JSON first; parse failure rejects the
    /// command before any bus contact. On success the record is appended
    /// to history and broadcast to every session before the issuing
    /// session sees its ack.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidPayload`] for unparseable string
    /// payloads, [`RelayError::NotConnected`] without a live connection,
    /// and [`RelayError::PublishFailed`] when the bus round trip fails.
    pub async fn publish(
        &self,
        channel: &str,
        payload: serde_json::Value,
    ) -> Result<String, RelayError> {
        let payload = match payload {
            serde_json::Value::String(raw) => {
                serde_json::from_str(&raw).map_err(|_| RelayError::InvalidPayload)?
            }
            structured => structured,
        };

        let mut state = self.state.lock().await;
        let Some(conn) = state.connection.as_ref().map(Arc::clone) else {
            return Err(RelayError::NotConnected);
        };
        if !conn.probe().await {
            return Err(RelayError::NotConnected);
        }

        let wire = serde_json::to_string(&payload)
            .map_err(|err| RelayError::Internal(err.to_string()))?;
        conn.publish(channel, &wire)
            .await
            .map_err(|err| RelayError::PublishFailed(err.to_string()))?;

        let record = MessageRecord::sent(channel, payload);
        state.history.push(record.clone());
        drop(state);

        self.event_bus.publish(RelayEvent::Message(record));
        Ok("Message published successfully".to_string())
    }

    /// Records an inbound bus message and broadcasts it. Invoked by the
    /// listener for every received message, including the synthetic
    /// `_error` channel.
    pub(crate) async fn record_inbound(&self, channel: &str, data: serde_json::Value) {
        let record = MessageRecord::received(channel, data);
        {
            let mut state = self.state.lock().await;
            state.history.push(record.clone());
        }
        self.event_bus.publish(RelayEvent::Message(record));
    }

    /// Handles a terminal listener failure: reports it once through the
    /// `_error` channel, clears the subscription set, and broadcasts the
    /// degraded status so sessions can observe it and re-subscribe.
    pub(crate) async fn handle_listener_failure(&self, err: &BusError) {
        self.record_inbound(ERROR_CHANNEL, serde_json::json!({ "error": err.to_string() }))
            .await;
        {
            let mut state = self.state.lock().await;
            state.channels.clear();
            state.listener = None;
        }
        self.broadcast_status().await;
    }

    /// Tears down connection, listener, and subscriptions without
    /// emitting events. Shared by connect (supersede) and disconnect.
    async fn teardown(&self) {
        let (conn, handle) = {
            let mut state = self.state.lock().await;
            state.channels.clear();
            (state.connection.take(), state.listener.take())
        };
        if let Some(handle) = handle {
            handle.stop(self.listener_stop_timeout).await;
        }
        if let Some(conn) = conn {
            conn.close().await;
        }
    }

    async fn snapshot_locked(state: &RelayState) -> StatusSnapshot {
        let connected = match state.connection.as_ref() {
            Some(conn) => conn.probe().await,
            None => false,
        };
        StatusSnapshot {
            connected,
            channels: state.channels.iter().cloned().collect(),
            listening: state.listener.is_some(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::bus::BusMessage;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::{broadcast, mpsc};
    use tokio::time::timeout;

    #[derive(Debug)]
    struct MockConnection {
        alive: AtomicBool,
        closed: AtomicBool,
        subscriptions: Mutex<Vec<String>>,
        published: Mutex<Vec<(String, String)>>,
        inbound_tx: mpsc::Sender<Result<BusMessage, BusError>>,
        inbound_rx: Mutex<mpsc::Receiver<Result<BusMessage, BusError>>>,
    }

    impl MockConnection {
        fn new() -> Arc<Self> {
            let (inbound_tx, inbound_rx) = mpsc::channel(32);
            Arc::new(Self {
                alive: AtomicBool::new(true),
                closed: AtomicBool::new(false),
                subscriptions: Mutex::new(Vec::new()),
                published: Mutex::new(Vec::new()),
                inbound_tx,
                inbound_rx: Mutex::new(inbound_rx),
            })
        }

        async fn push(&self, channel: &str, payload: &str) {
            let _ = self
                .inbound_tx
                .send(Ok(BusMessage {
                    channel: channel.to_string(),
                    payload: payload.to_string(),
                }))
                .await;
        }

        async fn fail_stream(&self) {
            let _ = self
                .inbound_tx
                .send(Err(BusError::Transport("connection reset".to_string())))
                .await;
        }
    }

    #[async_trait]
    impl BusConnection for MockConnection {
        async fn probe(&self) -> bool {
            self.alive.load(Ordering::SeqCst)
        }

        async fn publish(&self, channel: &str, payload: &str) -> Result<(), BusError> {
            self.published
                .lock()
                .await
                .push((channel.to_string(), payload.to_string()));
            Ok(())
        }

        async fn subscribe(&self, channel: &str) -> Result<(), BusError> {
            self.subscriptions.lock().await.push(channel.to_string());
            Ok(())
        }

        async fn unsubscribe(&self, channel: &str) -> Result<(), BusError> {
            self.subscriptions.lock().await.retain(|c| c != channel);
            Ok(())
        }

        async fn next_message(&self) -> Result<BusMessage, BusError> {
            let mut rx = self.inbound_rx.lock().await;
            match rx.recv().await {
                Some(item) => item,
                None => Err(BusError::Transport("pub/sub stream ended".to_string())),
            }
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Debug, Default)]
    struct MockConnector {
        fail_with: Mutex<Option<BusError>>,
        connections: Mutex<Vec<Arc<MockConnection>>>,
    }

    impl MockConnector {
        async fn last_connection(&self) -> Option<Arc<MockConnection>> {
            self.connections.lock().await.last().map(Arc::clone)
        }
    }

    #[async_trait]
    impl BusConnector for MockConnector {
        async fn connect(&self, _params: &BusParams) -> Result<Arc<dyn BusConnection>, BusError> {
            if let Some(err) = self.fail_with.lock().await.take() {
                return Err(err);
            }
            let conn = MockConnection::new();
            self.connections.lock().await.push(Arc::clone(&conn));
            Ok(conn)
        }
    }

    fn make_relay() -> (RelayService, Arc<MockConnector>) {
        let connector = Arc::new(MockConnector::default());
        let event_bus = EventBus::new(64);
        let relay = RelayService::new(
            Arc::clone(&connector) as Arc<dyn BusConnector>,
            event_bus,
            Duration::from_millis(500),
        );
        (relay, connector)
    }

    fn params() -> BusParams {
        BusParams {
            host: "localhost".to_string(),
            port: 6379,
            credential: None,
            db: 0,
        }
    }

    async fn recv_event(rx: &mut broadcast::Receiver<RelayEvent>) -> RelayEvent {
        let Ok(Ok(event)) = timeout(Duration::from_secs(1), rx.recv()).await else {
            panic!("expected a relay event");
        };
        event
    }

    #[tokio::test]
    async fn connect_reports_success_and_live_status() {
        let (relay, _) = make_relay();
        let Ok(message) = relay.connect(params()).await else {
            panic!("connect should succeed");
        };
        assert_eq!(message, "Connected successfully");
        assert!(relay.is_connected().await);

        let status = relay.status().await;
        assert!(status.connected);
        assert!(status.channels.is_empty());
        assert!(!status.listening);
    }

    #[tokio::test]
    async fn connect_failure_surfaces_reason() {
        let (relay, connector) = make_relay();
        *connector.fail_with.lock().await =
            Some(BusError::Connection("connection refused".to_string()));

        let Err(err) = relay.connect(params()).await else {
            panic!("connect should fail");
        };
        assert_eq!(err.to_string(), "Connection failed: connection refused");
        assert!(!relay.is_connected().await);
    }

    #[tokio::test]
    async fn auth_failure_surfaces_distinctly() {
        let (relay, connector) = make_relay();
        *connector.fail_with.lock().await = Some(BusError::Auth("WRONGPASS".to_string()));

        let Err(err) = relay.connect(params()).await else {
            panic!("connect should fail");
        };
        assert_eq!(err.to_string(), "Authentication failed: WRONGPASS");
    }

    #[tokio::test]
    async fn new_connect_supersedes_previous_connection() {
        let (relay, connector) = make_relay();
        let Ok(_) = relay.connect(params()).await else {
            panic!("first connect should succeed");
        };
        let Some(first) = connector.last_connection().await else {
            panic!("mock connection missing");
        };

        let Ok(_) = relay.connect(params()).await else {
            panic!("second connect should succeed");
        };
        assert!(first.closed.load(Ordering::SeqCst));
        assert!(relay.is_connected().await);
    }

    #[tokio::test]
    async fn publish_without_connection_is_rejected() {
        let (relay, _) = make_relay();
        let Err(err) = relay.publish("alerts", json!({"a": 1})).await else {
            panic!("publish should fail");
        };
        assert_eq!(err.to_string(), "Not connected to Redis");
    }

    #[tokio::test]
    async fn publish_rejects_unparseable_string_without_side_effects() {
        let (relay, connector) = make_relay();
        let Ok(_) = relay.connect(params()).await else {
            panic!("connect should succeed");
        };
        let mut rx = relay.event_bus().subscribe();

        let Err(err) = relay.publish("alerts", json!("not json")).await else {
            panic!("publish should fail");
        };
        assert_eq!(err.to_string(), "Invalid JSON format");

        // No bus contact, no history entry, no broadcast.
        let Some(conn) = connector.last_connection().await else {
            panic!("mock connection missing");
        };
        assert!(conn.published.lock().await.is_empty());
        assert!(relay.history(100).await.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn publish_records_history_and_broadcasts_sent() {
        let (relay, connector) = make_relay();
        let Ok(_) = relay.connect(params()).await else {
            panic!("connect should succeed");
        };
        let mut rx = relay.event_bus().subscribe();

        let Ok(message) = relay.publish("alerts", json!({"level": "warn"})).await else {
            panic!("publish should succeed");
        };
        assert_eq!(message, "Message published successfully");

        let Some(conn) = connector.last_connection().await else {
            panic!("mock connection missing");
        };
        let published = conn.published.lock().await;
        assert_eq!(
            published.first(),
            Some(&("alerts".to_string(), r#"{"level":"warn"}"#.to_string()))
        );

        let RelayEvent::Message(record) = recv_event(&mut rx).await else {
            panic!("expected a message event");
        };
        assert_eq!(record.channel, "alerts");
        assert_eq!(record.direction, crate::domain::Direction::Sent);
        assert_eq!(relay.history(100).await.len(), 1);
    }

    #[tokio::test]
    async fn publish_parses_string_payloads_before_sending() {
        let (relay, connector) = make_relay();
        let Ok(_) = relay.connect(params()).await else {
            panic!("connect should succeed");
        };

        let Ok(_) = relay.publish("alerts", json!(r#"{"level":"warn"}"#)).await else {
            panic!("publish should succeed");
        };
        let Some(conn) = connector.last_connection().await else {
            panic!("mock connection missing");
        };
        let published = conn.published.lock().await;
        assert_eq!(
            published.first().map(|(_, payload)| payload.as_str()),
            Some(r#"{"level":"warn"}"#)
        );
    }

    #[tokio::test]
    async fn subscribe_requires_live_connection() {
        let (relay, _) = make_relay();
        let Err(err) = relay.subscribe("alerts").await else {
            panic!("subscribe should fail");
        };
        assert_eq!(err.to_string(), "Not connected to Redis");
    }

    #[tokio::test]
    async fn subscribe_starts_one_listener_and_is_idempotent() {
        let (relay, connector) = make_relay();
        let Ok(_) = relay.connect(params()).await else {
            panic!("connect should succeed");
        };

        let Ok(message) = relay.subscribe("alerts").await else {
            panic!("subscribe should succeed");
        };
        assert_eq!(message, "Subscribed to alerts");
        assert!(relay.status().await.listening);

        let Ok(message) = relay.subscribe("alerts").await else {
            panic!("repeat subscribe should succeed");
        };
        assert_eq!(message, "Already subscribed to alerts");

        // Registered with the bus exactly once.
        let Some(conn) = connector.last_connection().await else {
            panic!("mock connection missing");
        };
        assert_eq!(conn.subscriptions.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn listener_runs_iff_subscription_set_nonempty() {
        let (relay, _) = make_relay();
        let Ok(_) = relay.connect(params()).await else {
            panic!("connect should succeed");
        };

        let Ok(_) = relay.subscribe("alerts").await else {
            panic!("subscribe alerts should succeed");
        };
        let Ok(_) = relay.subscribe("metrics").await else {
            panic!("subscribe metrics should succeed");
        };
        assert!(relay.status().await.listening);

        let Ok(_) = relay.unsubscribe("alerts").await else {
            panic!("unsubscribe alerts should succeed");
        };
        assert!(relay.status().await.listening);

        let Ok(message) = relay.unsubscribe("metrics").await else {
            panic!("unsubscribe metrics should succeed");
        };
        assert_eq!(message, "Unsubscribed from metrics");
        let status = relay.status().await;
        assert!(!status.listening);
        assert!(status.channels.is_empty());
    }

    #[tokio::test]
    async fn unsubscribe_unknown_channel_is_a_noop() {
        let (relay, _) = make_relay();
        let Ok(message) = relay.unsubscribe("alerts").await else {
            panic!("unsubscribe should succeed");
        };
        assert_eq!(message, "Not subscribed to alerts");
    }

    #[tokio::test]
    async fn inbound_messages_are_recorded_and_broadcast() {
        let (relay, connector) = make_relay();
        let Ok(_) = relay.connect(params()).await else {
            panic!("connect should succeed");
        };
        let Ok(_) = relay.subscribe("alerts").await else {
            panic!("subscribe should succeed");
        };
        let mut rx = relay.event_bus().subscribe();

        let Some(conn) = connector.last_connection().await else {
            panic!("mock connection missing");
        };
        conn.push("alerts", r#"{"level":"warn"}"#).await;

        let RelayEvent::Message(record) = recv_event(&mut rx).await else {
            panic!("expected a message event");
        };
        assert_eq!(record.channel, "alerts");
        assert_eq!(record.data, json!({"level": "warn"}));
        assert_eq!(record.direction, crate::domain::Direction::Received);
        assert_eq!(relay.history(100).await.len(), 1);
    }

    #[tokio::test]
    async fn inbound_non_json_passes_through_raw() {
        let (relay, connector) = make_relay();
        let Ok(_) = relay.connect(params()).await else {
            panic!("connect should succeed");
        };
        let Ok(_) = relay.subscribe("alerts").await else {
            panic!("subscribe should succeed");
        };
        let mut rx = relay.event_bus().subscribe();

        let Some(conn) = connector.last_connection().await else {
            panic!("mock connection missing");
        };
        conn.push("alerts", "plain text").await;

        let RelayEvent::Message(record) = recv_event(&mut rx).await else {
            panic!("expected a message event");
        };
        assert_eq!(record.data, json!("plain text"));
    }

    #[tokio::test]
    async fn transport_error_reports_once_and_degrades_status() {
        let (relay, connector) = make_relay();
        let Ok(_) = relay.connect(params()).await else {
            panic!("connect should succeed");
        };
        let Ok(_) = relay.subscribe("alerts").await else {
            panic!("subscribe should succeed");
        };
        let mut rx = relay.event_bus().subscribe();

        let Some(conn) = connector.last_connection().await else {
            panic!("mock connection missing");
        };
        conn.fail_stream().await;

        let RelayEvent::Message(record) = recv_event(&mut rx).await else {
            panic!("expected the error report");
        };
        assert_eq!(record.channel, ERROR_CHANNEL);
        assert_eq!(record.data, json!({"error": "connection reset"}));

        let RelayEvent::StatusChanged { channels, .. } = recv_event(&mut rx).await else {
            panic!("expected the degraded status broadcast");
        };
        assert!(channels.is_empty());

        let status = relay.status().await;
        assert!(status.channels.is_empty());
        assert!(!status.listening);
    }

    #[tokio::test]
    async fn disconnect_clears_everything_and_is_idempotent() {
        let (relay, connector) = make_relay();
        let Ok(_) = relay.connect(params()).await else {
            panic!("connect should succeed");
        };
        let Ok(_) = relay.subscribe("alerts").await else {
            panic!("subscribe should succeed");
        };

        assert_eq!(relay.disconnect().await, "Disconnected from Redis");
        let status = relay.status().await;
        assert!(!status.connected);
        assert!(status.channels.is_empty());
        assert!(!status.listening);

        let Some(conn) = connector.last_connection().await else {
            panic!("mock connection missing");
        };
        assert!(conn.closed.load(Ordering::SeqCst));

        // Safe with nothing connected.
        assert_eq!(relay.disconnect().await, "Disconnected from Redis");
    }

    #[tokio::test]
    async fn session_snapshot_replays_trailing_records() {
        let (relay, _) = make_relay();
        let Ok(_) = relay.connect(params()).await else {
            panic!("connect should succeed");
        };

        for n in 0..60 {
            relay.record_inbound("alerts", json!({ "seq": n })).await;
        }

        let (status, replay) = relay.session_snapshot().await;
        assert!(status.connected);
        assert_eq!(replay.len(), SESSION_REPLAY_LEN);
        assert_eq!(
            replay.first().and_then(|r| r.data.get("seq")).cloned(),
            Some(json!(10))
        );
    }

    #[tokio::test]
    async fn broadcast_status_emits_current_state() {
        let (relay, _) = make_relay();
        let Ok(_) = relay.connect(params()).await else {
            panic!("connect should succeed");
        };
        let Ok(_) = relay.subscribe("alerts").await else {
            panic!("subscribe should succeed");
        };
        let mut rx = relay.event_bus().subscribe();

        relay.broadcast_status().await;

        let RelayEvent::StatusChanged {
            connected,
            channels,
        } = recv_event(&mut rx).await
        else {
            panic!("expected a status event");
        };
        assert!(connected);
        assert_eq!(channels, vec!["alerts".to_string()]);
    }
}
