//! Redis implementation of the bus capability surface.
//!
//! Commands (PING, PUBLISH) go through a [`ConnectionManager`]; channel
//! subscriptions are owned by a dedicated pub/sub driver task, controlled
//! over an mpsc channel and pumping inbound messages to the relay's
//! listener. Every round trip is bounded by the configured command timeout.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::{BusConnection, BusConnector, BusError, BusMessage, BusParams};

/// Connects to Redis servers with bounded connect and command timeouts.
#[derive(Debug, Clone)]
pub struct RedisConnector {
    connect_timeout: Duration,
    command_timeout: Duration,
}

impl RedisConnector {
    /// Creates a connector with the given timeouts.
    #[must_use]
    pub fn new(connect_timeout: Duration, command_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            command_timeout,
        }
    }
}

#[async_trait]
impl BusConnector for RedisConnector {
    async fn connect(&self, params: &BusParams) -> Result<Arc<dyn BusConnection>, BusError> {
        let client = Client::open(connection_info(params)).map_err(map_redis_error)?;

        let manager = timeout(self.connect_timeout, ConnectionManager::new(client.clone()))
            .await
            .map_err(|_| {
                BusError::Connection(format!(
                    "timed out connecting to {}:{}",
                    params.host, params.port
                ))
            })?
            .map_err(map_redis_error)?;

        // Probe before handing the connection out, so auth failures surface
        // here rather than on the first command.
        let mut probe_conn = manager.clone();
        let ping = timeout(
            self.command_timeout,
            redis::cmd("PING").query_async::<String>(&mut probe_conn),
        )
        .await
        .map_err(|_| BusError::Connection("liveness probe timed out".to_string()))?;
        ping.map_err(map_redis_error)?;

        Ok(Arc::new(RedisConnection {
            client,
            manager,
            command_timeout: self.command_timeout,
            driver: Mutex::new(None),
            incoming: Mutex::new(None),
        }))
    }
}

/// A live Redis connection plus its lazily started pub/sub driver.
pub struct RedisConnection {
    client: Client,
    manager: ConnectionManager,
    command_timeout: Duration,
    driver: Mutex<Option<DriverHandle>>,
    incoming: Mutex<Option<mpsc::Receiver<Result<BusMessage, BusError>>>>,
}

impl fmt::Debug for RedisConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConnection")
            .field("command_timeout", &self.command_timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BusConnection for RedisConnection {
    async fn probe(&self) -> bool {
        let mut conn = self.manager.clone();
        matches!(
            timeout(
                self.command_timeout,
                redis::cmd("PING").query_async::<String>(&mut conn),
            )
            .await,
            Ok(Ok(_))
        )
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BusError> {
        let mut conn = self.manager.clone();
        let receivers: i64 = timeout(self.command_timeout, conn.publish(channel, payload))
            .await
            .map_err(|_| BusError::Transport("publish timed out".to_string()))?
            .map_err(map_redis_error)?;
        tracing::debug!(channel, receivers, "published to bus");
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<(), BusError> {
        let mut driver = self.driver.lock().await;

        let needs_spawn = match driver.as_ref() {
            Some(handle) => handle.task.is_finished(),
            None => true,
        };
        if needs_spawn {
            let pubsub = timeout(self.command_timeout, self.client.get_async_pubsub())
                .await
                .map_err(|_| BusError::Transport("pub/sub setup timed out".to_string()))?
                .map_err(map_redis_error)?;

            let (ctrl_tx, ctrl_rx) = mpsc::channel(8);
            let (msg_tx, msg_rx) = mpsc::channel(256);
            let task = tokio::spawn(drive_pubsub(pubsub, ctrl_rx, msg_tx));
            *self.incoming.lock().await = Some(msg_rx);
            *driver = Some(DriverHandle {
                ctrl: ctrl_tx,
                task,
            });
        }

        let Some(handle) = driver.as_ref() else {
            return Err(BusError::Transport("pub/sub driver unavailable".to_string()));
        };
        handle
            .request(|reply| DriverCommand::Subscribe(channel.to_string(), reply))
            .await
    }

    async fn unsubscribe(&self, channel: &str) -> Result<(), BusError> {
        let driver = self.driver.lock().await;
        // Nothing was ever subscribed; deregistration is a no-op.
        let Some(handle) = driver.as_ref() else {
            return Ok(());
        };
        if handle.task.is_finished() {
            return Ok(());
        }
        handle
            .request(|reply| DriverCommand::Unsubscribe(channel.to_string(), reply))
            .await
    }

    async fn next_message(&self) -> Result<BusMessage, BusError> {
        let mut incoming = self.incoming.lock().await;
        let Some(rx) = incoming.as_mut() else {
            return Err(BusError::Transport("no active subscription".to_string()));
        };
        match rx.recv().await {
            Some(item) => item,
            None => Err(BusError::Transport("pub/sub stream ended".to_string())),
        }
    }

    async fn close(&self) {
        let mut driver = self.driver.lock().await;
        // Dropping the control sender lets the driver exit at its next
        // loop turn; the command connection is released on drop.
        if let Some(handle) = driver.take() {
            drop(handle);
        }
    }
}

/// Control channel into the pub/sub driver task.
#[derive(Debug)]
struct DriverHandle {
    ctrl: mpsc::Sender<DriverCommand>,
    task: JoinHandle<()>,
}

impl DriverHandle {
    /// Sends a command to the driver and awaits its reply.
    async fn request<F>(&self, make: F) -> Result<(), BusError>
    where
        F: FnOnce(oneshot::Sender<Result<(), BusError>>) -> DriverCommand,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.ctrl
            .send(make(reply_tx))
            .await
            .map_err(|_| BusError::Transport("pub/sub driver stopped".to_string()))?;
        reply_rx
            .await
            .map_err(|_| BusError::Transport("pub/sub driver stopped".to_string()))?
    }
}

#[derive(Debug)]
enum DriverCommand {
    Subscribe(String, oneshot::Sender<Result<(), BusError>>),
    Unsubscribe(String, oneshot::Sender<Result<(), BusError>>),
}

/// Owns the pub/sub connection: applies subscription changes and pumps
/// inbound messages until the stream ends or all handles are dropped.
///
/// Only payload-bearing messages reach the output channel; subscription
/// confirmations never leave the transport.
async fn drive_pubsub(
    mut pubsub: redis::aio::PubSub,
    mut ctrl: mpsc::Receiver<DriverCommand>,
    messages: mpsc::Sender<Result<BusMessage, BusError>>,
) {
    enum Step {
        Inbound(Option<redis::Msg>),
        Control(Option<DriverCommand>),
    }

    loop {
        // The message stream mutably borrows the pub/sub connection, so it
        // lives only for one select turn; commands are applied between turns.
        let step = {
            let mut stream = pubsub.on_message();
            tokio::select! {
                msg = stream.next() => Step::Inbound(msg),
                cmd = ctrl.recv() => Step::Control(cmd),
            }
        };

        match step {
            Step::Inbound(Some(msg)) => {
                let channel = msg.get_channel_name().to_string();
                match msg.get_payload::<String>() {
                    Ok(payload) => {
                        if messages
                            .send(Ok(BusMessage { channel, payload }))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(err) => {
                        let _ = messages.send(Err(map_redis_error(err))).await;
                        break;
                    }
                }
            }
            Step::Inbound(None) => {
                let _ = messages
                    .send(Err(BusError::Transport(
                        "pub/sub connection lost".to_string(),
                    )))
                    .await;
                break;
            }
            Step::Control(Some(DriverCommand::Subscribe(channel, reply))) => {
                let result = pubsub.subscribe(&channel).await.map_err(map_redis_error);
                let _ = reply.send(result);
            }
            Step::Control(Some(DriverCommand::Unsubscribe(channel, reply))) => {
                let result = pubsub.unsubscribe(&channel).await.map_err(map_redis_error);
                let _ = reply.send(result);
            }
            Step::Control(None) => break,
        }
    }
    tracing::debug!("pub/sub driver stopped");
}

fn connection_info(params: &BusParams) -> ConnectionInfo {
    ConnectionInfo {
        addr: ConnectionAddr::Tcp(params.host.clone(), params.port),
        redis: RedisConnectionInfo {
            db: params.db,
            username: None,
            password: params.credential.clone(),
            ..RedisConnectionInfo::default()
        },
    }
}

fn map_redis_error(err: redis::RedisError) -> BusError {
    if err.kind() == redis::ErrorKind::AuthenticationFailed {
        BusError::Auth(err.to_string())
    } else if err.is_connection_refusal() || err.is_io_error() || err.is_timeout() {
        BusError::Connection(err.to_string())
    } else {
        BusError::Transport(err.to_string())
    }
}
