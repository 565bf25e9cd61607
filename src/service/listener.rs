//! Background listener: drains the bus subscription into the relay core.
//!
//! At most one listener runs at a time, started lazily on the first
//! subscription and stopped when the subscription set drains. Stopping is
//! cooperative: a stop flag is raised and the task exits at its next
//! blocking boundary; callers wait with a bounded timeout and abandon the
//! task if it does not end in time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::bus::BusConnection;
use crate::service::RelayService;

/// Handle to a running listener task.
#[derive(Debug)]
pub(crate) struct ListenerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Raises the stop flag and waits up to `wait` for the task to end.
    ///
    /// On timeout the task is aborted; the bus releases its resources when
    /// the blocked receive unblocks or the process exits.
    pub(crate) async fn stop(mut self, wait: Duration) {
        let _ = self.stop.send(true);
        if timeout(wait, &mut self.task).await.is_err() {
            tracing::warn!(
                wait_ms = wait.as_millis() as u64,
                "listener did not stop in time; abandoning task"
            );
            self.task.abort();
        }
    }
}

/// Spawns the listener task over an established bus connection.
pub(crate) fn spawn(conn: Arc<dyn BusConnection>, relay: RelayService) -> ListenerHandle {
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let task = tokio::spawn(async move {
        tracing::info!("started listening for pub/sub messages");
        loop {
            tokio::select! {
                // Covers both an explicit stop and the handle being dropped.
                _ = stop_rx.changed() => break,
                received = conn.next_message() => match received {
                    Ok(msg) => {
                        let data = parse_payload(&msg.payload);
                        tracing::debug!(channel = %msg.channel, "received bus message");
                        relay.record_inbound(&msg.channel, data).await;
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "error in pub/sub listener");
                        relay.handle_listener_failure(&err).await;
                        break;
                    }
                }
            }
        }
        tracing::info!("stopped listening for pub/sub messages");
    });
    ListenerHandle {
        stop: stop_tx,
        task,
    }
}

/// Parses a bus payload as JSON, passing the raw string through unchanged
/// when it is not valid JSON.
fn parse_payload(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}
