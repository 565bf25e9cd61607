//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Everything here affects only the web
//! delivery layer and bus timeouts, never the relay core's logic.

use std::net::SocketAddr;
use std::time::Duration;

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:5000`).
    pub listen_addr: SocketAddr,

    /// Debug mode: human-readable logs at `debug` level instead of the
    /// production JSON output at `info`.
    pub debug: bool,

    /// Capacity of the session broadcast channel.
    pub event_bus_capacity: usize,

    /// Timeout for establishing a bus connection.
    pub connect_timeout: Duration,

    /// Timeout for individual bus round trips (probe, publish, subscribe).
    pub command_timeout: Duration,

    /// How long to wait for the listener task to stop before abandoning it.
    pub listener_stop_timeout: Duration,
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:5000".to_string())
            .parse()?;

        let debug = parse_env_bool("RELAY_DEBUG", false);
        let event_bus_capacity = parse_env("EVENT_BUS_CAPACITY", 1024);
        let connect_timeout = Duration::from_secs(parse_env("BUS_CONNECT_TIMEOUT_SECS", 5));
        let command_timeout = Duration::from_secs(parse_env("BUS_COMMAND_TIMEOUT_SECS", 5));
        let listener_stop_timeout =
            Duration::from_millis(parse_env("LISTENER_STOP_TIMEOUT_MS", 1_000));

        Ok(Self {
            listen_addr,
            debug,
            event_bus_capacity,
            connect_timeout,
            command_timeout,
            listener_stop_timeout,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref() {
        Some("true") | Some("TRUE") | Some("1") => true,
        Some("false") | Some("FALSE") | Some("0") => false,
        _ => default,
    }
}
