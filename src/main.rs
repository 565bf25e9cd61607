//! pubsub-relay server entry point.
//!
//! Starts the Axum HTTP server with the WebSocket relay endpoint and the
//! read-only REST endpoints.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use pubsub_relay::api;
use pubsub_relay::app_state::AppState;
use pubsub_relay::bus::redis::RedisConnector;
use pubsub_relay::config::RelayConfig;
use pubsub_relay::domain::EventBus;
use pubsub_relay::service::RelayService;
use pubsub_relay::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = RelayConfig::from_env()?;

    // Initialize tracing: human-readable in debug mode, JSON in production
    let default_level = if config.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if config.debug {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    }
    tracing::info!(addr = %config.listen_addr, "starting pubsub-relay");

    // Build the relay core over the Redis collaborator
    let event_bus = EventBus::new(config.event_bus_capacity);
    let connector = Arc::new(RedisConnector::new(
        config.connect_timeout,
        config.command_timeout,
    ));
    let relay = RelayService::new(connector, event_bus.clone(), config.listener_stop_timeout);

    // Build application state
    let app_state = AppState { relay, event_bus };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
