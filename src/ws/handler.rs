//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_session;
use crate::app_state::AppState;

/// `GET /ws` — Upgrade HTTP connection to a relay session.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let event_rx = state.event_bus.subscribe();
    let relay = state.relay.clone();

    ws.on_upgrade(move |socket| run_session(socket, event_rx, relay))
}
