//! Read-only relay inspection endpoints.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{HistoryParams, HistoryResponse, StatusResponse};
use crate::app_state::AppState;

/// `GET /status` — Current connection status and subscription set.
///
/// Liveness is probed per request, never cached.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.relay.status().await;
    Json(StatusResponse::from(snapshot))
}

/// `GET /history` — Trailing message history.
pub async fn history_handler(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> impl IntoResponse {
    let messages = state.relay.history(params.clamped()).await;
    Json(HistoryResponse {
        count: messages.len(),
        messages,
    })
}

/// Relay routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(status_handler))
        .route("/history", get(history_handler))
}
