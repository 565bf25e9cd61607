//! REST API layer: route handlers, DTOs, and router composition.
//!
//! The REST surface is read-only; all mutations go through the WebSocket
//! protocol. Endpoints are mounted under `/api/v1` except `/health`.

pub mod dto;
pub mod handlers;

use std::time::Duration;

use axum::Router;
use tower_http::timeout::TimeoutLayer;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
}
