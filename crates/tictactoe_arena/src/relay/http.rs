//! Read-only HTTP status API for the relay.

use super::{RelayState, RoomSnapshot};
use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the relay runs.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Builds the status router.
pub fn status_router(state: RelayState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/state", get(room_state))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[instrument(skip(state))]
async fn room_state(State(state): State<RelayState>) -> Json<RoomSnapshot> {
    Json(state.room().lock().await.snapshot())
}
