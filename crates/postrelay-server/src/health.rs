//! Health check endpoint.
//!
//! Reports the stored post count and the delivery worker's counters.

use axum::extract::State;
use axum::Json;
use relay_outbox::QueueStatus;
use serde::Serialize;

use crate::{AppState, ServerResult};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub messages: usize,
    pub queue: QueueStatus,
}

/// `GET /health`
pub async fn health_handler(State(state): State<AppState>) -> ServerResult<Json<HealthResponse>> {
    let messages = state.store().count().await?;
    let queue = state.worker().status().await;

    Ok(Json(HealthResponse {
        status: "OK",
        messages,
        queue,
    }))
}
