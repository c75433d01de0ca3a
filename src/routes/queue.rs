//! Queue REST routes — HTTP mirror of the controller operations.
//!
//! Mutations taken over HTTP push the new record to every connected view,
//! since an HTTP caller has no websocket channel to be excluded from.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;

use crate::frame::Frame;
use crate::services::queue::{self, QueueError};
use crate::state::{AppState, QueuePatch, QueueState};

/// `GET /api/queue` — current snapshot.
pub async fn get_queue(State(state): State<AppState>) -> Json<QueueState> {
    Json(state.queue.read().await.clone())
}

/// `PATCH /api/queue` — apply a merge patch.
pub async fn patch_queue(
    State(state): State<AppState>,
    Json(patch): Json<QueuePatch>,
) -> Result<Json<QueueState>, StatusCode> {
    let snapshot = queue::apply_patch(&state, &patch)
        .await
        .map_err(|e| queue_error_to_status(&e))?;
    notify_views(&state, &snapshot).await;
    Ok(Json(snapshot))
}

/// `POST /api/queue/advance` — call the next number.
pub async fn advance_queue(State(state): State<AppState>) -> Result<Json<QueueState>, StatusCode> {
    let snapshot = queue::advance(&state)
        .await
        .map_err(|e| queue_error_to_status(&e))?;
    notify_views(&state, &snapshot).await;
    Ok(Json(snapshot))
}

/// `POST /api/queue/rewind` — step back one number, clamped at zero.
pub async fn rewind_queue(State(state): State<AppState>) -> Result<Json<QueueState>, StatusCode> {
    let snapshot = queue::rewind(&state)
        .await
        .map_err(|e| queue_error_to_status(&e))?;
    notify_views(&state, &snapshot).await;
    Ok(Json(snapshot))
}

async fn notify_views(state: &AppState, snapshot: &QueueState) {
    let frame = Frame::request("queue:update", queue::snapshot_data(snapshot));
    queue::broadcast(state, &frame, None).await;
}

fn queue_error_to_status(err: &QueueError) -> StatusCode {
    // Every controller failure today is a storage-side fault.
    tracing::error!(error = %err, "queue mutation failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod tests;
