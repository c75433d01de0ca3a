//! Queue service — the single authority over the shared record.
//!
//! DESIGN
//! ======
//! Every mutation funnels through `apply_patch`: merge the patch into the
//! record under the lock, stamp `last_updated`, then synchronously mirror the
//! whole record to durable storage. `advance` and `rewind` are read-then-patch
//! conveniences built on top of it, not separate primitives.
//!
//! ERROR HANDLING
//! ==============
//! Values are never validated — a caller can drive `current_number` negative
//! through a direct patch and the service writes it. Storage failures
//! propagate to the mutating caller unretried; the in-memory record already
//! holds the new value by then, since the order is mutate, then persist.

use tracing::info;
use uuid::Uuid;

use crate::frame::{Data, ErrorCode, Frame, now_ms};
use crate::state::{AppState, QueuePatch, QueueState};
use crate::store::{QUEUE_STATE_KEY, StateStore, StoreError};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("queue state encoding failed: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("stored queue state is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
}

impl ErrorCode for QueueError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Store(_) => "E_STORE",
            Self::Encode(_) => "E_ENCODE",
            Self::Corrupt(_) => "E_STATE_CORRUPT",
        }
    }
}

// =============================================================================
// MUTATIONS
// =============================================================================

/// Apply a merge patch to the record and persist the result.
///
/// Atomic from the perspective of a single context: no partial patch is ever
/// visible. Returns the post-mutation snapshot.
///
/// # Errors
///
/// Returns an error if serializing or writing the record fails.
pub async fn apply_patch(state: &AppState, patch: &QueuePatch) -> Result<QueueState, QueueError> {
    let snapshot = {
        let mut queue = state.queue.write().await;
        *queue = queue.merged(patch, now_ms());
        queue.clone()
    };
    save(state.store.as_ref(), &snapshot).await?;
    Ok(snapshot)
}

/// Call the next number: `{current: c+1, next: c+2}` from the pre-patch `c`.
///
/// # Errors
///
/// Returns an error if persisting the patched record fails.
pub async fn advance(state: &AppState) -> Result<QueueState, QueueError> {
    let current = state.queue.read().await.current_number;
    let patch = QueuePatch {
        current_number: Some(current + 1),
        next_number: Some(current + 2),
        ..QueuePatch::default()
    };
    apply_patch(state, &patch).await
}

/// Step back one number, clamped at zero: `{current: max(0, c-1), next: c}`.
///
/// # Errors
///
/// Returns an error if persisting the patched record fails.
pub async fn rewind(state: &AppState) -> Result<QueueState, QueueError> {
    let current = state.queue.read().await.current_number;
    let patch = QueuePatch {
        current_number: Some((current - 1).max(0)),
        next_number: Some(current),
        ..QueuePatch::default()
    };
    apply_patch(state, &patch).await
}

// =============================================================================
// PERSISTENCE
// =============================================================================

async fn save(store: &dyn StateStore, snapshot: &QueueState) -> Result<(), QueueError> {
    let raw = serde_json::to_string(snapshot).map_err(QueueError::Encode)?;
    store.write_key(QUEUE_STATE_KEY, &raw).await?;
    Ok(())
}

/// Load the persisted record at startup. An absent key yields the default
/// record, which is persisted immediately so a sibling context hydrates the
/// same numbers. A present-but-corrupt value is a startup fault — the caller
/// surfaces it instead of silently resetting the queue.
///
/// # Errors
///
/// Returns `Corrupt` if the stored value does not deserialize, or a storage
/// error if reading or seeding fails.
pub async fn load_or_default(store: &dyn StateStore) -> Result<QueueState, QueueError> {
    match store.read_key(QUEUE_STATE_KEY).await? {
        Some(raw) => serde_json::from_str(&raw).map_err(QueueError::Corrupt),
        None => {
            let initial = QueueState::initial(now_ms());
            save(store, &initial).await?;
            info!(current = initial.current_number, "seeded default queue state");
            Ok(initial)
        }
    }
}

// =============================================================================
// BROADCAST
// =============================================================================

/// Broadcast a frame to all connected views, optionally excluding one.
pub async fn broadcast(state: &AppState, frame: &Frame, exclude: Option<Uuid>) {
    let clients = state.clients.read().await;
    for (client_id, tx) in clients.iter() {
        if exclude == Some(*client_id) {
            continue;
        }
        // Best-effort: if a view's channel is full, skip it.
        let _ = tx.try_send(frame.clone());
    }
}

/// Flatten a snapshot into frame data (camelCase keys, full record).
#[must_use]
pub fn snapshot_data(snapshot: &QueueState) -> Data {
    let mut data = Data::new();
    data.insert("currentNumber".into(), serde_json::json!(snapshot.current_number));
    data.insert("nextNumber".into(), serde_json::json!(snapshot.next_number));
    data.insert("marqueeText".into(), serde_json::json!(snapshot.marquee_text));
    data.insert("lastUpdated".into(), serde_json::json!(snapshot.last_updated));
    data
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod tests;
