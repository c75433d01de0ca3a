//! Cross-context sync listener.
//!
//! DESIGN
//! ======
//! A background task subscribes to the store's change bus and applies writes
//! performed by other contexts: the record is replaced wholesale, last writer
//! wins, with no merge and no `last_updated` comparison. The writing context
//! never observes its own notification — it already holds the new record.
//!
//! ERROR HANDLING
//! ==============
//! Notifications with an absent or unparsable payload are skipped without
//! surfacing an error: removal events legitimately carry nothing, and a
//! malformed payload must not take the display down mid-shift.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::frame::Frame;
use crate::services::queue;
use crate::state::{AppState, QueueState};
use crate::store::{QUEUE_STATE_KEY, StateStore, StoreEvent};

/// Spawn the sync listener. Returns a handle for shutdown; the subscription
/// is released when the task ends.
pub fn spawn_sync_listener(state: AppState) -> JoinHandle<()> {
    let mut events = state.store.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => apply_store_event(&state, &event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "sync listener lagged behind the change bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Apply one change notification. Foreign writes to the queue key replace
/// the local record and are pushed to every connected view; everything else
/// is skipped.
pub(crate) async fn apply_store_event(state: &AppState, event: &StoreEvent) {
    if event.origin == state.store.origin() {
        // The writer does not receive its own notification.
        return;
    }
    if event.key != QUEUE_STATE_KEY {
        return;
    }
    let Some(raw) = event.new_value.as_deref() else {
        // Key removal carries nothing to apply.
        return;
    };
    let incoming: QueueState = match serde_json::from_str(raw) {
        Ok(incoming) => incoming,
        Err(e) => {
            debug!(error = %e, "ignoring unparsable queue state notification");
            return;
        }
    };

    {
        let mut queue = state.queue.write().await;
        *queue = incoming.clone();
    }
    info!(current = incoming.current_number, "queue state replaced from peer context");

    let frame = Frame::request("queue:update", queue::snapshot_data(&incoming));
    queue::broadcast(state, &frame, None).await;
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
