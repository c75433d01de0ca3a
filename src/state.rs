//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the single queue record behind an async lock, the durable store
//! handle, and the set of connected view pages. Views never touch the record
//! directly — they read snapshots and request patches through the queue
//! service.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::frame::Frame;
use crate::store::StateStore;

// =============================================================================
// QUEUE RECORD
// =============================================================================

/// Announcement shown until an operator saves their own text.
pub const DEFAULT_MARQUEE: &str = "Selamat Datang di Kantor Kami. Silakan ambil \
nomor antrian dan tunggu panggilan petugas kami. Terima kasih.";

/// The shared record: one instance per deployment, mirrored to durable
/// storage on every mutation. Serialized with camelCase keys — the persisted
/// layout other tooling reads.
///
/// `current_number` and `next_number` stay non-negative in normal operation,
/// but the model does not enforce it; the rewind helper is the only clamped
/// path. `last_updated` is informational — it is stamped on every mutation
/// and never compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueState {
    pub current_number: i64,
    pub next_number: i64,
    pub marquee_text: String,
    /// Milliseconds since Unix epoch at the last mutation.
    pub last_updated: i64,
}

impl QueueState {
    /// The record a fresh deployment starts from.
    #[must_use]
    pub fn initial(ts: i64) -> Self {
        Self {
            current_number: 1,
            next_number: 2,
            marquee_text: DEFAULT_MARQUEE.to_owned(),
            last_updated: ts,
        }
    }

    /// Produce a copy with the patch's fields overwritten and `last_updated`
    /// stamped to `ts`. Absent fields are untouched. A patch may carry
    /// `lastUpdated` (the full field set is patchable on the wire) but the
    /// stamp unconditionally wins.
    #[must_use]
    pub fn merged(&self, patch: &QueuePatch, ts: i64) -> Self {
        let mut next = self.clone();
        if let Some(n) = patch.current_number {
            next.current_number = n;
        }
        if let Some(n) = patch.next_number {
            next.next_number = n;
        }
        if let Some(text) = &patch.marquee_text {
            next.marquee_text = text.clone();
        }
        next.last_updated = ts;
        next
    }
}

/// A partial set of field updates, applied atomically by the queue service.
/// Values are not validated — call sites clamp where they need to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueuePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marquee_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum — all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    /// Durable storage for the queue record.
    pub store: Arc<dyn StateStore>,
    /// The live record. Mutated only by the queue service.
    pub queue: Arc<RwLock<QueueState>>,
    /// Connected views: `client_id` -> sender for outgoing frames.
    pub clients: Arc<RwLock<HashMap<Uuid, mpsc::Sender<Frame>>>>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>, queue: QueueState) -> Self {
        Self {
            store,
            queue: Arc::new(RwLock::new(queue)),
            clients: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
