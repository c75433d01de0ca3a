//! Durable key-value storage and its change-notification bus.
//!
//! DESIGN
//! ======
//! The queue record lives under one fixed key. The storage substrate is
//! deliberately narrow — read a key, write a key, remove a key, subscribe to
//! change notifications — so anything offering those operations can sit
//! behind `StateStore`. `FileStore` (one JSON file per key under a data
//! directory) is the kiosk deployment substrate; `MemoryStore` backs tests.
//!
//! Notifications mirror the contract of browser storage events: every write
//! is published on a shared bus tagged with the writing context's identity,
//! and listeners are expected to skip their own context's writes. Sibling
//! handles created with `context()` share data and bus but carry their own
//! identity, modeling another execution context on the same storage.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

/// The fixed key the queue record is persisted under.
pub const QUEUE_STATE_KEY: &str = "queue_system_state";

/// Capacity of the change-notification bus. Writes are rare (one per
/// operator action), so a small buffer is plenty before a listener lags.
const EVENT_BUS_CAPACITY: usize = 64;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
}

/// A change notification for one key.
#[derive(Debug, Clone)]
pub struct StoreEvent {
    pub key: String,
    /// The serialized value after the change; `None` when the key was removed.
    pub new_value: Option<String>,
    /// Identity of the context that performed the write.
    pub origin: Uuid,
}

/// The platform boundary: durable same-storage key-value access plus
/// change notifications from every context sharing the storage.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn read_key(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn write_key(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn remove_key(&self, key: &str) -> Result<(), StoreError>;

    /// Subscribe to change notifications. Events carry the writing context's
    /// identity so subscribers can ignore their own writes.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;

    /// Identity of this handle's execution context.
    fn origin(&self) -> Uuid;
}

// =============================================================================
// FILE STORE
// =============================================================================

/// File-backed store: one JSON file per key under a data directory.
pub struct FileStore {
    dir: PathBuf,
    bus: broadcast::Sender<StoreEvent>,
    origin: Uuid,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        let (bus, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Ok(Self { dir, bus, origin: Uuid::new_v4() })
    }

    /// Create a sibling handle on the same directory and change bus with its
    /// own context identity.
    #[must_use]
    pub fn context(&self) -> Self {
        Self { dir: self.dir.clone(), bus: self.bus.clone(), origin: Uuid::new_v4() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn notify(&self, key: &str, new_value: Option<String>) {
        // No subscribers is fine — send only fails when nobody listens.
        let _ = self.bus.send(StoreEvent { key: key.to_owned(), new_value, origin: self.origin });
    }
}

#[async_trait]
impl StateStore for FileStore {
    async fn read_key(&self, key: &str) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(self.key_path(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_key(&self, key: &str, value: &str) -> Result<(), StoreError> {
        tokio::fs::write(self.key_path(key), value).await?;
        self.notify(key, Some(value.to_owned()));
        Ok(())
    }

    async fn remove_key(&self, key: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.key_path(key)).await {
            Ok(()) => {
                self.notify(key, None);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.bus.subscribe()
    }

    fn origin(&self) -> Uuid {
        self.origin
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-memory store with the same notification contract. Used by tests.
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
    bus: broadcast::Sender<StoreEvent>,
    origin: Uuid,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        let (bus, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self { entries: Arc::new(RwLock::new(HashMap::new())), bus, origin: Uuid::new_v4() }
    }

    /// Create a sibling handle on the same entries and change bus with its
    /// own context identity.
    #[must_use]
    pub fn context(&self) -> Self {
        Self { entries: Arc::clone(&self.entries), bus: self.bus.clone(), origin: Uuid::new_v4() }
    }

    fn notify(&self, key: &str, new_value: Option<String>) {
        let _ = self.bus.send(StoreEvent { key: key.to_owned(), new_value, origin: self.origin });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn read_key(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn write_key(&self, key: &str, value: &str) -> Result<(), StoreError> {
        {
            let mut entries = self.entries.write().await;
            entries.insert(key.to_owned(), value.to_owned());
        }
        self.notify(key, Some(value.to_owned()));
        Ok(())
    }

    async fn remove_key(&self, key: &str) -> Result<(), StoreError> {
        let removed = {
            let mut entries = self.entries.write().await;
            entries.remove(key)
        };
        if removed.is_some() {
            self.notify(key, None);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.bus.subscribe()
    }

    fn origin(&self) -> Uuid {
        self.origin
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
