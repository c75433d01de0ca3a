use super::*;

// =============================================================================
// FileStore
// =============================================================================

#[tokio::test]
async fn file_store_missing_key_reads_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();

    assert!(store.read_key(QUEUE_STATE_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn file_store_write_then_read_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();

    store.write_key(QUEUE_STATE_KEY, r#"{"currentNumber":3}"#).await.unwrap();
    let raw = store.read_key(QUEUE_STATE_KEY).await.unwrap();

    assert_eq!(raw.as_deref(), Some(r#"{"currentNumber":3}"#));
}

#[tokio::test]
async fn file_store_remove_key_deletes() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();

    store.write_key(QUEUE_STATE_KEY, "{}").await.unwrap();
    store.remove_key(QUEUE_STATE_KEY).await.unwrap();

    assert!(store.read_key(QUEUE_STATE_KEY).await.unwrap().is_none());
    // Removing an absent key is not an error.
    store.remove_key(QUEUE_STATE_KEY).await.unwrap();
}

#[tokio::test]
async fn file_store_write_notifies_subscribers() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();
    let mut events = store.subscribe();

    store.write_key(QUEUE_STATE_KEY, "{}").await.unwrap();

    let event = events.try_recv().unwrap();
    assert_eq!(event.key, QUEUE_STATE_KEY);
    assert_eq!(event.new_value.as_deref(), Some("{}"));
    assert_eq!(event.origin, store.origin());
}

#[tokio::test]
async fn file_store_sibling_context_shares_storage_and_bus() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();
    let peer = store.context();
    let mut events = store.subscribe();

    peer.write_key(QUEUE_STATE_KEY, "{}").await.unwrap();

    // The peer's write lands in shared storage...
    assert_eq!(store.read_key(QUEUE_STATE_KEY).await.unwrap().as_deref(), Some("{}"));
    // ...and on the shared bus, tagged with the peer's own identity.
    let event = events.try_recv().unwrap();
    assert_eq!(event.origin, peer.origin());
    assert_ne!(event.origin, store.origin());
}

// =============================================================================
// MemoryStore
// =============================================================================

#[tokio::test]
async fn memory_store_write_then_read_round_trips() {
    let store = MemoryStore::new();

    assert!(store.read_key(QUEUE_STATE_KEY).await.unwrap().is_none());
    store.write_key(QUEUE_STATE_KEY, "abc").await.unwrap();
    assert_eq!(store.read_key(QUEUE_STATE_KEY).await.unwrap().as_deref(), Some("abc"));
}

#[tokio::test]
async fn memory_store_remove_key_notifies_with_empty_value() {
    let store = MemoryStore::new();
    store.write_key(QUEUE_STATE_KEY, "abc").await.unwrap();

    let mut events = store.subscribe();
    store.remove_key(QUEUE_STATE_KEY).await.unwrap();

    let event = events.try_recv().unwrap();
    assert_eq!(event.key, QUEUE_STATE_KEY);
    assert!(event.new_value.is_none());
    assert!(store.read_key(QUEUE_STATE_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn memory_store_remove_absent_key_emits_nothing() {
    let store = MemoryStore::new();
    let mut events = store.subscribe();

    store.remove_key("some_other_key").await.unwrap();

    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn memory_store_sibling_context_shares_entries() {
    let store = MemoryStore::new();
    let peer = store.context();
    let mut events = store.subscribe();

    peer.write_key(QUEUE_STATE_KEY, "shared").await.unwrap();

    assert_eq!(store.read_key(QUEUE_STATE_KEY).await.unwrap().as_deref(), Some("shared"));
    let event = events.try_recv().unwrap();
    assert_eq!(event.origin, peer.origin());
    assert_ne!(event.origin, store.origin());
}
