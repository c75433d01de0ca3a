use super::*;
use crate::state::test_helpers;
use tokio::time::{Duration, timeout};
use uuid::Uuid;

fn foreign_event(key: &str, new_value: Option<&str>) -> StoreEvent {
    StoreEvent {
        key: key.to_owned(),
        new_value: new_value.map(str::to_owned),
        origin: Uuid::new_v4(),
    }
}

fn incoming_record() -> QueueState {
    QueueState {
        current_number: 88,
        next_number: 89,
        marquee_text: "Ditulis oleh konteks lain.".into(),
        last_updated: 7_777,
    }
}

// =============================================================================
// apply_store_event
// =============================================================================

#[tokio::test]
async fn foreign_write_replaces_record_wholesale() {
    let state = test_helpers::test_app_state();
    let incoming = incoming_record();
    let raw = serde_json::to_string(&incoming).unwrap();

    apply_store_event(&state, &foreign_event(QUEUE_STATE_KEY, Some(&raw))).await;

    // Exact replacement: no merge, no re-stamp of last_updated.
    assert_eq!(*state.queue.read().await, incoming);
}

#[tokio::test]
async fn own_write_is_not_observed() {
    let state = test_helpers::test_app_state();
    let before = state.queue.read().await.clone();
    let raw = serde_json::to_string(&incoming_record()).unwrap();

    let event = StoreEvent {
        key: QUEUE_STATE_KEY.to_owned(),
        new_value: Some(raw),
        origin: state.store.origin(),
    };
    apply_store_event(&state, &event).await;

    assert_eq!(*state.queue.read().await, before);
}

#[tokio::test]
async fn unrelated_key_is_ignored() {
    let state = test_helpers::test_app_state();
    let before = state.queue.read().await.clone();
    let raw = serde_json::to_string(&incoming_record()).unwrap();

    apply_store_event(&state, &foreign_event("some_other_key", Some(&raw))).await;

    assert_eq!(*state.queue.read().await, before);
}

#[tokio::test]
async fn absent_payload_is_ignored() {
    let state = test_helpers::test_app_state();
    let before = state.queue.read().await.clone();

    apply_store_event(&state, &foreign_event(QUEUE_STATE_KEY, None)).await;

    assert_eq!(*state.queue.read().await, before);
}

#[tokio::test]
async fn malformed_payload_is_ignored() {
    let state = test_helpers::test_app_state();
    let before = state.queue.read().await.clone();

    apply_store_event(&state, &foreign_event(QUEUE_STATE_KEY, Some("{{{not json"))).await;

    assert_eq!(*state.queue.read().await, before);
}

#[tokio::test]
async fn applied_record_is_pushed_to_views() {
    let state = test_helpers::test_app_state();
    let mut view_rx = test_helpers::attach_client(&state, Uuid::new_v4()).await;
    let incoming = incoming_record();
    let raw = serde_json::to_string(&incoming).unwrap();

    apply_store_event(&state, &foreign_event(QUEUE_STATE_KEY, Some(&raw))).await;

    let push = view_rx.try_recv().unwrap();
    assert_eq!(push.op, "queue:update");
    assert_eq!(
        push.data.get("currentNumber").and_then(serde_json::Value::as_i64),
        Some(incoming.current_number)
    );
}

// =============================================================================
// spawned listener
// =============================================================================

#[tokio::test]
async fn listener_applies_peer_context_writes() {
    let (state, peer) = test_helpers::test_app_state_with_peer();
    let listener = spawn_sync_listener(state.clone());

    let incoming = incoming_record();
    let raw = serde_json::to_string(&incoming).unwrap();
    peer.write_key(QUEUE_STATE_KEY, &raw).await.unwrap();

    timeout(Duration::from_millis(500), async {
        loop {
            if *state.queue.read().await == incoming {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("listener should apply the peer write");

    listener.abort();
}
