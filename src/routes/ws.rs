//! WebSocket handler — view connections and frame dispatch.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID and enters a `select!` loop:
//! - Incoming view frames → parse + dispatch by op prefix
//! - Pushed frames from peer mutations → forward to the view
//!
//! Handler functions are pure business logic — they validate, mutate state,
//! and return an `Outcome`. The dispatch layer owns all outbound concerns:
//! reply to sender and push to peers.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → register client → send `session:connected` with the snapshot
//! 2. View sends frames → dispatch → handler returns Outcome
//! 3. Dispatch applies Outcome (reply / push to peers)
//! 4. Close → deregister

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::frame::{Data, FRAME_CODE, FRAME_MESSAGE, Frame, Status};
use crate::services::queue;
use crate::state::{AppState, QueuePatch};

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. The dispatch layer uses this to
/// decide who receives what — handlers never send frames directly.
enum Outcome {
    /// Reply done+data to the sender and push the new record to every peer
    /// as a `queue:update` request. The sender is excluded: the writer does
    /// not receive its own notification.
    Broadcast(Data),
    /// Send done+data to the sender only.
    Reply(Data),
}

// =============================================================================
// CONNECTION
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for receiving pushed frames from peers.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(64);
    {
        let mut clients = state.clients.write().await;
        clients.insert(client_id, client_tx);
    }

    // Greet with the client id and the current record so views render
    // without a round trip.
    let snapshot = state.queue.read().await.clone();
    let welcome = Frame::request("session:connected", queue::snapshot_data(&snapshot))
        .with_data("clientId", client_id.to_string());
    if send_frame(&mut socket, &welcome).await.is_err() {
        deregister(&state, client_id).await;
        return;
    }

    info!(%client_id, "ws: view connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        for frame in process_inbound_text(&state, client_id, &text).await {
                            let _ = send_frame(&mut socket, &frame).await;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    deregister(&state, client_id).await;
    info!(%client_id, "ws: view disconnected");
}

async fn deregister(state: &AppState, client_id: Uuid) {
    let mut clients = state.clients.write().await;
    clients.remove(&client_id);
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame and return frames for the
/// sender. Split from the socket loop so dispatch is testable without a
/// transport.
async fn process_inbound_text(state: &AppState, client_id: Uuid, text: &str) -> Vec<Frame> {
    let req: Frame = match serde_json::from_str(text) {
        Ok(req) => req,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame");
            let err = Frame::request("session:error", Data::new())
                .with_data(FRAME_MESSAGE, format!("invalid json: {e}"));
            return vec![err];
        }
    };

    info!(%client_id, id = %req.id, op = %req.op, "ws: recv frame");

    let result = match req.prefix() {
        "queue" => handle_queue(state, &req).await,
        prefix => Err(req.error(format!("unknown prefix: {prefix}"))),
    };

    // Apply outcome — the dispatch layer owns all outbound logic.
    match result {
        Ok(Outcome::Broadcast(data)) => {
            let sender_frame = req.done(data.clone());
            // Peers see the mutation as a server push, not as the sender's
            // correlated reply.
            let push = Frame::request("queue:update", data);
            queue::broadcast(state, &push, Some(client_id)).await;
            vec![sender_frame]
        }
        Ok(Outcome::Reply(data)) => vec![req.done(data)],
        Err(err_frame) => vec![err_frame],
    }
}

// =============================================================================
// QUEUE HANDLERS
// =============================================================================

async fn handle_queue(state: &AppState, req: &Frame) -> Result<Outcome, Frame> {
    let op = req.op.split_once(':').map_or("", |(_, op)| op);

    match op {
        "get" => {
            let snapshot = state.queue.read().await.clone();
            Ok(Outcome::Reply(queue::snapshot_data(&snapshot)))
        }
        "patch" => {
            let patch: QueuePatch = match serde_json::to_value(&req.data)
                .and_then(serde_json::from_value)
            {
                Ok(patch) => patch,
                Err(e) => return Err(req.error(format!("invalid patch: {e}"))),
            };
            match queue::apply_patch(state, &patch).await {
                Ok(snapshot) => Ok(Outcome::Broadcast(queue::snapshot_data(&snapshot))),
                Err(e) => Err(req.error_from(&e)),
            }
        }
        "advance" => match queue::advance(state).await {
            Ok(snapshot) => Ok(Outcome::Broadcast(queue::snapshot_data(&snapshot))),
            Err(e) => Err(req.error_from(&e)),
        },
        "rewind" => match queue::rewind(state).await {
            Ok(snapshot) => Ok(Outcome::Broadcast(queue::snapshot_data(&snapshot))),
            Err(e) => Err(req.error_from(&e)),
        },
        _ => Err(req.error(format!("unknown queue op: {op}"))),
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    if frame.status == Status::Error {
        let code = frame.data.get(FRAME_CODE).and_then(|v| v.as_str()).unwrap_or("-");
        let message = frame.data.get(FRAME_MESSAGE).and_then(|v| v.as_str()).unwrap_or("-");
        warn!(id = %frame.id, op = %frame.op, code, message, "ws: send frame status=Error");
    } else {
        info!(id = %frame.id, op = %frame.op, status = ?frame.status, "ws: send frame");
    }
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
