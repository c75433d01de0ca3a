//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the queue API, the websocket endpoint, and the static
//! view pages under a single Axum router. The Display and Operator pages are
//! served as plain files at `/`; everything dynamic lives under `/api`.

pub mod queue;
pub mod ws;

use std::path::PathBuf;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let site = ServeDir::new(site_dir()).append_index_html_on_directories(true);

    Router::new()
        .route("/api/queue", get(queue::get_queue).patch(queue::patch_queue))
        .route("/api/queue/advance", post(queue::advance_queue))
        .route("/api/queue/rewind", post(queue::rewind_queue))
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(cors)
        .with_state(state)
        .fallback_service(site)
}

/// Resolve the directory holding the Display and Operator pages.
fn site_dir() -> PathBuf {
    std::env::var("LOKET_SITE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("site"))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
