use std::sync::Arc;

use loket::routes;
use loket::services;
use loket::state::AppState;
use loket::store::{FileStore, StateStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");
    let data_dir = std::env::var("LOKET_DATA_DIR").unwrap_or_else(|_| "data".into());

    let file_store = FileStore::new(&data_dir).expect("data directory init failed");
    let store: Arc<dyn StateStore> = Arc::new(file_store);

    // A corrupt state file is a startup fault: fix or remove it rather than
    // serving silently reset numbers to a hall full of people.
    let queue = services::queue::load_or_default(store.as_ref())
        .await
        .expect("queue state load failed");

    let state = AppState::new(store, queue);

    // Picks up writes from sibling contexts on the same storage.
    let _sync = services::sync::spawn_sync_listener(state.clone());

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, %data_dir, "loket listening");
    axum::serve(listener, app).await.expect("server failed");
}
