//! Route table

use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    handlers::{health, storage},
    websocket::websocket_handler,
    AppState,
};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::handle_health))
        .route("/api/storage/upload", post(storage::upload_file))
        .route("/api/storage/download/:file_name", get(storage::download_file))
        .route("/api/storage/files", get(storage::list_files))
        .route("/ws/:session_id", get(websocket_handler))
}
