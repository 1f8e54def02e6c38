use axum::{
    extract::{ws::{WebSocket, WebSocketUpgrade}, Path, State},
    response::Response,
};
use tokio::sync::OwnedSemaphorePermit;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::websocket::manager::NotificationHub;
use crate::AppState;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let hub = state.notification_hub.clone();

    let Some(slot) = hub.try_reserve_slot() else {
        warn!(session_id = %session_id, "Rejecting WebSocket connection, limit reached");
        return Err(AppError::ServiceUnavailable(
            "Too many open notification channels".to_string(),
        ));
    };

    info!(session_id = %session_id, "WebSocket connection request received");
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, hub, session_id, slot)))
}

async fn handle_socket(
    socket: WebSocket,
    hub: NotificationHub,
    session_id: String,
    _slot: OwnedSemaphorePermit,
) {
    info!(session_id = %session_id, "WebSocket connection established");

    if let Err(e) = hub.handle_connection(socket, session_id.clone()).await {
        warn!("WebSocket connection error: {}", e);
    }

    info!(session_id = %session_id, "WebSocket connection closed");
}
