//! Health check handler

use axum::{extract::State, response::IntoResponse, Json};
use tracing::{info, warn};

use crate::{models::ApiResponse, AppState};

pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /health");

    let gateway = state.transfer_service.gateway();
    let mut health_info = serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().timestamp(),
        "app": state.app_name,
        "version": state.version,
        "bucket": gateway.bucket(),
        "storage_backend": gateway.backend_name(),
        "open_channels": state.notification_hub.channel_count().await,
    });

    match gateway.list_names().await {
        Ok(names) => {
            health_info["storage_status"] = serde_json::Value::String("healthy".to_string());
            health_info["stored_files"] = serde_json::Value::from(names.len());
        }
        Err(e) => {
            warn!("Storage health check failed: {}", e);
            health_info["status"] = serde_json::Value::String("degraded".to_string());
            health_info["storage_status"] = serde_json::Value::String("unhealthy".to_string());
            health_info["storage_error"] = serde_json::Value::String(e.to_string());
        }
    }

    Json(ApiResponse::success(health_info))
}
