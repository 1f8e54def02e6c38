//! Core library for the file drop server: object storage, upload
//! notifications over WebSockets, and the HTTP routes tying them together.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod storage;
pub mod websocket;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use handlers::routes::create_routes;
pub use services::{FileTransferService, UploadReceipt};
pub use storage::{create_gateway, ObjectStore, StorageError, StorageGateway};
pub use websocket::{websocket_handler, NotificationEvent, NotificationHub};

use axum::{extract::DefaultBodyLimit, Router};
use std::net::SocketAddr;
use tokio::signal;
use tower_http::services::ServeDir;
use tracing::info;

/// Headroom for multipart boundaries and part headers on top of the file bound.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub transfer_service: FileTransferService,
    pub notification_hub: NotificationHub,
}

impl AppState {
    pub fn new(gateway: StorageGateway, notification_hub: NotificationHub, max_upload_bytes: usize) -> Self {
        let transfer_service =
            FileTransferService::new(gateway, notification_hub.clone(), max_upload_bytes);

        Self {
            app_name: "File Drop Server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            transfer_service,
            notification_hub,
        }
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let gateway = create_gateway(&config.storage).await?;
        let hub = NotificationHub::new(&config.websocket);
        Ok(Self::new(gateway, hub, config.storage.max_file_size_bytes()))
    }
}

pub fn create_app(state: AppState) -> Router {
    create_app_with_config(state, &AppConfig::default())
}

pub fn create_app_with_config(state: AppState, config: &AppConfig) -> Router {
    let body_limit = state
        .transfer_service
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .merge(create_routes())
        .fallback_service(ServeDir::new(&config.server.static_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::cors::cors_layer_from_config(&config.cors))
        .layer(middleware::logging::logging_layer())
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
