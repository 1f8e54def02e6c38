#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request};
use filedrop_core::{
    config::WebSocketConfig,
    storage::{InMemoryObjectStore, StorageGateway},
    AppState, NotificationHub,
};

pub const BOUNDARY: &str = "filedrop-test-boundary";

pub fn test_state(max_upload_bytes: usize) -> AppState {
    test_state_with_ws(max_upload_bytes, WebSocketConfig::default())
}

pub fn test_state_with_ws(max_upload_bytes: usize, ws_config: WebSocketConfig) -> AppState {
    let gateway = StorageGateway::new(Arc::new(InMemoryObjectStore::new()), "test-bucket");
    let hub = NotificationHub::new(&ws_config);
    AppState::new(gateway, hub, max_upload_bytes)
}

pub fn multipart_body(field: &str, file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(file_name: &str, content: &[u8]) -> Request<Body> {
    upload_request_with_field("file", file_name, content)
}

pub fn upload_request_with_field(field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/storage/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(field, file_name, content)))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

/// Poll until the hub holds `expected` channels.
pub async fn wait_for_channels(hub: &NotificationHub, expected: usize) {
    for _ in 0..200 {
        if hub.channel_count().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {} channels, found {}",
        expected,
        hub.channel_count().await
    );
}
