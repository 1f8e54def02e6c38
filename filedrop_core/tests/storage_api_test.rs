mod common;

use axum::http::{header, StatusCode};
use common::*;
use filedrop_core::create_app;
use tower::ServiceExt;

#[tokio::test]
async fn test_upload_list_download_scenario() {
    let state = test_state(1024 * 1024);
    let content: Vec<u8> = (0..1024u32).map(|i| (i % 251) as u8).collect();

    let response = create_app(state.clone())
        .oneshot(upload_request("report.pdf", &content))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("File uploaded successfully: report.pdf"));

    let response = create_app(state.clone())
        .oneshot(get_request("/api/storage/files"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let names: Vec<String> = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(names, vec!["report.pdf".to_string()]);

    let response = create_app(state)
        .oneshot(get_request("/api/storage/download/report.pdf"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/octet-stream"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=report.pdf"
    );
    assert_eq!(body_bytes(response).await, content);
}

#[tokio::test]
async fn test_download_missing_file_returns_404() {
    let response = create_app(test_state(1024))
        .oneshot(get_request("/api/storage/download/missing.txt"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_empty_listing() {
    let response = create_app(test_state(1024))
        .oneshot(get_request("/api/storage/files"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let names: Vec<String> = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(names.is_empty());
}

#[tokio::test]
async fn test_reupload_serves_newest_bytes() {
    let state = test_state(1024);

    for content in [&b"first version"[..], &b"second version"[..]] {
        let response = create_app(state.clone())
            .oneshot(upload_request("notes.txt", content))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = create_app(state.clone())
        .oneshot(get_request("/api/storage/download/notes.txt"))
        .await
        .unwrap();
    assert_eq!(body_bytes(response).await, b"second version");

    let response = create_app(state)
        .oneshot(get_request("/api/storage/files"))
        .await
        .unwrap();
    let names: Vec<String> = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(names, vec!["notes.txt".to_string()]);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected_before_storage() {
    let state = test_state(16);

    let response = create_app(state.clone())
        .oneshot(upload_request("big.bin", &[7u8; 100]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let names = state.transfer_service.list_files().await.unwrap();
    assert!(names.is_empty());
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let response = create_app(test_state(1024))
        .oneshot(upload_request_with_field("attachment", "a.txt", b"data"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_with_invalid_name() {
    let response = create_app(test_state(1024))
        .oneshot(upload_request("..", b"data"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_strips_client_path() {
    let state = test_state(1024);

    let response = create_app(state.clone())
        .oneshot(upload_request("C:\\Users\\me\\photo.png", b"png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert_eq!(body, "File uploaded successfully: photo.png");
}

#[tokio::test]
async fn test_download_percent_encoded_name() {
    let state = test_state(1024);

    create_app(state.clone())
        .oneshot(upload_request("my report.txt", b"spaces"))
        .await
        .unwrap();

    let response = create_app(state)
        .oneshot(get_request("/api/storage/download/my%20report.txt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"spaces");
}

#[tokio::test]
async fn test_health_reports_storage() {
    let response = create_app(test_state(1024))
        .oneshot(get_request("/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["storage_backend"], "memory");
    assert_eq!(body["data"]["bucket"], "test-bucket");
    assert_eq!(body["data"]["storage_status"], "healthy");
    assert_eq!(body["data"]["open_channels"], 0);
}
