//! Upload, list, and download endpoints under `/api/storage`.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::BytesMut;
use tracing::info;

use crate::{
    error::{AppError, Result},
    AppState,
};

const FILE_FIELD: &str = "file";

pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let service = &state.transfer_service;
    let max_size = service.max_upload_bytes();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, 0, max_size))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let name = field
            .file_name()
            .map(base_name)
            .ok_or_else(|| AppError::BadRequest("Missing filename".to_string()))?;

        let mut data = BytesMut::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| multipart_error(e, data.len(), max_size))?
        {
            data.extend_from_slice(&chunk);
            service.check_size(data.len())?;
        }

        info!("POST /api/storage/upload - name: {}, size: {}", name, data.len());

        let receipt = service.upload(&name, data.freeze()).await?;
        return Ok((StatusCode::OK, receipt.message()));
    }

    Err(AppError::BadRequest("No file found in request".to_string()))
}

pub async fn download_file(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response> {
    info!("GET /api/storage/download/{}", file_name);

    let data = state.transfer_service.download_file(&file_name).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(data.len()));

    let disposition = HeaderValue::from_str(&format!("attachment; filename={}", file_name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok((StatusCode::OK, headers, data).into_response())
}

pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let names = state.transfer_service.list_files().await?;
    info!("GET /api/storage/files - {} files", names.len());
    Ok(Json(names))
}

fn multipart_error(err: MultipartError, received: usize, max_size: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge {
            size: received as u64,
            max_size: max_size as u64,
        }
    } else {
        AppError::BadRequest(format!("Failed to read multipart data: {}", err.body_text()))
    }
}

/// Browsers on some platforms send the full client-side path.
fn base_name(file_name: &str) -> String {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .to_string()
}
