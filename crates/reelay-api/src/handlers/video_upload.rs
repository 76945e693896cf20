use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use reelay_core::models::{MediaAssetResponse, MediaKind};
use reelay_core::AppError;

use crate::error::{ErrorResponse, HttpAppError};
use crate::services::upload::receive_upload;
use crate::state::AppState;

/// Upload a video without transcoding. The file is promoted unmodified into
/// durable storage and served via byte-range requests.
#[utoipa::path(
    post,
    path = "/api/v0/videos",
    tag = "videos",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Video uploaded successfully", body = MediaAssetResponse),
        (status = 400, description = "Invalid field name, file count, or upload body", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Not a video", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_video"))]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let policy = state.media.video_policy();
    let mut staged = receive_upload(&state.media.scratch, &policy, multipart).await?;

    let file = staged
        .pop()
        .ok_or_else(|| AppError::Internal("Upload produced no staged file".to_string()))?;

    let filename = file
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .map(String::from)
        .ok_or_else(|| AppError::Internal("Staged file has no name".to_string()))?;

    let data = match tokio::fs::read(&file.path).await {
        Ok(data) => data,
        Err(e) => {
            file.discard().await;
            return Err(AppError::Internal(format!("Failed to read staged video: {}", e)).into());
        }
    };

    let storage_key = format!("videos/{}", filename);
    let upload_result = state
        .media
        .storage
        .upload(&storage_key, &file.content_type, data)
        .await;

    file.discard().await;
    upload_result?;

    tracing::info!(storage_key = %storage_key, "Video published");

    Ok((
        StatusCode::CREATED,
        Json(MediaAssetResponse {
            url: state.video_stream_url(&filename),
            kind: MediaKind::Video,
        }),
    ))
}
