use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use reelay_core::models::{HlsUploadResponse, MediaKind};
use reelay_core::AppError;

use crate::error::{ErrorResponse, HttpAppError};
use crate::services::upload::receive_upload;
use crate::state::AppState;

/// Upload a video for HLS transcoding.
///
/// The request returns as soon as the job is recorded and queued; the
/// transcode itself runs on the background worker. `url` points at the
/// eventual master playlist and becomes valid once polling reports `success`.
#[utoipa::path(
    post,
    path = "/api/v0/videos/hls",
    tag = "videos",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 202, description = "Video accepted for transcoding", body = HlsUploadResponse),
        (status = 400, description = "Invalid field name, file count, or upload body", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Not a video", body = ErrorResponse),
        (status = 503, description = "Encode queue is full", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_video_hls"))]
pub async fn upload_video_hls(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let policy = state.media.video_policy();
    let mut staged = receive_upload(&state.media.scratch, &policy, multipart).await?;

    let file = staged
        .pop()
        .ok_or_else(|| AppError::Internal("Upload produced no staged file".to_string()))?;

    let job_id = state.encode.queue.enqueue(file).await?;
    let url = state.hls_master_url(&job_id);

    Ok((
        StatusCode::ACCEPTED,
        Json(HlsUploadResponse {
            url,
            kind: MediaKind::Hls,
            job_id,
        }),
    ))
}
