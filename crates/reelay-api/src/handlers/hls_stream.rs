//! HLS asset streaming: master playlist, variant playlists, and segments are
//! served as static binary resources from the job's output directory.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use reelay_core::models::EncodeJobState;
use reelay_storage::{ByteStream, StorageError};

use crate::error::ErrorResponse;
use crate::handlers::is_safe_path_component;
use crate::state::AppState;

const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
const SEGMENT_CONTENT_TYPE: &str = "video/mp2t";

#[utoipa::path(
    get,
    path = "/api/v0/videos/{job_id}/stream/master.m3u8",
    tag = "videos",
    params(
        ("job_id" = String, Path, description = "Encode job ID")
    ),
    responses(
        (status = 200, description = "HLS master playlist", content_type = "application/vnd.apple.mpegurl"),
        (status = 404, description = "Job unknown, still processing, or failed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn stream_master_playlist(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    if !is_safe_path_component(&job_id) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid job id", "BAD_REQUEST")),
        ));
    }

    // A known job that has not finished yet gets a clearer message than a
    // bare missing-file 404.
    if let Ok(Some(job)) = state.encode.store.get(&job_id).await {
        if job.state != EncodeJobState::Success {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(
                    "Video is still processing or failed",
                    "PROCESSING_INCOMPLETE",
                )),
            ));
        }
    }

    let playlist_key = format!("hls/{}/master.m3u8", job_id);
    let stream = open_asset(&state, &playlist_key, "Playlist not found").await?;

    build_stream_response(stream, PLAYLIST_CONTENT_TYPE)
}

#[utoipa::path(
    get,
    path = "/api/v0/videos/{job_id}/stream/{variant}/index.m3u8",
    tag = "videos",
    params(
        ("job_id" = String, Path, description = "Encode job ID"),
        ("variant" = String, Path, description = "Quality variant (e.g., 360p, 720p)")
    ),
    responses(
        (status = 200, description = "HLS variant playlist", content_type = "application/vnd.apple.mpegurl"),
        (status = 404, description = "Variant not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn stream_variant_playlist(
    State(state): State<Arc<AppState>>,
    Path((job_id, variant)): Path<(String, String)>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    if !is_safe_path_component(&job_id) || !is_safe_path_component(&variant) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid playlist path", "BAD_REQUEST")),
        ));
    }

    let playlist_key = format!("hls/{}/{}/index.m3u8", job_id, variant);
    let stream = open_asset(&state, &playlist_key, "Variant not found").await?;

    build_stream_response(stream, PLAYLIST_CONTENT_TYPE)
}

#[utoipa::path(
    get,
    path = "/api/v0/videos/{job_id}/stream/{variant}/{segment}",
    tag = "videos",
    params(
        ("job_id" = String, Path, description = "Encode job ID"),
        ("variant" = String, Path, description = "Quality variant (e.g., 360p, 720p)"),
        ("segment" = String, Path, description = "Segment filename (e.g., segment_000.ts)")
    ),
    responses(
        (status = 200, description = "Video segment", content_type = "video/mp2t"),
        (status = 400, description = "Invalid segment name", body = ErrorResponse),
        (status = 404, description = "Segment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn stream_segment(
    State(state): State<Arc<AppState>>,
    Path((job_id, variant, segment)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    // Validate every component to prevent path traversal.
    if !is_safe_path_component(&job_id)
        || !is_safe_path_component(&variant)
        || !is_safe_path_component(&segment)
    {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid segment name", "BAD_REQUEST")),
        ));
    }

    let segment_key = format!("hls/{}/{}/{}", job_id, variant, segment);
    let stream = open_asset(&state, &segment_key, "Segment not found").await?;

    build_stream_response(stream, SEGMENT_CONTENT_TYPE)
}

/// Open a storage stream for an HLS asset, mapping a missing file to a
/// descriptive 404 and anything else to a 500.
async fn open_asset(
    state: &AppState,
    storage_key: &str,
    missing_message: &'static str,
) -> Result<ByteStream, (StatusCode, Json<ErrorResponse>)> {
    state
        .media
        .storage
        .download_stream(storage_key)
        .await
        .map_err(|e| match e {
            StorageError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(missing_message, "NOT_FOUND")),
            ),
            other => {
                tracing::error!(error = %other, storage_key = %storage_key, "Failed to fetch HLS asset from storage");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(
                        "Failed to fetch asset",
                        "STORAGE_ERROR",
                    )),
                )
            }
        })
}

fn build_stream_response(
    stream: ByteStream,
    content_type: &'static str,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let body_stream = stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from_stream(body_stream))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build HLS response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "Failed to build response",
                    "INTERNAL_ERROR",
                )),
            )
        })
}
