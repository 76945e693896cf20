use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use reelay_core::models::{MediaAssetResponse, MediaKind};
use reelay_processing::StagedFile;

use crate::error::{ErrorResponse, HttpAppError};
use crate::services::upload::{discard_all, receive_upload};
use crate::state::AppState;

/// Upload image handler
///
/// Accepts up to the configured number of files under the form field `image`,
/// normalizes each one (bounded fit-inside resize, JPEG re-encode), and
/// publishes it to durable storage.
#[utoipa::path(
    post,
    path = "/api/v0/images",
    tag = "images",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Images uploaded successfully", body = [MediaAssetResponse]),
        (status = 400, description = "Invalid field name, file count, or upload body", body = ErrorResponse),
        (status = 413, description = "File or request too large", body = ErrorResponse),
        (status = 415, description = "Not an image", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_image"))]
pub async fn upload_images(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let policy = state.media.image_policy();
    let staged = receive_upload(&state.media.scratch, &policy, multipart).await?;

    let mut assets = Vec::with_capacity(staged.len());
    let mut pending = staged.into_iter();
    while let Some(file) = pending.next() {
        match publish_image(&state, file).await {
            Ok(asset) => assets.push(asset),
            Err(e) => {
                // Abort the request; files not yet processed are cleaned up.
                discard_all(pending.collect()).await;
                return Err(e);
            }
        }
    }

    Ok((StatusCode::CREATED, Json(assets)))
}

/// Normalize one staged image and publish it. The staged file is deleted on
/// both outcomes: a malformed image will not become valid on retry.
async fn publish_image(
    state: &AppState,
    file: StagedFile,
) -> Result<MediaAssetResponse, HttpAppError> {
    let normalized = state.media.normalizer.normalize_file(&file.path).await;

    let base_name = file.base_name().to_string();
    file.discard().await;

    let normalized = normalized?;
    let filename = format!("{}.jpg", base_name);
    let storage_key = format!("images/{}", filename);

    state
        .media
        .storage
        .upload(&storage_key, "image/jpeg", normalized.to_vec())
        .await?;

    tracing::info!(storage_key = %storage_key, "Image published");

    Ok(MediaAssetResponse {
        url: state.image_url(&filename),
        kind: MediaKind::Image,
    })
}
