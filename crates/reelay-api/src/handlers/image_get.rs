use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use futures::StreamExt;
use reelay_core::AppError;
use reelay_processing::intake::extension_of;

use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::{content_type_for_extension, is_safe_path_component};
use crate::state::AppState;

/// Fetch a published image as a whole file.
#[utoipa::path(
    get,
    path = "/api/v0/images/{filename}",
    tag = "images",
    params(
        ("filename" = String, Path, description = "Published image filename")
    ),
    responses(
        (status = 200, description = "Image bytes", content_type = "image/jpeg"),
        (status = 404, description = "Image not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, HttpAppError> {
    if !is_safe_path_component(&filename) {
        return Err(AppError::BadRequest("Invalid image name".to_string()).into());
    }

    let storage_key = format!("images/{}", filename);
    let stream = state.media.storage.download_stream(&storage_key).await?;

    let content_type = content_type_for_extension(
        extension_of(&filename).as_deref().unwrap_or_default(),
    );

    let body_stream = stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from_stream(body_stream))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build image response");
            AppError::Internal("Failed to build response".to_string()).into()
        })
}
