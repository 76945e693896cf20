//! Range-based streaming of raw video files.
//!
//! A `Range` header is required: responses are always 206 windows bounded by
//! the configured chunk size, never the whole file. A window that starts at or
//! past the end of the file is rejected with 416 rather than served empty.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use reelay_core::AppError;
use reelay_processing::intake::extension_of;

use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::{content_type_for_extension, is_safe_path_component};
use crate::state::AppState;

/// Serve a byte window of a published video.
#[utoipa::path(
    get,
    path = "/api/v0/videos/{filename}/stream",
    tag = "videos",
    params(
        ("filename" = String, Path, description = "Published video filename"),
        ("Range" = String, Header, description = "Required: bytes=start-[end]")
    ),
    responses(
        (status = 206, description = "Partial content window"),
        (status = 400, description = "Missing or malformed Range header", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 416, description = "Range outside the file", body = ErrorResponse)
    )
)]
pub async fn stream_video(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    if !is_safe_path_component(&filename) {
        return Err(AppError::BadRequest("Invalid video name".to_string()).into());
    }

    let storage_key = format!("videos/{}", filename);

    // Resolve the size first so a missing file 404s before any read.
    let file_size = state.media.storage.content_length(&storage_key).await?;

    let range_header = headers
        .get(header::RANGE)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Range header required".to_string()))?;

    let (start, requested_end) = parse_range_header(range_header).ok_or_else(|| {
        AppError::InvalidInput(format!("Malformed Range header: {}", range_header))
    })?;

    let Some((start, end)) =
        resolve_window(start, requested_end, file_size, state.config.stream_chunk_size)
    else {
        return Ok(range_not_satisfiable(file_size));
    };

    let content_length = end - start + 1;
    let stream = state
        .media
        .storage
        .download_range(&storage_key, start, content_length)
        .await?;

    let content_type = content_type_for_extension(
        extension_of(&filename).as_deref().unwrap_or_default(),
    );

    let body_stream = stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, content_length.to_string())
        .header(
            header::CONTENT_RANGE,
            format!("bytes {}-{}/{}", start, end, file_size),
        )
        .header(header::ACCEPT_RANGES, "bytes")
        .body(Body::from_stream(body_stream))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build range response");
            AppError::Internal("Failed to build response".to_string()).into()
        })
}

/// Parse an HTTP `Range` header of the form `bytes=start-[end]`.
///
/// Suffix ranges (`bytes=-500`) and multi-range requests are not supported.
fn parse_range_header(value: &str) -> Option<(u64, Option<u64>)> {
    let spec = value.strip_prefix("bytes=")?;
    let (start, end) = spec.split_once('-')?;

    let start: u64 = start.trim().parse().ok()?;
    let end = end.trim();
    let end = if end.is_empty() {
        None
    } else {
        Some(end.parse::<u64>().ok()?)
    };

    Some((start, end))
}

/// Clamp the requested range into a served window, or `None` when the request
/// is unsatisfiable (start at or past end of file, or an inverted range).
///
/// When `end` is omitted the window is bounded by `chunk_size` so a single
/// request cannot stream the entire remainder of a large file.
fn resolve_window(
    start: u64,
    end: Option<u64>,
    file_size: u64,
    chunk_size: u64,
) -> Option<(u64, u64)> {
    if file_size == 0 || start >= file_size {
        return None;
    }

    let end = match end {
        Some(end) if end < start => return None,
        Some(end) => end.min(file_size - 1),
        None => (start + chunk_size).min(file_size - 1),
    };

    Some((start, end))
}

/// 416 response with a `Content-Range: bytes */{size}` header so clients learn
/// the actual file size.
fn range_not_satisfiable(file_size: u64) -> Response {
    let body = Json(ErrorResponse::new(
        format!("Requested range is outside the file ({} bytes)", file_size),
        "RANGE_NOT_SATISFIABLE",
    ));
    let mut response = (StatusCode::RANGE_NOT_SATISFIABLE, body).into_response();
    if let Ok(value) = header::HeaderValue::from_str(&format!("bytes */{}", file_size)) {
        response.headers_mut().insert(header::CONTENT_RANGE, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bounded_range() {
        assert_eq!(parse_range_header("bytes=0-99"), Some((0, Some(99))));
        assert_eq!(parse_range_header("bytes=500-999"), Some((500, Some(999))));
    }

    #[test]
    fn parses_open_ended_range() {
        assert_eq!(parse_range_header("bytes=500-"), Some((500, None)));
    }

    #[test]
    fn rejects_malformed_ranges() {
        assert_eq!(parse_range_header("bytes=-500"), None);
        assert_eq!(parse_range_header("bytes=-"), None);
        assert_eq!(parse_range_header("bytes=abc-def"), None);
        assert_eq!(parse_range_header("0-99"), None);
        assert_eq!(parse_range_header("bytes=99"), None);
    }

    #[test]
    fn window_honors_explicit_end() {
        assert_eq!(resolve_window(0, Some(99), 1000, 100), Some((0, 99)));
    }

    #[test]
    fn explicit_end_is_clamped_to_file() {
        assert_eq!(resolve_window(0, Some(5000), 1000, 100), Some((0, 999)));
    }

    #[test]
    fn omitted_end_is_bounded_by_chunk_size() {
        assert_eq!(resolve_window(500, None, 10_000, 100), Some((500, 600)));
    }

    #[test]
    fn omitted_end_near_eof_is_clamped() {
        assert_eq!(resolve_window(950, None, 1000, 100), Some((950, 999)));
    }

    #[test]
    fn start_at_or_past_eof_is_unsatisfiable() {
        assert_eq!(resolve_window(1000, None, 1000, 100), None);
        assert_eq!(resolve_window(5000, Some(6000), 1000, 100), None);
    }

    #[test]
    fn inverted_range_is_unsatisfiable() {
        assert_eq!(resolve_window(100, Some(50), 1000, 100), None);
    }

    #[test]
    fn empty_file_is_unsatisfiable() {
        assert_eq!(resolve_window(0, None, 0, 100), None);
    }
}
