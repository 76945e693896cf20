//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use reelay_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Reelay API",
        version = "0.1.0",
        description = "Media ingestion and streaming API (v0): image and video uploads, HLS transcoding with status polling, and byte-range video streaming. All endpoints are versioned under /api/v0/."
    ),
    paths(
        // Images
        handlers::image_upload::upload_images,
        handlers::image_get::get_image,
        // Videos
        handlers::video_upload::upload_video,
        handlers::hls_upload::upload_video_hls,
        handlers::job_status::get_job_status,
        handlers::video_stream::stream_video,
        handlers::hls_stream::stream_master_playlist,
        handlers::hls_stream::stream_variant_playlist,
        handlers::hls_stream::stream_segment,
        // Health
        handlers::health::health,
    ),
    components(schemas(
        error::ErrorResponse,
        models::MediaAssetResponse,
        models::HlsUploadResponse,
        models::EncodeJobResponse,
        models::MediaKind,
        models::EncodeJobState,
    )),
    tags(
        (name = "images", description = "Image upload and retrieval"),
        (name = "videos", description = "Video upload, transcoding, and streaming"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
