//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from
//! main.rs for better organization and testability.

pub mod routes;
pub mod server;

use crate::state::{AppState, EncodeState, MediaState};
use anyhow::{Context, Result};
use reelay_core::Config;
use reelay_processing::{HlsTranscoder, ImageNormalizer, Scratch, Transcoder};
use reelay_queue::{EncodeJobStore, InMemoryJobStore, TranscodeQueue};
use reelay_storage::{LocalStorage, Storage};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration.
    config.validate().context("Configuration validation failed")?;

    // Scratch directories are created idempotently so restarts are safe.
    let scratch = Scratch::init(&config.scratch_path)
        .await
        .context("Failed to initialize scratch storage")?;

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(
            &config.media_storage_path,
            format!("{}/media", config.public_base_url.trim_end_matches('/')),
        )
        .await
        .context("Failed to initialize media storage")?,
    );

    let store: Arc<dyn EncodeJobStore> = Arc::new(InMemoryJobStore::new());
    let transcoder: Arc<dyn Transcoder> = Arc::new(HlsTranscoder::new(
        config.ffmpeg_path.clone(),
        config.ffprobe_path.clone(),
        config.hls_segment_duration,
        config.hls_variants.clone(),
        storage.clone(),
    ));
    let queue = TranscodeQueue::new(transcoder, store.clone(), config.encode_queue_capacity);

    let state = Arc::new(AppState {
        media: MediaState {
            storage,
            scratch,
            normalizer: ImageNormalizer::new(config.image_max_dimension, config.image_jpeg_quality),
            image_max_file_size: config.image_max_file_size,
            image_max_total_size: config.image_max_total_size,
            image_max_files: config.image_max_files,
            video_max_file_size: config.video_max_file_size,
        },
        encode: EncodeState { queue, store },
        config: config.clone(),
    });

    tracing::info!(
        media_storage_path = %config.media_storage_path,
        scratch_path = %config.scratch_path,
        "Application initialized"
    );

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
