//! Application state and sub-state extractors.
//!
//! AppState is split into domain sub-states so handlers can extract only what
//! they need via Axum's `FromRef`.

use reelay_core::Config;
use reelay_processing::{ImageNormalizer, Scratch, UploadPolicy};
use reelay_queue::{EncodeJobStore, TranscodeQueue};
use reelay_storage::Storage;
use std::sync::Arc;

use crate::constants::API_PREFIX;

/// Media intake and serving: durable storage, scratch staging, limits.
#[derive(Clone)]
pub struct MediaState {
    pub storage: Arc<dyn Storage>,
    pub scratch: Scratch,
    pub normalizer: ImageNormalizer,
    pub image_max_file_size: usize,
    pub image_max_total_size: usize,
    pub image_max_files: usize,
    pub video_max_file_size: usize,
}

impl MediaState {
    pub fn image_policy(&self) -> UploadPolicy {
        UploadPolicy::image(
            self.image_max_file_size,
            self.image_max_total_size,
            self.image_max_files,
        )
    }

    pub fn video_policy(&self) -> UploadPolicy {
        UploadPolicy::video(self.video_max_file_size)
    }
}

/// Transcode queue and the injected job status store.
#[derive(Clone)]
pub struct EncodeState {
    pub queue: TranscodeQueue,
    pub store: Arc<dyn EncodeJobStore>,
}

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub media: MediaState,
    pub encode: EncodeState,
    pub config: Config,
}

impl AppState {
    /// Public URL of a published image.
    pub fn image_url(&self, filename: &str) -> String {
        format!(
            "{}{}/images/{}",
            self.config.public_base_url.trim_end_matches('/'),
            API_PREFIX,
            filename
        )
    }

    /// Public URL of a raw video, served via byte-range requests.
    pub fn video_stream_url(&self, filename: &str) -> String {
        format!(
            "{}{}/videos/{}/stream",
            self.config.public_base_url.trim_end_matches('/'),
            API_PREFIX,
            filename
        )
    }

    /// Public URL of a transcode job's master playlist, valid once the job
    /// reaches success.
    pub fn hls_master_url(&self, job_id: &str) -> String {
        format!(
            "{}{}/videos/{}/stream/master.m3u8",
            self.config.public_base_url.trim_end_matches('/'),
            API_PREFIX,
            job_id
        )
    }
}

// ----- FromRef for sub-state extraction -----

impl axum::extract::FromRef<Arc<AppState>> for MediaState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.media.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for EncodeState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.encode.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
