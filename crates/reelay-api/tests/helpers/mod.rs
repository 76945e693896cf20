//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p reelay-api`.

use async_trait::async_trait;
use axum_test::TestServer;
use reelay_api::constants;
use reelay_api::setup::routes;
use reelay_api::state::{AppState, EncodeState, MediaState};
use reelay_core::Config;
use reelay_processing::{
    ImageNormalizer, Scratch, TranscodeError, TranscodeOutput, Transcoder,
};
use reelay_queue::{EncodeJobStore, InMemoryJobStore, TranscodeQueue};
use reelay_storage::{LocalStorage, Storage};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server plus owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub media_dir: TempDir,
    pub scratch_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Poll the job store until the job reaches a terminal state.
    pub async fn wait_terminal(&self, job_id: &str) -> reelay_core::models::EncodeJob {
        for _ in 0..200 {
            if let Ok(Some(job)) = self.state.encode.store.get(job_id).await {
                if job.state.is_terminal() {
                    return job;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not reach a terminal state", job_id);
    }
}

/// Stub transcoder that publishes a minimal HLS tree for every job, so the
/// streaming endpoints can be exercised without ffmpeg.
pub struct PublishingStubTranscoder {
    storage: Arc<dyn Storage>,
}

#[async_trait]
impl Transcoder for PublishingStubTranscoder {
    async fn transcode(
        &self,
        _source: &Path,
        job_id: &str,
    ) -> Result<TranscodeOutput, TranscodeError> {
        let base = format!("hls/{}", job_id);
        self.storage
            .upload(
                &format!("{}/master.m3u8", base),
                "application/vnd.apple.mpegurl",
                b"#EXTM3U\n#EXT-X-VERSION:3\n\n#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360\n360p/index.m3u8\n".to_vec(),
            )
            .await?;
        self.storage
            .upload(
                &format!("{}/360p/index.m3u8", base),
                "application/vnd.apple.mpegurl",
                b"#EXTM3U\n#EXTINF:6.0,\nsegment_000.ts\n#EXT-X-ENDLIST\n".to_vec(),
            )
            .await?;
        self.storage
            .upload(
                &format!("{}/360p/segment_000.ts", base),
                "video/mp2t",
                vec![0x47; 188],
            )
            .await?;

        Ok(TranscodeOutput {
            master_playlist_key: format!("{}/master.m3u8", base),
            variants: vec![],
        })
    }
}

/// Stub transcoder that fails the first job and succeeds afterwards.
pub struct FailFirstStubTranscoder {
    invocations: AtomicUsize,
}

impl FailFirstStubTranscoder {
    pub fn new() -> Self {
        Self {
            invocations: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Transcoder for FailFirstStubTranscoder {
    async fn transcode(
        &self,
        _source: &Path,
        job_id: &str,
    ) -> Result<TranscodeOutput, TranscodeError> {
        if self.invocations.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(TranscodeError::Encode("corrupt input".to_string()))
        } else {
            Ok(TranscodeOutput {
                master_playlist_key: format!("hls/{}/master.m3u8", job_id),
                variants: vec![],
            })
        }
    }
}

/// Setup a test app with the publishing stub transcoder and default config.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}, None).await
}

/// Setup a test app with a config tweak and an optional custom transcoder.
pub async fn setup_test_app_with(
    configure: impl FnOnce(&mut Config),
    transcoder: Option<Arc<dyn Transcoder>>,
) -> TestApp {
    let media_dir = TempDir::new().expect("media temp dir");
    let scratch_dir = TempDir::new().expect("scratch temp dir");

    let mut config = Config {
        media_storage_path: media_dir.path().to_string_lossy().to_string(),
        scratch_path: scratch_dir.path().to_string_lossy().to_string(),
        ..Config::default()
    };
    configure(&mut config);

    let scratch = Scratch::init(&config.scratch_path).await.expect("scratch");
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(&config.media_storage_path, "http://localhost:4000/media".into())
            .await
            .expect("storage"),
    );

    let transcoder = transcoder.unwrap_or_else(|| {
        Arc::new(PublishingStubTranscoder {
            storage: storage.clone(),
        })
    });

    let store: Arc<dyn EncodeJobStore> = Arc::new(InMemoryJobStore::new());
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

    let router = routes::setup_routes(&config, state.clone()).expect("router");
    let server = TestServer::new(router).expect("test server");

    TestApp {
        server,
        state,
        media_dir,
        scratch_dir,
    }
}

/// PNG fixture of the given dimensions.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    use image::{DynamicImage, Rgba, RgbaImage};
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([10, 120, 200, 255]),
    ));
    let mut buffer = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut buffer),
        image::ImageFormat::Png,
    )
    .expect("encode fixture png");
    buffer
}

/// Count regular files under a directory (non-recursive).
pub fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(Result::ok).count())
        .unwrap_or(0)
}
