//! Configuration module
//!
//! Environment-driven configuration for the API server, media limits, and the
//! transcode pipeline. Every setting has a default so the service starts with no
//! environment at all; `validate()` rejects values that cannot work.

use std::env;

const SERVER_PORT: u16 = 4000;
const IMAGE_MAX_FILE_SIZE_MB: usize = 5;
const IMAGE_MAX_TOTAL_SIZE_MB: usize = 20;
const IMAGE_MAX_FILES: usize = 4;
const IMAGE_MAX_DIMENSION: u32 = 1200;
const IMAGE_JPEG_QUALITY: u8 = 80;
const VIDEO_MAX_FILE_SIZE_MB: usize = 100;
const HLS_SEGMENT_DURATION: u64 = 6;
const STREAM_CHUNK_SIZE: u64 = 1_000_000;
const ENCODE_QUEUE_CAPACITY: usize = 256;

/// Application configuration, loaded once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    /// Base URL prefixed to generated public asset URLs.
    pub public_base_url: String,
    /// Root directory for durable asset storage.
    pub media_storage_path: String,
    /// Root directory for staged (pre-processing) uploads.
    pub scratch_path: String,
    // Image intake and normalization
    pub image_max_file_size: usize,
    pub image_max_total_size: usize,
    pub image_max_files: usize,
    pub image_max_dimension: u32,
    pub image_jpeg_quality: u8,
    // Video intake and transcoding
    pub video_max_file_size: usize,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub hls_segment_duration: u64,
    pub hls_variants: Vec<String>,
    pub encode_queue_capacity: usize,
    // Streaming
    pub stream_chunk_size: u64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_list(key: &str, default: &str) -> Vec<String> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let config = Config {
            server_port: env_or("PORT", SERVER_PORT),
            cors_origins: env_list("CORS_ORIGINS", "*"),
            environment: env::var("ENVIRONMENT")
                .or_else(|_| env::var("APP_ENV"))
                .unwrap_or_else(|_| "development".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", env_or("PORT", SERVER_PORT))),
            media_storage_path: env::var("MEDIA_STORAGE_PATH")
                .unwrap_or_else(|_| "data/media".to_string()),
            scratch_path: env::var("SCRATCH_PATH").unwrap_or_else(|_| "data/scratch".to_string()),
            image_max_file_size: env_or("IMAGE_MAX_FILE_SIZE_MB", IMAGE_MAX_FILE_SIZE_MB)
                * 1024
                * 1024,
            image_max_total_size: env_or("IMAGE_MAX_TOTAL_SIZE_MB", IMAGE_MAX_TOTAL_SIZE_MB)
                * 1024
                * 1024,
            image_max_files: env_or("IMAGE_MAX_FILES", IMAGE_MAX_FILES),
            image_max_dimension: env_or("IMAGE_MAX_DIMENSION", IMAGE_MAX_DIMENSION),
            image_jpeg_quality: env_or("IMAGE_JPEG_QUALITY", IMAGE_JPEG_QUALITY),
            video_max_file_size: env_or("VIDEO_MAX_FILE_SIZE_MB", VIDEO_MAX_FILE_SIZE_MB)
                * 1024
                * 1024,
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            hls_segment_duration: env_or("HLS_SEGMENT_DURATION", HLS_SEGMENT_DURATION),
            hls_variants: env_list("HLS_VARIANTS", "360p,480p,720p,1080p"),
            encode_queue_capacity: env_or("ENCODE_QUEUE_CAPACITY", ENCODE_QUEUE_CAPACITY),
            stream_chunk_size: env_or("STREAM_CHUNK_SIZE", STREAM_CHUNK_SIZE),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.image_max_file_size == 0 || self.video_max_file_size == 0 {
            anyhow::bail!("Upload size limits must be greater than zero");
        }
        if self.image_max_files == 0 {
            anyhow::bail!("IMAGE_MAX_FILES must be at least 1");
        }
        if self.image_max_total_size < self.image_max_file_size {
            anyhow::bail!("IMAGE_MAX_TOTAL_SIZE_MB must be >= IMAGE_MAX_FILE_SIZE_MB");
        }
        if self.image_jpeg_quality == 0 || self.image_jpeg_quality > 100 {
            anyhow::bail!("IMAGE_JPEG_QUALITY must be in 1..=100");
        }
        if self.image_max_dimension == 0 {
            anyhow::bail!("IMAGE_MAX_DIMENSION must be greater than zero");
        }
        if self.hls_segment_duration == 0 {
            anyhow::bail!("HLS_SEGMENT_DURATION must be greater than zero");
        }
        if self.hls_variants.is_empty() {
            anyhow::bail!("HLS_VARIANTS must name at least one variant");
        }
        if self.stream_chunk_size == 0 {
            anyhow::bail!("STREAM_CHUNK_SIZE must be greater than zero");
        }
        if self.encode_queue_capacity == 0 {
            anyhow::bail!("ENCODE_QUEUE_CAPACITY must be at least 1");
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Largest request body the server should accept (the video ceiling dominates).
    pub fn max_request_body_size(&self) -> usize {
        self.video_max_file_size.max(self.image_max_total_size)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            public_base_url: format!("http://localhost:{}", SERVER_PORT),
            media_storage_path: "data/media".to_string(),
            scratch_path: "data/scratch".to_string(),
            image_max_file_size: IMAGE_MAX_FILE_SIZE_MB * 1024 * 1024,
            image_max_total_size: IMAGE_MAX_TOTAL_SIZE_MB * 1024 * 1024,
            image_max_files: IMAGE_MAX_FILES,
            image_max_dimension: IMAGE_MAX_DIMENSION,
            image_jpeg_quality: IMAGE_JPEG_QUALITY,
            video_max_file_size: VIDEO_MAX_FILE_SIZE_MB * 1024 * 1024,
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            hls_segment_duration: HLS_SEGMENT_DURATION,
            hls_variants: vec![
                "360p".to_string(),
                "480p".to_string(),
                "720p".to_string(),
                "1080p".to_string(),
            ],
            encode_queue_capacity: ENCODE_QUEUE_CAPACITY,
            stream_chunk_size: STREAM_CHUNK_SIZE,
        }
    }
}
