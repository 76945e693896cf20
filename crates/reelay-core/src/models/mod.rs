pub mod encode_job;
pub mod media;

pub use encode_job::{EncodeJob, EncodeJobResponse, EncodeJobState};
pub use media::{HlsUploadResponse, MediaAssetResponse, MediaKind};
