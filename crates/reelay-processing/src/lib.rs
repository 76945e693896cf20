//! Media processing for Reelay: upload validation and staging, image
//! normalization, and HLS transcoding.

pub mod image;
pub mod intake;
pub mod video;

pub use image::{ImageNormalizer, NormalizeError};
pub use intake::{Scratch, StagedFile, UploadKind, UploadPolicy, UploadValidationError};
pub use video::{HlsTranscoder, HlsVariant, TranscodeError, TranscodeOutput, Transcoder};
