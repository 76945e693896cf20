//! Upload intake: per-purpose validation rules and scratch staging.
//!
//! Validation is expressed as a [`UploadPolicy`] checked part-by-part while the
//! multipart body is read, so a rejected part is never written to disk. Accepted
//! bytes are staged through [`Scratch`], which owns the scratch directory layout
//! and hands out exclusively-owned [`StagedFile`]s.

use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Declared purpose of an upload request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Video,
}

impl UploadKind {
    /// Exact multipart field name required for this purpose.
    pub fn field_name(self) -> &'static str {
        match self {
            UploadKind::Image => "image",
            UploadKind::Video => "video",
        }
    }

    /// Required MIME type prefix (`image/` or `video/`).
    pub fn mime_prefix(self) -> &'static str {
        match self {
            UploadKind::Image => "image/",
            UploadKind::Video => "video/",
        }
    }

    /// Scratch subdirectory for staged files of this kind.
    fn scratch_subdir(self) -> &'static str {
        match self {
            UploadKind::Image => "images",
            UploadKind::Video => "videos",
        }
    }
}

/// Validation errors raised while parsing an upload request.
#[derive(Debug, thiserror::Error)]
pub enum UploadValidationError {
    #[error("Unexpected form field '{got}' (expected '{expected}')")]
    FieldNameMismatch { expected: &'static str, got: String },

    #[error("Unsupported media type '{content_type}' (expected {expected_prefix}*)")]
    UnsupportedMediaType {
        content_type: String,
        expected_prefix: &'static str,
    },

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Combined upload too large: {total} bytes (max: {max} bytes)")]
    TotalSizeExceeded { total: usize, max: usize },

    #[error("Too many files: {count} (max: {max})")]
    TooManyFiles { count: usize, max: usize },

    #[error("No files in upload")]
    EmptyUpload,

    #[error("Malformed multipart body: {0}")]
    Malformed(String),
}

/// Constraints enforced on one upload request.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub kind: UploadKind,
    pub max_file_size: usize,
    /// Aggregate ceiling across all files in one request.
    pub max_total_size: usize,
    pub max_files: usize,
}

impl UploadPolicy {
    pub fn image(max_file_size: usize, max_total_size: usize, max_files: usize) -> Self {
        Self {
            kind: UploadKind::Image,
            max_file_size,
            max_total_size,
            max_files,
        }
    }

    /// Video uploads accept exactly one file; the aggregate ceiling collapses
    /// onto the per-file one.
    pub fn video(max_file_size: usize) -> Self {
        Self {
            kind: UploadKind::Video,
            max_file_size,
            max_total_size: max_file_size,
            max_files: 1,
        }
    }

    /// Any part under a name other than the required one is an error, not
    /// something to skip silently.
    pub fn check_field_name(&self, name: &str) -> Result<(), UploadValidationError> {
        if name != self.kind.field_name() {
            return Err(UploadValidationError::FieldNameMismatch {
                expected: self.kind.field_name(),
                got: name.to_string(),
            });
        }
        Ok(())
    }

    pub fn check_content_type(&self, content_type: &str) -> Result<(), UploadValidationError> {
        // Strip parameters ("image/jpeg; charset=utf-8" -> "image/jpeg") before matching.
        let normalized = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim()
            .to_lowercase();
        if !normalized.starts_with(self.kind.mime_prefix()) {
            return Err(UploadValidationError::UnsupportedMediaType {
                content_type: content_type.to_string(),
                expected_prefix: self.kind.mime_prefix(),
            });
        }
        Ok(())
    }

    pub fn check_file_size(&self, size: usize) -> Result<(), UploadValidationError> {
        if size > self.max_file_size {
            return Err(UploadValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    pub fn check_total_size(&self, total: usize) -> Result<(), UploadValidationError> {
        if total > self.max_total_size {
            return Err(UploadValidationError::TotalSizeExceeded {
                total,
                max: self.max_total_size,
            });
        }
        Ok(())
    }

    pub fn check_file_count(&self, count: usize) -> Result<(), UploadValidationError> {
        if count > self.max_files {
            return Err(UploadValidationError::TooManyFiles {
                count,
                max: self.max_files,
            });
        }
        Ok(())
    }
}

/// A staged upload awaiting processing, exclusively owned by whichever
/// component claims it. Deleted once that component finishes.
#[derive(Debug)]
pub struct StagedFile {
    pub path: PathBuf,
    pub field_name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

impl StagedFile {
    /// Unique base name of the staged file, without extension. Used as the
    /// transcode job id for videos.
    pub fn base_name(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }

    /// Lowercased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }

    /// Remove the staged file from disk. Missing files are not an error.
    pub async fn discard(self) {
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove staged file");
            }
        }
    }
}

/// Scratch storage for staged uploads.
///
/// The per-kind subdirectories are created idempotently at construction, so the
/// service can be restarted against an existing scratch tree.
#[derive(Clone, Debug)]
pub struct Scratch {
    base: PathBuf,
}

impl Scratch {
    pub async fn init(base: impl Into<PathBuf>) -> std::io::Result<Self> {
        let base = base.into();
        for kind in [UploadKind::Image, UploadKind::Video] {
            tokio::fs::create_dir_all(base.join(kind.scratch_subdir())).await?;
        }
        Ok(Self { base })
    }

    pub fn dir_for(&self, kind: UploadKind) -> PathBuf {
        self.base.join(kind.scratch_subdir())
    }

    /// Write accepted bytes under a generated unique name and return the
    /// staged file handle. The caller has already validated the part.
    pub async fn stage(
        &self,
        kind: UploadKind,
        extension: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> std::io::Result<StagedFile> {
        let name = if extension.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            format!("{}.{}", Uuid::new_v4(), sanitize_extension(extension))
        };
        let path = self.dir_for(kind).join(name);
        let size_bytes = data.len() as u64;

        tokio::fs::write(&path, data).await?;

        tracing::debug!(
            path = %path.display(),
            size_bytes,
            content_type = %content_type,
            "Staged upload"
        );

        Ok(StagedFile {
            path,
            field_name: kind.field_name().to_string(),
            content_type: content_type.to_string(),
            size_bytes,
        })
    }
}

/// Keep only filename-safe characters of a client-supplied extension.
fn sanitize_extension(extension: &str) -> String {
    let cleaned: String = extension
        .chars()
        .take(8)
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if cleaned.is_empty() {
        "bin".to_string()
    } else {
        cleaned.to_lowercase()
    }
}

/// Derive the file extension from an uploaded filename.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}
