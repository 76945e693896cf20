//! Storage abstraction trait
//!
//! This module defines the Storage trait that durable asset backends implement.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked byte stream returned by the streaming read operations.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Storage abstraction trait
///
/// Keys are relative paths (`images/{name}.jpg`, `hls/{job_id}/...`). The
/// backend maps them to its own namespace and is responsible for rejecting
/// keys that would escape it.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload data under a specific storage key. Returns the public URL.
    async fn upload(
        &self,
        storage_key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<String>;

    /// Download a whole file by its storage key.
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Download a file as a stream of chunks (for large files).
    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream>;

    /// Download `length` bytes starting at byte `start`.
    ///
    /// The stream ends early if the file is shorter than `start + length`;
    /// callers derive the window from [`Storage::content_length`] first.
    async fn download_range(
        &self,
        storage_key: &str,
        start: u64,
        length: u64,
    ) -> StorageResult<ByteStream>;

    /// Delete a file by its storage key. Deleting a missing file is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the size in bytes of an object, if it exists.
    async fn content_length(&self, storage_key: &str) -> StorageResult<u64>;

    /// Public URL for a storage key (does not check existence).
    fn public_url(&self, storage_key: &str) -> String;
}
