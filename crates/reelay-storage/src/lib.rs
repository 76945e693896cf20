//! Durable asset storage for Reelay.
//!
//! Assets are written once and read many times; keys are relative paths such as
//! `images/{name}.jpg`, `videos/{name}.mp4`, or `hls/{job_id}/master.m3u8`.

pub mod local;
pub mod traits;

pub use local::LocalStorage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
