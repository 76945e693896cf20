//! Transcode job queue: strictly-ordered, single-worker background pipeline
//! turning staged videos into published HLS rendition sets, with each job's
//! lifecycle tracked in an injected status store.

pub mod queue;
pub mod store;

pub use queue::{EnqueueError, TranscodeQueue};
pub use store::{EncodeJobStore, InMemoryJobStore, JobStoreError};
