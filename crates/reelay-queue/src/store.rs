//! Encode job status store.
//!
//! The store is an explicit dependency of the queue and the status endpoint,
//! injected rather than ambient, so both can be exercised in isolation. Updates
//! validate the job state machine: a terminal state is never overwritten.

use async_trait::async_trait;
use chrono::Utc;
use reelay_core::models::{EncodeJob, EncodeJobState};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Job already exists: {0}")]
    AlreadyExists(String),

    #[error("Illegal transition for job {id}: {from} -> {to}")]
    IllegalTransition {
        id: String,
        from: EncodeJobState,
        to: EncodeJobState,
    },
}

/// Key-value store of [`EncodeJob`] records, keyed by job id.
///
/// Reads may happen concurrently with the worker's writes; implementations
/// must make each job's updates linearizable so a reader never observes a
/// state transition out of order.
#[async_trait]
pub trait EncodeJobStore: Send + Sync {
    /// Insert a new job record. Fails if the id is already present.
    async fn insert(&self, job: EncodeJob) -> Result<(), JobStoreError>;

    /// Fetch a job by id.
    async fn get(&self, id: &str) -> Result<Option<EncodeJob>, JobStoreError>;

    /// Advance a job's state, recording an optional diagnostic message.
    /// Rejects transitions the job state machine does not allow.
    async fn transition(
        &self,
        id: &str,
        next: EncodeJobState,
        message: Option<String>,
    ) -> Result<EncodeJob, JobStoreError>;
}

/// In-process store backed by a `HashMap` behind an async `RwLock`.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<String, EncodeJob>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EncodeJobStore for InMemoryJobStore {
    async fn insert(&self, job: EncodeJob) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(JobStoreError::AlreadyExists(job.id));
        }
        jobs.insert(job.id.clone(), job);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<EncodeJob>, JobStoreError> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn transition(
        &self,
        id: &str,
        next: EncodeJobState,
        message: Option<String>,
    ) -> Result<EncodeJob, JobStoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobStoreError::NotFound(id.to_string()))?;

        if !job.state.can_transition_to(next) {
            return Err(JobStoreError::IllegalTransition {
                id: id.to_string(),
                from: job.state,
                to: next,
            });
        }

        job.state = next;
        job.message = message;
        job.updated_at = Utc::now();
        Ok(job.clone())
    }
}
