//! The transcode queue: bounded FIFO channel feeding one worker task.
//!
//! The worker owns the receive side and awaits each job inline, which makes
//! the two core guarantees structural rather than enforced by flags: jobs
//! start in enqueue order, and at most one transcode runs at any time.
//! Receiving an item removes it from the channel before processing, so a
//! failed job is never seen again by the worker.

use reelay_core::models::{EncodeJob, EncodeJobState};
use reelay_processing::{StagedFile, Transcoder};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::store::{EncodeJobStore, JobStoreError};

#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    #[error("Encode queue is full, please try again later")]
    QueueFull,

    #[error("Encode queue worker has stopped")]
    WorkerGone,

    #[error(transparent)]
    Store(#[from] JobStoreError),
}

struct QueueItem {
    job_id: String,
    source: StagedFile,
}

/// Handle for submitting transcode jobs and polling their status.
pub struct TranscodeQueue {
    tx: mpsc::Sender<QueueItem>,
    store: Arc<dyn EncodeJobStore>,
}

impl TranscodeQueue {
    /// Create the queue and spawn its worker task.
    ///
    /// `capacity` bounds how many jobs may wait; submissions beyond it fail
    /// fast with [`EnqueueError::QueueFull`] instead of buffering without limit.
    pub fn new(
        transcoder: Arc<dyn Transcoder>,
        store: Arc<dyn EncodeJobStore>,
        capacity: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));

        let worker_store = store.clone();
        tokio::spawn(async move {
            Self::worker(rx, transcoder, worker_store).await;
        });

        tracing::info!(capacity = capacity.max(1), "Transcode queue started");

        Self { tx, store }
    }

    /// Record an [`EncodeJob`] in state pending and append the staged video to
    /// the queue. Returns the job id immediately; the transcode itself runs on
    /// the worker task.
    #[tracing::instrument(skip(self, source), fields(job.id = tracing::field::Empty))]
    pub async fn enqueue(&self, source: StagedFile) -> Result<String, EnqueueError> {
        let job_id = source.base_name().to_string();
        tracing::Span::current().record("job.id", job_id.as_str());

        // Reserve a queue slot before touching the store, so a full queue
        // leaves no orphaned pending record behind. The staged source is owned
        // by the queue from here on: discarded on rejection, or by the worker
        // once the job reaches a terminal state.
        let permit = match self.tx.try_reserve() {
            Ok(permit) => permit,
            Err(e) => {
                source.discard().await;
                return Err(match e {
                    mpsc::error::TrySendError::Full(()) => EnqueueError::QueueFull,
                    mpsc::error::TrySendError::Closed(()) => EnqueueError::WorkerGone,
                });
            }
        };

        if let Err(e) = self.store.insert(EncodeJob::new(job_id.clone())).await {
            source.discard().await;
            return Err(e.into());
        }

        permit.send(QueueItem {
            job_id: job_id.clone(),
            source,
        });

        tracing::info!(job_id = %job_id, "Transcode job enqueued");
        Ok(job_id)
    }

    /// Fetch a job's current status record.
    pub async fn status(&self, job_id: &str) -> Option<EncodeJob> {
        self.store.get(job_id).await.ok().flatten()
    }

    async fn worker(
        mut rx: mpsc::Receiver<QueueItem>,
        transcoder: Arc<dyn Transcoder>,
        store: Arc<dyn EncodeJobStore>,
    ) {
        while let Some(item) = rx.recv().await {
            Self::process_job(item, transcoder.as_ref(), store.as_ref()).await;
        }
        tracing::info!("Transcode queue worker stopped");
    }

    #[tracing::instrument(skip(item, transcoder, store), fields(job.id = %item.job_id, job.status = tracing::field::Empty))]
    async fn process_job(item: QueueItem, transcoder: &dyn Transcoder, store: &dyn EncodeJobStore) {
        let start = std::time::Instant::now();
        let QueueItem { job_id, source } = item;

        if let Err(e) = store
            .transition(&job_id, EncodeJobState::Processing, None)
            .await
        {
            // Without a readable status record the job outcome would be
            // unobservable; skip the work and drop the source.
            tracing::error!(job_id = %job_id, error = %e, "Failed to mark job processing, skipping");
            source.discard().await;
            return;
        }

        let result = transcoder.transcode(&source.path, &job_id).await;
        let elapsed = start.elapsed();

        // The staged source is owned by this job and is done with either way.
        source.discard().await;

        match result {
            Ok(output) => {
                tracing::Span::current().record("job.status", "success");
                if let Err(e) = store
                    .transition(&job_id, EncodeJobState::Success, None)
                    .await
                {
                    tracing::error!(job_id = %job_id, error = %e, "Failed to mark job success");
                }
                tracing::info!(
                    job_id = %job_id,
                    variant_count = output.variants.len(),
                    duration_ms = elapsed.as_millis(),
                    "Transcode completed successfully"
                );
            }
            Err(e) => {
                tracing::Span::current().record("job.status", "failed");
                if let Err(update_err) = store
                    .transition(&job_id, EncodeJobState::Failed, Some(e.to_string()))
                    .await
                {
                    tracing::error!(job_id = %job_id, error = %update_err, "Failed to mark job failed");
                }
                tracing::error!(
                    job_id = %job_id,
                    error = %e,
                    duration_ms = elapsed.as_millis(),
                    "Transcode failed"
                );
            }
        }
    }
}

impl Clone for TranscodeQueue {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            store: self.store.clone(),
        }
    }
}
