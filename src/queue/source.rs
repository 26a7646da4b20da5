//! # Seams to the external queue: lookup, depth queries, dead-letter handoff.
//!
//! The queue/broker itself is out of scope; these traits describe exactly
//! what the observability layer consumes from it. A queue adapter implements
//! [`QueueSource`] (job lookup plus per-state depth counts) and
//! [`DeadLetterQueue`] (the only call that flows *back* into queue territory).

use async_trait::async_trait;
use serde::Serialize;

use crate::error::QueueError;

use super::job::{Job, JobPayload};

/// Point-in-time job counts per queue state, stored as gauges by the
/// metrics collector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct QueueDepths {
    /// Jobs waiting for a worker.
    pub waiting: u64,
    /// Jobs currently executing.
    pub active: u64,
    /// Jobs that finished successfully.
    pub completed: u64,
    /// Jobs whose last attempt failed.
    pub failed: u64,
    /// Jobs delayed for a scheduled retry.
    pub delayed: u64,
}

/// Read side of the external queue.
#[async_trait]
pub trait QueueSource: Send + Sync + 'static {
    /// Name of the queue this source fronts.
    fn name(&self) -> &str;

    /// Looks a job up by id. `Ok(None)` means the queue no longer knows it.
    async fn job(&self, id: &str) -> Result<Option<Job>, QueueError>;

    /// Current per-state job counts.
    async fn depths(&self) -> Result<QueueDepths, QueueError>;
}

/// Record handed to the dead-letter queue when a job exhausts its attempts.
///
/// Keeps the original payload so an operator can inspect and requeue.
#[derive(Clone, Debug, Serialize)]
pub struct DeadLetterRecord {
    /// Queue the job originally belonged to.
    pub queue: String,
    /// Job type name.
    pub job_name: String,
    /// The job's original payload, untouched.
    pub payload: JobPayload,
    /// Final failure reason.
    pub reason: String,
    /// Project the job related to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// File the job related to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

impl DeadLetterRecord {
    /// Builds a record from the failed job and its final failure reason.
    pub fn from_job(job: &Job, reason: impl Into<String>) -> Self {
        Self {
            queue: job.queue.clone(),
            job_name: job.name.clone(),
            payload: job.payload.clone(),
            reason: reason.into(),
            project_id: job.payload.project_id.clone(),
            file_id: job.payload.file_id.clone(),
        }
    }
}

/// Destination for permanently-failed work.
#[async_trait]
pub trait DeadLetterQueue: Send + Sync + 'static {
    /// Enqueues a dead-letter record for manual inspection/requeue.
    async fn push(&self, record: DeadLetterRecord) -> Result<(), QueueError>;
}
