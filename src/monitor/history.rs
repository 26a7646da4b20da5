//! # Write-side contract of the durable job-history store.
//!
//! The store itself (schema, persistence, the "recent jobs" read side) is an
//! external collaborator; this trait is exactly what the monitor calls. All
//! writes are best-effort: the monitor logs a failed write and continues,
//! because history must never block event publication or metrics.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;

use crate::error::HistoryError;
use crate::events::JobStatus;

/// Write side of the job-history store.
#[async_trait]
pub trait JobHistoryStore: Send + Sync + 'static {
    /// The job started an attempt.
    async fn mark_processing(&self, job_id: &str) -> Result<(), HistoryError>;

    /// The running attempt reported a progress value (0–100).
    async fn record_progress(&self, job_id: &str, value: f64) -> Result<(), HistoryError>;

    /// The job finished successfully after `duration`.
    async fn mark_completed(&self, job_id: &str, duration: Duration) -> Result<(), HistoryError>;

    /// The attempt failed; `status` is the resolved state (`retrying` or
    /// `failed`) and `next_retry` the scheduled redelivery, if any.
    async fn mark_failure(
        &self,
        job_id: &str,
        reason: &str,
        status: JobStatus,
        next_retry: Option<SystemTime>,
    ) -> Result<(), HistoryError>;

    /// The job exhausted its attempts and was handed to the dead-letter queue.
    async fn mark_dead_letter(&self, job_id: &str, reason: &str) -> Result<(), HistoryError>;
}
