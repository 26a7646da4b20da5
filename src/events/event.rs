//! # Lifecycle events emitted by the job monitor.
//!
//! [`JobStatus`] classifies the states a queued job passes through, and
//! [`JobEvent`] is the immutable record broadcast for every observed
//! transition. Events carry everything an operator dashboard needs: job
//! identity, attempt counters, optional progress, the computed next-retry
//! instant, the failure message, and operator hints.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Consumers that buffer or reorder can use `seq` to restore
//! the exact emission order.
//!
//! ## Serialization
//! Events serialize to JSON (kebab-case statuses, absent fields omitted) so
//! they can be pushed verbatim over a server-sent-events stream.
//!
//! ## Example
//! ```rust
//! use jobwatch::{JobEvent, JobStatus, Job};
//!
//! let job = Job::new("42", "analyze-project", "analysis");
//! let ev = JobEvent::for_job(JobStatus::Retrying, &job)
//!     .with_message("upstream timed out")
//!     .with_attempt(2);
//!
//! assert_eq!(ev.status, JobStatus::Retrying);
//! assert_eq!(ev.attempt, 2);
//! assert_eq!(ev.message.as_deref(), Some("upstream timed out"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::queue::Job;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Converts a wall-clock instant to milliseconds since the Unix epoch.
///
/// Instants before the epoch collapse to 0; they cannot occur for events
/// produced by this crate.
pub(crate) fn epoch_ms(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().min(u128::from(u64::MAX)) as u64)
        .unwrap_or(0)
}

/// State of a job as observed by the monitor.
///
/// The happy path is `Waiting → Processing → Progress* → Completed`. A failed
/// attempt resolves to `Retrying` when a retry is scheduled, `Failed` when it
/// is not, and a job that exhausted its attempt budget additionally reports
/// `DeadLettered` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    /// Job is queued and waiting for a worker.
    Waiting,
    /// A worker picked the job up and is executing an attempt.
    Processing,
    /// The running attempt reported a progress value (0–100).
    Progress,
    /// The attempt finished successfully.
    Completed,
    /// The attempt failed and a retry is scheduled.
    Retrying,
    /// The attempt failed and no retry could be scheduled.
    Failed,
    /// The job exhausted its attempts and was handed to the dead-letter queue.
    DeadLettered,
}

impl JobStatus {
    /// Short stable label (kebab-case) for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            JobStatus::Waiting => "waiting",
            JobStatus::Processing => "processing",
            JobStatus::Progress => "progress",
            JobStatus::Completed => "completed",
            JobStatus::Retrying => "retrying",
            JobStatus::Failed => "failed",
            JobStatus::DeadLettered => "dead-lettered",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One observed lifecycle transition, broadcast to all live subscribers.
///
/// Created once per transition and never mutated afterwards. Cloning is cheap:
/// string fields are `Arc<str>`.
#[derive(Clone, Debug, Serialize)]
pub struct JobEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Queue-assigned job identifier.
    pub job_id: Arc<str>,
    /// Job type name (e.g. `analyze-project`).
    pub job_name: Arc<str>,
    /// Name of the queue the job belongs to.
    pub queue: Arc<str>,
    /// Project the job relates to, when the payload carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Arc<str>>,
    /// File the job relates to, when the payload carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<Arc<str>>,
    /// Observed state.
    pub status: JobStatus,
    /// Attempt number this event refers to (1-based).
    pub attempt: u32,
    /// Attempt budget for the job.
    pub max_attempts: u32,
    /// Progress value in 0–100, only for [`JobStatus::Progress`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    /// Earliest retry instant (epoch ms), only when a retry was scheduled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_retry_ms: Option<u64>,
    /// Human-readable message (usually the failure reason).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Arc<str>>,
    /// Operator hints for the dashboard.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<&'static str>,
    /// Emission timestamp (epoch ms).
    pub at_ms: u64,
}

impl JobEvent {
    /// Creates an event for the given job with the current timestamp and the
    /// next global sequence number.
    ///
    /// The attempt number defaults to `attempts_made + 1` (the attempt the
    /// queue is about to run or is running); override with
    /// [`JobEvent::with_attempt`] for terminal transitions.
    pub fn for_job(status: JobStatus, job: &Job) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            job_id: Arc::from(job.id.as_str()),
            job_name: Arc::from(job.name.as_str()),
            queue: Arc::from(job.queue.as_str()),
            project_id: job.payload.project_id.as_deref().map(Arc::from),
            file_id: job.payload.file_id.as_deref().map(Arc::from),
            status,
            attempt: job.attempts_made.saturating_add(1),
            max_attempts: job.attempts_allowed(),
            progress: None,
            next_retry_ms: None,
            message: None,
            hints: Vec::new(),
            at_ms: epoch_ms(SystemTime::now()),
        }
    }

    /// Overrides the attempt number.
    #[inline]
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }

    /// Attaches a progress value.
    #[inline]
    pub fn with_progress(mut self, value: f64) -> Self {
        self.progress = Some(value);
        self
    }

    /// Attaches the computed next-retry instant.
    #[inline]
    pub fn with_next_retry(mut self, at: SystemTime) -> Self {
        self.next_retry_ms = Some(epoch_ms(at));
        self
    }

    /// Attaches a human-readable message.
    #[inline]
    pub fn with_message(mut self, message: impl Into<Arc<str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attaches operator hints.
    #[inline]
    pub fn with_hints(mut self, hints: Vec<&'static str>) -> Self {
        self.hints = hints;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Job;

    fn job() -> Job {
        let mut job = Job::new("j-1", "analyze-project", "analysis");
        job.payload.project_id = Some("p-9".into());
        job.attempts_made = 1;
        job.opts.attempts = 3;
        job
    }

    #[test]
    fn test_for_job_captures_identity_and_attempt() {
        let ev = JobEvent::for_job(JobStatus::Waiting, &job());
        assert_eq!(&*ev.job_id, "j-1");
        assert_eq!(&*ev.job_name, "analyze-project");
        assert_eq!(&*ev.queue, "analysis");
        assert_eq!(ev.project_id.as_deref(), Some("p-9"));
        assert_eq!(ev.file_id, None);
        assert_eq!(ev.attempt, 2);
        assert_eq!(ev.max_attempts, 3);
    }

    #[test]
    fn test_seq_is_strictly_increasing() {
        let j = job();
        let a = JobEvent::for_job(JobStatus::Waiting, &j);
        let b = JobEvent::for_job(JobStatus::Processing, &j);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_serializes_kebab_case_and_omits_absent_fields() {
        let ev = JobEvent::for_job(JobStatus::DeadLettered, &job()).with_message("boom");
        let json = serde_json::to_value(&ev).expect("event serializes");
        assert_eq!(json["status"], "dead-lettered");
        assert_eq!(json["message"], "boom");
        assert!(json.get("progress").is_none());
        assert!(json.get("next_retry_ms").is_none());
        assert!(json.get("hints").is_none());
        assert!(json.get("file_id").is_none());
    }

    #[test]
    fn test_with_next_retry_stores_epoch_ms() {
        let at = SystemTime::UNIX_EPOCH + std::time::Duration::from_millis(1_700_000_000_123);
        let ev = JobEvent::for_job(JobStatus::Retrying, &job()).with_next_retry(at);
        assert_eq!(ev.next_retry_ms, Some(1_700_000_000_123));
    }
}
