//! # Read-only view of a queued job.
//!
//! The queue owns its jobs; this crate only narrows them into a fixed shape
//! at the boundary. [`Job`] carries exactly what the observability layer
//! needs: identity, payload identifiers, attempt counters, and the backoff
//! policy. Raw queue payloads never travel further into the pipeline.

use serde::{Deserialize, Serialize};

use crate::policies::BackoffPolicy;

/// Loosely-typed job payload, narrowed at the queue boundary.
///
/// Only `project_id` and `file_id` are meaningful to the monitor; everything
/// else rides along in `extra` so dead-letter records keep the full payload
/// for manual requeue.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JobPayload {
    /// Project the job relates to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// File the job relates to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    /// Remaining payload fields, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Per-job options the queue attached at enqueue time.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct JobOpts {
    /// Attempt budget. The queue treats 0 as 1; so does this crate.
    pub attempts: u32,
    /// Retry backoff policy; absent means a failure is terminal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff: Option<BackoffPolicy>,
}

impl Default for JobOpts {
    fn default() -> Self {
        Self {
            attempts: 1,
            backoff: None,
        }
    }
}

/// One unit of queued asynchronous work, as reported by the queue's
/// lifecycle callbacks. Never mutated by this crate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Job {
    /// Queue-assigned identifier.
    pub id: String,
    /// Job type name.
    pub name: String,
    /// Queue the job belongs to.
    pub queue: String,
    /// Narrowed payload.
    #[serde(default)]
    pub payload: JobPayload,
    /// Attempts the queue has made so far (monotonically non-decreasing).
    #[serde(default)]
    pub attempts_made: u32,
    /// Enqueue-time options.
    #[serde(default)]
    pub opts: JobOpts,
}

impl Job {
    /// Creates a job view with default payload and options (1 attempt, no
    /// backoff). Mostly useful for tests and adapters.
    pub fn new(id: impl Into<String>, name: impl Into<String>, queue: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            queue: queue.into(),
            payload: JobPayload::default(),
            attempts_made: 0,
            opts: JobOpts::default(),
        }
    }

    /// Attempt budget with the queue's zero-means-one convention applied.
    pub fn attempts_allowed(&self) -> u32 {
        self.opts.attempts.max(1)
    }

    /// Attempts still available before the job is dead-lettered.
    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_allowed().saturating_sub(self.attempts_made)
    }
}

/// Progress payload as the queue delivers it: either a bare number or an
/// object with a `value` field.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(untagged)]
pub enum ProgressPayload {
    /// `42.0`
    Value(f64),
    /// `{"value": 42.0}`
    Object {
        /// The progress number.
        value: f64,
    },
}

impl ProgressPayload {
    /// Normalizes to a number in 0–100.
    ///
    /// Out-of-range values are clamped and non-finite values collapse to 0;
    /// the queue does not validate what workers report.
    pub fn normalize(&self) -> f64 {
        let raw = match *self {
            ProgressPayload::Value(v) => v,
            ProgressPayload::Object { value } => value,
        };
        if raw.is_finite() {
            raw.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}
