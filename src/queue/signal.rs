//! # Lifecycle signals delivered by the queue adapter.
//!
//! The queue library exposes callback-style registration (`.on(event, ...)`).
//! An adapter performs that registration once at startup and forwards each
//! callback as one [`QueueSignal`] into the monitor's channel, preserving the
//! queue's per-job emission order.

use super::job::{Job, ProgressPayload};

/// One queue lifecycle callback, translated to a value the monitor consumes.
#[derive(Clone, Debug)]
pub enum QueueSignal {
    /// A job entered the waiting state. The queue's callback only carries the
    /// id; the monitor looks the job up via [`QueueSource`](super::QueueSource).
    Waiting {
        /// Queue-assigned job id.
        job_id: String,
    },
    /// A worker started an attempt.
    Active {
        /// The job as the queue reported it.
        job: Job,
    },
    /// The running attempt reported progress.
    Progress {
        /// The job as the queue reported it.
        job: Job,
        /// Raw progress payload (bare number or `{value}` object).
        progress: ProgressPayload,
    },
    /// The attempt finished successfully.
    Completed {
        /// The job as the queue reported it.
        job: Job,
    },
    /// The attempt failed.
    Failed {
        /// The job as the queue reported it.
        job: Job,
        /// Failure reason from the worker.
        error: String,
    },
    /// The queue detected a stalled attempt and will redeliver the job.
    Stalled {
        /// The job as the queue reported it.
        job: Job,
    },
    /// Queue-level error not tied to any single job.
    Errored {
        /// Error description from the queue library.
        message: String,
    },
    /// The queue's worker connection is ready.
    Ready,
}
