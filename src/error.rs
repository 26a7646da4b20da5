//! Error types for the observability pipeline's external seams.
//!
//! Three enums, one per collaborator class:
//!
//! - [`QueueError`] — queue lookups, depth queries, dead-letter pushes.
//! - [`HistoryError`] — job-history store writes.
//! - [`AlertError`] — webhook alert delivery.
//!
//! None of these ever reach the queue adapter: every boundary in this crate
//! absorbs them (logged with job context). They exist so trait implementors
//! have a typed channel and so logs carry stable labels (`as_label`).

use thiserror::Error;

/// # Errors from the external queue.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum QueueError {
    /// The queue no longer knows the requested job id.
    #[error("job {id} not found")]
    JobNotFound {
        /// The id that was looked up.
        id: String,
    },

    /// The queue backend reported a failure (connection, protocol, storage).
    #[error("queue backend error: {message}")]
    Backend {
        /// Backend-supplied description.
        message: String,
    },
}

impl QueueError {
    /// Short stable label (snake_case) for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueError::JobNotFound { .. } => "queue_job_not_found",
            QueueError::Backend { .. } => "queue_backend",
        }
    }
}

/// # Errors from the durable job-history store.
///
/// History writes are best-effort; the monitor logs these and moves on.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HistoryError {
    /// The store rejected or could not persist a write.
    #[error("history store write failed: {message}")]
    WriteFailed {
        /// Store-supplied description.
        message: String,
    },
}

impl HistoryError {
    /// Short stable label (snake_case) for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HistoryError::WriteFailed { .. } => "history_write_failed",
        }
    }
}

/// # Errors from alert delivery.
///
/// A broken webhook must never affect queue processing; the alert service
/// logs these and swallows them.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AlertError {
    /// The webhook answered with a non-success status.
    #[error("webhook returned status {status}")]
    Status {
        /// HTTP status code returned by the webhook.
        status: u16,
    },

    /// The request itself failed (DNS, TLS, timeout, connect).
    #[error("webhook request failed: {source}")]
    Http {
        /// Underlying client error.
        #[from]
        source: reqwest::Error,
    },
}

impl AlertError {
    /// Short stable label (snake_case) for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            AlertError::Status { .. } => "alert_webhook_status",
            AlertError::Http { .. } => "alert_webhook_http",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        let err = QueueError::JobNotFound { id: "j-1".into() };
        assert_eq!(err.as_label(), "queue_job_not_found");
        assert_eq!(err.to_string(), "job j-1 not found");

        let err = HistoryError::WriteFailed {
            message: "timeout".into(),
        };
        assert_eq!(err.as_label(), "history_write_failed");

        let err = AlertError::Status { status: 500 };
        assert_eq!(err.as_label(), "alert_webhook_status");
        assert_eq!(err.to_string(), "webhook returned status 500");
    }
}
