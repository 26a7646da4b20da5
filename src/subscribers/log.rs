//! # Logging subscriber: the pipeline's structured log glue.
//!
//! [`LogWriter`] renders every lifecycle event as a `key=value` log line via
//! the `log` facade, at a level matching the severity of the transition.
//!
//! ## Output format
//! ```text
//! INFO  job=analyze-project id=42 queue=analysis status=waiting attempt=1/3
//! INFO  job=analyze-project id=42 queue=analysis status=progress attempt=1/3 progress=50
//! WARN  job=analyze-project id=42 queue=analysis status=retrying attempt=1/3 next_retry_ms=... msg="boom"
//! ERROR job=analyze-project id=42 queue=analysis status=dead-lettered attempt=3/3 msg="boom"
//! ```

use async_trait::async_trait;

use crate::events::{JobEvent, JobStatus};

use super::subscribe::Subscribe;

/// Logs every lifecycle event through the `log` facade.
///
/// Levels: `completed`/`waiting`/`processing`/`progress` at info,
/// `retrying` at warn, `failed`/`dead-lettered` at error.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Creates a logging subscriber.
    pub fn new() -> Self {
        Self
    }

    fn line(event: &JobEvent) -> String {
        let mut line = format!(
            "job={} id={} queue={} status={} attempt={}/{}",
            event.job_name, event.job_id, event.queue, event.status, event.attempt, event.max_attempts
        );
        if let Some(project) = &event.project_id {
            line.push_str(&format!(" project={project}"));
        }
        if let Some(progress) = event.progress {
            line.push_str(&format!(" progress={progress}"));
        }
        if let Some(at) = event.next_retry_ms {
            line.push_str(&format!(" next_retry_ms={at}"));
        }
        if let Some(message) = &event.message {
            line.push_str(&format!(" msg={message:?}"));
        }
        line
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, event: &JobEvent) {
        const TARGET: &str = "jobwatch::events";
        match event.status {
            JobStatus::Failed | JobStatus::DeadLettered => {
                log::error!(target: TARGET, "{}", Self::line(event));
            }
            JobStatus::Retrying => {
                log::warn!(target: TARGET, "{}", Self::line(event));
            }
            _ => {
                log::info!(target: TARGET, "{}", Self::line(event));
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
