//! # Failure-streak tracking and rate-limited alerting.
//!
//! [`AlertService`] watches consecutive failures per `(job type, project)`
//! key and pages a human through the configured [`AlertTransport`] when a
//! streak crosses the threshold. Alert storms are suppressed by a per-key
//! cooldown window.
//!
//! ## Rules
//! - One [`FailureRecord`] per key at any time; success for the key deletes it.
//! - An alert is never sent twice for one key inside the cooldown window,
//!   regardless of how many failures occur inside it.
//! - Without a configured transport, streaks are still tracked but nothing
//!   is ever delivered.
//! - Delivery failures are logged and swallowed; nothing here ever
//!   propagates to the caller.
//!
//! The streak map is the only shared mutable state. The lock covers map
//! mutation only, never transport I/O: the send slot for a key is claimed
//! (timestamp recorded) before the webhook call so concurrent failures of
//! the same key cannot double-send.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::RwLock;

use crate::config::MonitorConfig;
use crate::events::epoch_ms;
use crate::queue::Job;

use super::transport::{AlertPayload, AlertTransport, WebhookTransport};

/// Consecutive-failure streak for one (job type, project) key.
#[derive(Debug, Clone)]
struct FailureRecord {
    /// Consecutive failures observed since the last success.
    consecutive: u32,
    /// When the last alert for this key was sent.
    last_notified: Option<SystemTime>,
}

/// Tracks failure streaks and triggers rate-limited notifications.
pub struct AlertService {
    threshold: u32,
    cooldown: Duration,
    transport: Option<Arc<dyn AlertTransport>>,
    streaks: RwLock<HashMap<String, FailureRecord>>,
}

impl AlertService {
    /// Creates a service with explicit threshold, cooldown, and transport.
    /// `transport = None` disables delivery while still tracking streaks.
    pub fn new(
        threshold: u32,
        cooldown: Duration,
        transport: Option<Arc<dyn AlertTransport>>,
    ) -> Self {
        Self {
            threshold: threshold.max(1),
            cooldown,
            transport,
            streaks: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a service from configuration, wiring a [`WebhookTransport`]
    /// when a webhook URL is present.
    pub fn from_config(cfg: &MonitorConfig) -> Self {
        let transport = cfg
            .webhook_url
            .as_ref()
            .map(|url| Arc::new(WebhookTransport::new(url.clone())) as Arc<dyn AlertTransport>);
        Self::new(cfg.alert_threshold, cfg.alert_cooldown, transport)
    }

    fn key(job: &Job) -> String {
        let project = job.payload.project_id.as_deref().unwrap_or("none");
        format!("{}:{project}", job.name)
    }

    /// Clears the failure streak for this job's key. Never fails visibly.
    pub async fn record_success(&self, job: &Job) {
        let key = Self::key(job);
        if self.streaks.write().await.remove(&key).is_some() {
            log::debug!(target: "jobwatch::alerts", "failure streak cleared for {key}");
        }
    }

    /// Records one failure for this job's key and sends an alert when the
    /// streak crosses the threshold outside the cooldown window.
    pub async fn record_failure(&self, job: &Job, error: &str) {
        let key = Self::key(job);
        let now = SystemTime::now();

        // Increment and decide under one lock; claim the send slot before
        // any I/O so concurrent failures of the same key cannot double-send.
        let send_count = {
            let mut streaks = self.streaks.write().await;
            let record = streaks.entry(key.clone()).or_insert(FailureRecord {
                consecutive: 0,
                last_notified: None,
            });
            record.consecutive += 1;

            if self.transport.is_none() || record.consecutive < self.threshold {
                None
            } else if record.last_notified.is_some_and(|last| {
                now.duration_since(last).unwrap_or(Duration::ZERO) < self.cooldown
            }) {
                log::debug!(
                    target: "jobwatch::alerts",
                    "alert for {key} suppressed by cooldown ({} consecutive failures)",
                    record.consecutive
                );
                None
            } else {
                record.last_notified = Some(now);
                Some(record.consecutive)
            }
        };

        let Some(consecutive) = send_count else {
            return;
        };
        // Presence checked under the lock above.
        let Some(transport) = self.transport.as_ref() else {
            return;
        };

        let payload = AlertPayload {
            message: format!(
                "job {} has failed {consecutive} times in a row for project {}",
                job.name,
                job.payload.project_id.as_deref().unwrap_or("none")
            ),
            job_id: job.id.clone(),
            job_name: job.name.clone(),
            queue: job.queue.clone(),
            attempts_made: job.attempts_made,
            max_attempts: job.attempts_allowed(),
            consecutive_failures: consecutive,
            error: error.to_string(),
            at_ms: epoch_ms(now),
        };

        if let Err(err) = transport.send(&payload).await {
            log::error!(
                target: "jobwatch::alerts",
                "alert delivery via {} failed for {key}: {err} ({})",
                transport.name(),
                err.as_label()
            );
        } else {
            log::info!(
                target: "jobwatch::alerts",
                "alert sent for {key} after {consecutive} consecutive failures"
            );
        }
    }

    /// Current streak length for a job's key (0 when no record exists).
    pub async fn streak(&self, job: &Job) -> u32 {
        self.streaks
            .read()
            .await
            .get(&Self::key(job))
            .map(|r| r.consecutive)
            .unwrap_or(0)
    }
}
