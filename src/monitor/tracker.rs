//! # JobMonitor: the state tracker orchestrating the pipeline.
//!
//! One [`JobMonitor`] sits beside one queue. It consumes the queue's
//! lifecycle signals, maintains per-job timing state, computes retry
//! schedules, publishes enriched [`JobEvent`]s, updates metrics, drives the
//! alert service, and performs the dead-letter handoff for exhausted jobs.
//!
//! ## Event flow
//! ```text
//! queue adapter ──QueueSignal──► JobMonitor::handle()
//!     │ waiting   ─► lookup job ─► publish `waiting`            ─► depths*
//!     │ active    ─► start clock ─► publish `processing`        ─► history*, depths*
//!     │ progress  ─► normalize   ─► publish `progress`          ─► history*
//!     │ completed ─► stop clock  ─► publish `completed`         ─► history*, streak reset*, depths*
//!     │ failed    ─► stop clock ─► backoff ─► publish `retrying`/`failed`
//!     │              └─ exhausted ─► publish `dead-lettered`    ─► history*, dead-letter*, alert*, depths*
//!     │ stalled   ─► publish `retrying` (worker-resources hint)
//!     │ error     ─► worker-ready gauge = false
//!     └ ready     ─► worker-ready gauge = true
//!
//!     (*) detached best-effort tasks; failures are logged, never propagated
//! ```
//!
//! ## Rules
//! - The fast path (state mutation + event publish) runs in signal arrival
//!   order, so one subscriber observes a single job's events in the order
//!   the queue emitted them.
//! - All I/O side effects run as detached tasks; a slow history store or
//!   webhook never stalls dispatch of the next signal.
//! - Nothing escapes [`JobMonitor::handle`]: internal errors are logged with
//!   job context, and the listener additionally catches panics, so a bug
//!   here can never crash the queue's event loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use futures::FutureExt;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::alerts::AlertService;
use crate::config::MonitorConfig;
use crate::events::{EventBus, JobEvent, JobStatus};
use crate::metrics::{MetricsCollector, Outcome};
use crate::policies::next_retry_at;
use crate::queue::{DeadLetterQueue, DeadLetterRecord, Job, ProgressPayload, QueueSignal, QueueSource};

use super::hints::{hints_for, HINT_STALLED};
use super::history::JobHistoryStore;

/// Orchestrates observability for one queue. Construct with
/// [`JobMonitor::new`]; all methods take `&Arc<Self>` because side effects
/// run on detached tasks holding their own handle.
pub struct JobMonitor {
    queue: Arc<dyn QueueSource>,
    history: Arc<dyn JobHistoryStore>,
    dead_letters: Arc<dyn DeadLetterQueue>,
    alerts: Arc<AlertService>,
    metrics: Arc<MetricsCollector>,
    bus: EventBus,
    /// Attempt start instants keyed by job id, for duration computation.
    started: RwLock<HashMap<String, Instant>>,
    long_running_jobs: Vec<String>,
    poll_interval: Duration,
}

impl JobMonitor {
    /// Wires a monitor to its collaborators.
    pub fn new(
        cfg: &MonitorConfig,
        queue: Arc<dyn QueueSource>,
        history: Arc<dyn JobHistoryStore>,
        dead_letters: Arc<dyn DeadLetterQueue>,
        alerts: Arc<AlertService>,
        metrics: Arc<MetricsCollector>,
    ) -> Arc<Self> {
        Arc::new(Self {
            queue,
            history,
            dead_letters,
            alerts,
            metrics,
            bus: EventBus::new(cfg.bus_capacity_clamped()),
            started: RwLock::new(HashMap::new()),
            long_running_jobs: cfg.long_running_jobs.clone(),
            poll_interval: cfg.metrics_poll_interval,
        })
    }

    /// The bus live status events are published to.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// The metrics collector this monitor feeds.
    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// Handles one queue lifecycle signal.
    ///
    /// Safe to call concurrently for different jobs; per-job event ordering
    /// follows the order in which this is called for that job.
    pub async fn handle(self: &Arc<Self>, signal: QueueSignal) {
        match signal {
            QueueSignal::Waiting { job_id } => self.on_waiting(&job_id).await,
            QueueSignal::Active { job } => self.on_active(job).await,
            QueueSignal::Progress { job, progress } => self.on_progress(job, progress),
            QueueSignal::Completed { job } => self.on_completed(job).await,
            QueueSignal::Failed { job, error } => self.on_failed(job, error).await,
            QueueSignal::Stalled { job } => self.on_stalled(&job),
            QueueSignal::Errored { message } => self.on_queue_error(&message).await,
            QueueSignal::Ready => self.on_queue_ready().await,
        }
    }

    /// Spawns a dispatch loop draining queue signals until the channel
    /// closes or the token is cancelled.
    ///
    /// The loop processes signals in arrival order (preserving per-job event
    /// ordering) and additionally absorbs panics from handler bugs so the
    /// adapter feeding the channel is never poisoned.
    pub fn spawn_listener(
        self: &Arc<Self>,
        mut signals: mpsc::Receiver<QueueSignal>,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    sig = signals.recv() => {
                        let Some(sig) = sig else { break };
                        let fut = monitor.handle(sig);
                        if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                            log::error!(
                                target: "jobwatch::monitor",
                                "signal handler panicked: {panic:?}"
                            );
                        }
                    }
                }
            }
            log::debug!(target: "jobwatch::monitor", "signal listener stopped");
        })
    }

    /// Spawns the background queue-depth poller for this monitor's queue,
    /// using the configured poll interval.
    pub fn spawn_depth_poller(self: &Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        MetricsCollector::spawn_poller(
            Arc::clone(&self.metrics),
            Arc::clone(&self.queue),
            self.poll_interval,
            token,
        )
    }

    async fn on_waiting(self: &Arc<Self>, job_id: &str) {
        let job = match self.queue.job(job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                log::warn!(
                    target: "jobwatch::monitor",
                    "waiting callback for unknown job {job_id}"
                );
                return;
            }
            Err(err) => {
                log::warn!(
                    target: "jobwatch::monitor",
                    "job lookup failed for {job_id}: {err} ({})",
                    err.as_label()
                );
                return;
            }
        };

        self.bus.publish(JobEvent::for_job(JobStatus::Waiting, &job));
        self.refresh_depths();
    }

    async fn on_active(self: &Arc<Self>, job: Job) {
        self.started
            .write()
            .await
            .insert(job.id.clone(), Instant::now());

        let long_running = self.long_running_jobs.iter().any(|name| *name == job.name);
        self.bus.publish(
            JobEvent::for_job(JobStatus::Processing, &job)
                .with_hints(hints_for(JobStatus::Processing, long_running)),
        );

        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = monitor.history.mark_processing(&job.id).await {
                log::warn!(
                    target: "jobwatch::monitor",
                    "history mark_processing failed for job {}: {err}",
                    job.id
                );
            }
        });
        self.refresh_depths();
    }

    // High-frequency callback: no depth refresh here.
    fn on_progress(self: &Arc<Self>, job: Job, progress: ProgressPayload) {
        let value = progress.normalize();
        self.bus
            .publish(JobEvent::for_job(JobStatus::Progress, &job).with_progress(value));

        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = monitor.history.record_progress(&job.id, value).await {
                log::warn!(
                    target: "jobwatch::monitor",
                    "history record_progress failed for job {}: {err}",
                    job.id
                );
            }
        });
    }

    async fn on_completed(self: &Arc<Self>, job: Job) {
        let elapsed = self.take_started(&job.id).await;
        self.metrics
            .record_duration(&job.queue, &job.name, Outcome::Completed, elapsed.as_secs_f64())
            .await;

        self.bus.publish(
            JobEvent::for_job(JobStatus::Completed, &job).with_attempt(job.attempts_made.max(1)),
        );

        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = monitor.history.mark_completed(&job.id, elapsed).await {
                log::warn!(
                    target: "jobwatch::monitor",
                    "history mark_completed failed for job {}: {err}",
                    job.id
                );
            }
            monitor.alerts.record_success(&job).await;
        });
        self.refresh_depths();
    }

    async fn on_failed(self: &Arc<Self>, job: Job, error: String) {
        let elapsed = self.take_started(&job.id).await;
        self.metrics
            .record_duration(&job.queue, &job.name, Outcome::Failed, elapsed.as_secs_f64())
            .await;
        self.metrics.increment_failure(&job.queue, &job.name).await;

        let next_retry = if job.attempts_remaining() > 0 {
            next_retry_at(
                job.opts.backoff.as_ref(),
                job.attempts_made,
                job.attempts_allowed(),
                SystemTime::now(),
            )
        } else {
            None
        };
        let status = if next_retry.is_some() {
            JobStatus::Retrying
        } else {
            JobStatus::Failed
        };
        let attempt = job.attempts_made.max(1);

        let mut event = JobEvent::for_job(status, &job)
            .with_attempt(attempt)
            .with_message(error.clone())
            .with_hints(hints_for(status, false));
        if let Some(at) = next_retry {
            event = event.with_next_retry(at);
        }
        self.bus.publish(event);

        let terminal = next_retry.is_none();
        if terminal {
            log::warn!(
                target: "jobwatch::monitor",
                "job {} ({}) exhausted {} attempts; dead-lettering: {error}",
                job.id,
                job.name,
                job.attempts_allowed()
            );
            self.bus.publish(
                JobEvent::for_job(JobStatus::DeadLettered, &job)
                    .with_attempt(attempt)
                    .with_message(error.clone())
                    .with_hints(hints_for(JobStatus::DeadLettered, false)),
            );
        } else {
            self.metrics.increment_retry(&job.queue, &job.name).await;
        }

        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = monitor
                .history
                .mark_failure(&job.id, &error, status, next_retry)
                .await
            {
                log::warn!(
                    target: "jobwatch::monitor",
                    "history mark_failure failed for job {}: {err}",
                    job.id
                );
            }
            if !terminal {
                return;
            }
            if let Err(err) = monitor.history.mark_dead_letter(&job.id, &error).await {
                log::warn!(
                    target: "jobwatch::monitor",
                    "history mark_dead_letter failed for job {}: {err}",
                    job.id
                );
            }
            let record = DeadLetterRecord::from_job(&job, error.clone());
            if let Err(err) = monitor.dead_letters.push(record).await {
                log::error!(
                    target: "jobwatch::monitor",
                    "dead-letter enqueue failed for job {}: {err} ({})",
                    job.id,
                    err.as_label()
                );
            }
            monitor.alerts.record_failure(&job, &error).await;
        });
        self.refresh_depths();
    }

    // The queue redelivers stalled jobs on its own; this only reports.
    fn on_stalled(self: &Arc<Self>, job: &Job) {
        log::warn!(
            target: "jobwatch::monitor",
            "job {} ({}) stalled; the queue will redeliver it",
            job.id,
            job.name
        );
        self.bus.publish(
            JobEvent::for_job(JobStatus::Retrying, job).with_hints(vec![HINT_STALLED]),
        );
    }

    async fn on_queue_error(self: &Arc<Self>, message: &str) {
        log::error!(
            target: "jobwatch::monitor",
            "queue {} reported an error: {message}",
            self.queue.name()
        );
        self.metrics.set_worker_ready(self.queue.name(), false).await;
    }

    async fn on_queue_ready(self: &Arc<Self>) {
        log::info!(
            target: "jobwatch::monitor",
            "queue {} worker connection ready",
            self.queue.name()
        );
        self.metrics.set_worker_ready(self.queue.name(), true).await;
    }

    /// Removes and returns the elapsed time since the job's attempt started,
    /// or zero when no start was recorded (e.g. monitor attached mid-flight).
    async fn take_started(&self, job_id: &str) -> Duration {
        self.started
            .write()
            .await
            .remove(job_id)
            .map(|at| at.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    /// Refreshes depth gauges on a detached task.
    fn refresh_depths(self: &Arc<Self>) {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            monitor
                .metrics
                .refresh_queue_depths(monitor.queue.as_ref())
                .await;
        });
    }
}
