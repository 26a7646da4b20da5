//! # Point-in-time gauges and monotonic counters for queue health.
//!
//! [`MetricsCollector`] is the single owner of all pipeline metrics:
//! queue-depth gauges, worker-readiness flags, failure/retry counters,
//! duration aggregates, and rolling failure-rate windows. Everything is
//! behind one async `RwLock`; the lock is held only for map mutation, never
//! across I/O.
//!
//! ## Rules
//! - **Counters only increase**; calling an increment twice adds exactly 2.
//! - **Gauges are overwritten** on every refresh.
//! - **Rolling windows** keep outcome samples for 24h and report failure
//!   ratios over the trailing hour and day.
//!
//! The background depth poller ([`MetricsCollector::spawn_poller`]) is
//! advisory work: it exits promptly on cancellation and never keeps the
//! process alive past shutdown.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::queue::{QueueDepths, QueueSource};

/// How long outcome samples are retained for rolling failure rates.
const WINDOW_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);
/// Trailing window for the hourly failure rate.
const HOURLY_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Terminal outcome of one job attempt, used as a duration label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    /// The attempt finished successfully.
    Completed,
    /// The attempt failed.
    Failed,
}

impl Outcome {
    /// Short stable label for metric keys and logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::Failed => "failed",
        }
    }
}

/// Aggregate of observed durations for one (queue, job, outcome) key.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct DurationStats {
    /// Number of observations.
    pub count: u64,
    /// Sum of observed durations in seconds.
    pub total_secs: f64,
}

/// Point-in-time copy of all metrics, safe to serialize for an HTTP
/// metrics endpoint.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MetricsSnapshot {
    /// Depth gauges per queue name.
    pub depths: HashMap<String, QueueDepths>,
    /// Worker readiness per queue name.
    pub worker_ready: HashMap<String, bool>,
    /// Failure counters keyed `queue/job`.
    pub failures: HashMap<String, u64>,
    /// Retry counters keyed `queue/job`.
    pub retries: HashMap<String, u64>,
    /// Duration aggregates keyed `queue/job/outcome`.
    pub durations: HashMap<String, DurationStats>,
    /// Share of failed outcomes over the trailing hour (0 when idle).
    pub hourly_failure_rate: f64,
    /// Share of failed outcomes over the trailing day (0 when idle).
    pub daily_failure_rate: f64,
}

#[derive(Default)]
struct MetricsState {
    depths: HashMap<String, QueueDepths>,
    worker_ready: HashMap<String, bool>,
    failures: HashMap<String, u64>,
    retries: HashMap<String, u64>,
    durations: HashMap<String, DurationStats>,
    /// Timestamped terminal outcomes, pruned beyond [`WINDOW_RETENTION`].
    outcomes: VecDeque<(SystemTime, Outcome)>,
}

/// Owner of all pipeline metrics. Cheap to share via `Arc`.
#[derive(Default)]
pub struct MetricsCollector {
    state: RwLock<MetricsState>,
}

impl MetricsCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one attempt duration and feeds the rolling outcome windows.
    pub async fn record_duration(&self, queue: &str, job_name: &str, outcome: Outcome, secs: f64) {
        let key = format!("{queue}/{job_name}/{}", outcome.as_label());
        let now = SystemTime::now();
        let mut state = self.state.write().await;
        let stats = state.durations.entry(key).or_default();
        stats.count += 1;
        stats.total_secs += secs.max(0.0);
        state.outcomes.push_back((now, outcome));
        prune_outcomes(&mut state.outcomes, now);
    }

    /// Increments the failure counter for one (queue, job type) pair.
    pub async fn increment_failure(&self, queue: &str, job_name: &str) {
        let mut state = self.state.write().await;
        *state.failures.entry(pair_key(queue, job_name)).or_insert(0) += 1;
    }

    /// Increments the retry counter for one (queue, job type) pair.
    pub async fn increment_retry(&self, queue: &str, job_name: &str) {
        let mut state = self.state.write().await;
        *state.retries.entry(pair_key(queue, job_name)).or_insert(0) += 1;
    }

    /// Overwrites the worker-readiness gauge for a queue.
    pub async fn set_worker_ready(&self, queue: &str, ready: bool) {
        let mut state = self.state.write().await;
        state.worker_ready.insert(queue.to_string(), ready);
    }

    /// Reads current per-state counts from the queue and overwrites the
    /// depth gauges. Query failures are logged and leave the gauges as-is.
    pub async fn refresh_queue_depths(&self, queue: &dyn QueueSource) {
        match queue.depths().await {
            Ok(depths) => {
                let mut state = self.state.write().await;
                state.depths.insert(queue.name().to_string(), depths);
            }
            Err(err) => {
                log::warn!(
                    target: "jobwatch::metrics",
                    "depth query failed for queue {}: {err} ({})",
                    queue.name(),
                    err.as_label()
                );
            }
        }
    }

    /// Returns a point-in-time copy of all metrics, including rolling
    /// failure rates over the trailing hour and day.
    pub async fn snapshot(&self) -> MetricsSnapshot {
        let now = SystemTime::now();
        let state = self.state.read().await;
        MetricsSnapshot {
            depths: state.depths.clone(),
            worker_ready: state.worker_ready.clone(),
            failures: state.failures.clone(),
            retries: state.retries.clone(),
            durations: state.durations.clone(),
            hourly_failure_rate: failure_rate(&state.outcomes, HOURLY_WINDOW, now),
            daily_failure_rate: failure_rate(&state.outcomes, WINDOW_RETENTION, now),
        }
    }

    /// Spawns the background depth poller.
    ///
    /// Calls [`MetricsCollector::refresh_queue_depths`] once immediately and
    /// then every `interval` (clamped to at least 100ms) until the token is
    /// cancelled.
    pub fn spawn_poller(
        collector: Arc<Self>,
        queue: Arc<dyn QueueSource>,
        interval: Duration,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval.max(Duration::from_millis(100)));
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tick.tick() => {
                        collector.refresh_queue_depths(queue.as_ref()).await;
                    }
                }
            }
            log::debug!(target: "jobwatch::metrics", "depth poller stopped");
        })
    }
}

fn pair_key(queue: &str, job_name: &str) -> String {
    format!("{queue}/{job_name}")
}

fn prune_outcomes(outcomes: &mut VecDeque<(SystemTime, Outcome)>, now: SystemTime) {
    let cutoff = now - WINDOW_RETENTION;
    while let Some((at, _)) = outcomes.front() {
        if *at < cutoff {
            outcomes.pop_front();
        } else {
            break;
        }
    }
}

fn failure_rate(outcomes: &VecDeque<(SystemTime, Outcome)>, window: Duration, now: SystemTime) -> f64 {
    let cutoff = now - window;
    let mut total = 0u64;
    let mut failed = 0u64;
    for (at, outcome) in outcomes.iter().rev() {
        if *at < cutoff {
            break;
        }
        total += 1;
        if *outcome == Outcome::Failed {
            failed += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        failed as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};

    use crate::error::QueueError;
    use crate::queue::Job;

    struct FakeQueue {
        depth_calls: AtomicU64,
        fail: bool,
    }

    impl FakeQueue {
        fn new(fail: bool) -> Self {
            Self {
                depth_calls: AtomicU64::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl QueueSource for FakeQueue {
        fn name(&self) -> &str {
            "analysis"
        }

        async fn job(&self, _id: &str) -> Result<Option<Job>, QueueError> {
            Ok(None)
        }

        async fn depths(&self) -> Result<QueueDepths, QueueError> {
            self.depth_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(QueueError::Backend {
                    message: "connection reset".into(),
                });
            }
            Ok(QueueDepths {
                waiting: 3,
                active: 1,
                completed: 40,
                failed: 2,
                delayed: 1,
            })
        }
    }

    #[tokio::test]
    async fn test_failure_counter_is_monotonic() {
        let metrics = MetricsCollector::new();
        metrics.increment_failure("analysis", "analyze-project").await;
        metrics.increment_failure("analysis", "analyze-project").await;
        let snap = metrics.snapshot().await;
        assert_eq!(snap.failures["analysis/analyze-project"], 2);
    }

    #[tokio::test]
    async fn test_readiness_gauge_is_overwritten() {
        let metrics = MetricsCollector::new();
        metrics.set_worker_ready("analysis", true).await;
        metrics.set_worker_ready("analysis", false).await;
        let snap = metrics.snapshot().await;
        assert_eq!(snap.worker_ready["analysis"], false);
    }

    #[tokio::test]
    async fn test_durations_aggregate_per_outcome() {
        let metrics = MetricsCollector::new();
        metrics
            .record_duration("analysis", "analyze-project", Outcome::Completed, 1.5)
            .await;
        metrics
            .record_duration("analysis", "analyze-project", Outcome::Completed, 2.5)
            .await;
        metrics
            .record_duration("analysis", "analyze-project", Outcome::Failed, 0.5)
            .await;

        let snap = metrics.snapshot().await;
        let ok = snap.durations["analysis/analyze-project/completed"];
        assert_eq!(ok.count, 2);
        assert!((ok.total_secs - 4.0).abs() < f64::EPSILON);
        assert_eq!(snap.durations["analysis/analyze-project/failed"].count, 1);
    }

    #[tokio::test]
    async fn test_failure_rates_reflect_recent_outcomes() {
        let metrics = MetricsCollector::new();
        metrics
            .record_duration("analysis", "analyze-project", Outcome::Completed, 1.0)
            .await;
        metrics
            .record_duration("analysis", "analyze-project", Outcome::Failed, 1.0)
            .await;

        let snap = metrics.snapshot().await;
        assert!((snap.hourly_failure_rate - 0.5).abs() < f64::EPSILON);
        assert!((snap.daily_failure_rate - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_refresh_overwrites_depth_gauges() {
        let metrics = MetricsCollector::new();
        let queue = FakeQueue::new(false);
        metrics.refresh_queue_depths(&queue).await;
        let snap = metrics.snapshot().await;
        assert_eq!(snap.depths["analysis"].waiting, 3);
        assert_eq!(snap.depths["analysis"].completed, 40);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_previous_gauges() {
        let metrics = MetricsCollector::new();
        let ok = FakeQueue::new(false);
        let broken = FakeQueue::new(true);
        metrics.refresh_queue_depths(&ok).await;
        metrics.refresh_queue_depths(&broken).await;
        let snap = metrics.snapshot().await;
        assert_eq!(snap.depths["analysis"].waiting, 3);
    }

    #[tokio::test]
    async fn test_poller_refreshes_and_stops_on_cancel() {
        let metrics = Arc::new(MetricsCollector::new());
        let queue = Arc::new(FakeQueue::new(false));
        let token = CancellationToken::new();

        // Intervals below 100ms are clamped, so poll at the clamp floor.
        let handle = MetricsCollector::spawn_poller(
            Arc::clone(&metrics),
            Arc::clone(&queue) as Arc<dyn QueueSource>,
            Duration::from_millis(100),
            token.clone(),
        );

        tokio::time::sleep(Duration::from_millis(350)).await;
        token.cancel();
        handle.await.expect("poller joins");

        let calls = queue.depth_calls.load(Ordering::SeqCst);
        assert!(calls >= 2, "expected repeated refreshes, saw {calls}");

        // No further refreshes after cancellation.
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(queue.depth_calls.load(Ordering::SeqCst), calls);
    }
}
