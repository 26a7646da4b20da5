//! # jobwatch
//!
//! **jobwatch** is a job-lifecycle observability and alerting pipeline that
//! sits beside an asynchronous job queue. It observes every state transition
//! a queued unit of work passes through, computes retry schedules, detects
//! repeated failures worth paging a human about, publishes live status to
//! any number of subscribers, and hands permanently-failed work to a
//! dead-letter path.
//!
//! The queue itself (enqueue, dequeue, workers, persistence), the durable
//! job-history store, log sinks, and the receiving end of the alert webhook
//! are external collaborators, modeled as traits at the boundary.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                 ┌────────────────────────────────────────────┐
//!                 │  external queue (adapter registers once)   │
//!                 └──────────────────┬─────────────────────────┘
//!                         QueueSignal│ waiting/active/progress/
//!                                    │ completed/failed/stalled/error/ready
//!                                    ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  JobMonitor (state tracker)                                       │
//! │  - per-job start instants (duration computation)                  │
//! │  - next_retry_at() per BackoffPolicy on failure                   │
//! │  - dead-letter handoff when the attempt budget is exhausted       │
//! └───┬──────────────┬──────────────┬──────────────┬───────────┬──────┘
//!     ▼              ▼              ▼              ▼           ▼
//!  EventBus    MetricsCollector  AlertService  JobHistory  DeadLetter
//! (broadcast)  (gauges/counters) (streaks +    Store*      Queue*
//!     │         ▲                 webhook*)
//!     │         └── depth poller (cancellable background task)
//!     ├────────► SSE endpoint / ad-hoc receivers
//!     └────────► SubscriberSet bridge ─► LogWriter, custom subscribers
//!
//!  (*) external collaborators behind traits; all calls best-effort
//! ```
//!
//! ### Guarantees
//! - Data flows one direction; the dead-letter enqueue is the only call
//!   back toward queue territory.
//! - Per-job event ordering follows the queue's emission order; attempt
//!   numbers are non-decreasing per job.
//! - An alert for one (job type, project) key is never sent twice inside
//!   the cooldown window.
//! - Nothing in this crate throws to the queue adapter: every boundary
//!   absorbs and logs its own failures.
//!
//! ## Features
//! | Area           | Description                                              | Key types / traits                       |
//! |----------------|----------------------------------------------------------|------------------------------------------|
//! | **Monitoring** | Track job state, durations, retries, dead-letter handoff.| [`JobMonitor`], [`QueueSignal`]          |
//! | **Events**     | Broadcast enriched lifecycle events to live observers.   | [`EventBus`], [`JobEvent`], [`JobStatus`]|
//! | **Backoff**    | Compute next-retry instants from queue policies.         | [`BackoffPolicy`], [`next_retry_at`]     |
//! | **Metrics**    | Depth gauges, counters, rolling failure rates, poller.   | [`MetricsCollector`], [`MetricsSnapshot`]|
//! | **Alerting**   | Failure streaks, cooldown gating, webhook delivery.      | [`AlertService`], [`AlertTransport`]     |
//! | **Subscribers**| Bounded, panic-isolated in-process fan-out.              | [`Subscribe`], [`SubscriberSet`]         |
//! | **Config**     | Env-style tunables with documented defaults.             | [`MonitorConfig`]                        |
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//! use jobwatch::{
//!     AlertService, JobMonitor, MetricsCollector, MonitorConfig,
//!     DeadLetterQueue, JobHistoryStore, QueueSignal, QueueSource,
//! };
//!
//! async fn run(
//!     queue: Arc<dyn QueueSource>,
//!     history: Arc<dyn JobHistoryStore>,
//!     dead_letters: Arc<dyn DeadLetterQueue>,
//! ) {
//!     let cfg = MonitorConfig::from_env();
//!     let alerts = Arc::new(AlertService::from_config(&cfg));
//!     let metrics = Arc::new(MetricsCollector::new());
//!     let monitor = JobMonitor::new(&cfg, queue, history, dead_letters, alerts, metrics);
//!
//!     // The queue adapter forwards each lifecycle callback as one signal.
//!     let (tx, rx) = mpsc::channel::<QueueSignal>(256);
//!     let shutdown = CancellationToken::new();
//!     let listener = monitor.spawn_listener(rx, shutdown.clone());
//!     let poller = monitor.spawn_depth_poller(shutdown.clone());
//!
//!     // An SSE endpoint would hold `monitor.bus().subscribe()` per client.
//!     let live = monitor.bus().subscribe();
//!     drop((tx, live));
//!
//!     shutdown.cancel();
//!     let _ = listener.await;
//!     let _ = poller.await;
//! }
//! ```

mod alerts;
mod config;
mod error;
mod events;
mod metrics;
mod monitor;
mod policies;
mod queue;
mod subscribers;

// ---- Public re-exports ----

pub use alerts::{AlertPayload, AlertService, AlertTransport, WebhookTransport};
pub use config::MonitorConfig;
pub use error::{AlertError, HistoryError, QueueError};
pub use events::{EventBus, JobEvent, JobStatus};
pub use metrics::{DurationStats, MetricsCollector, MetricsSnapshot, Outcome};
pub use monitor::{hints, JobHistoryStore, JobMonitor};
pub use policies::{next_retry_at, BackoffPolicy};
pub use queue::{
    DeadLetterQueue, DeadLetterRecord, Job, JobOpts, JobPayload, ProgressPayload, QueueDepths,
    QueueSignal, QueueSource,
};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
