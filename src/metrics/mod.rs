//! Queue health metrics: gauges, counters, rolling windows, and the poller.
//!
//! ## Contents
//! - [`MetricsCollector`] — single owner of all pipeline metrics
//! - [`MetricsSnapshot`] — point-in-time copy for a metrics endpoint
//! - [`Outcome`], [`DurationStats`] — duration aggregation labels/values
//!
//! ## Quick wiring
//! ```text
//! JobMonitor ──► record_duration / increment_failure / increment_retry
//!            ──► set_worker_ready (queue-level error/ready callbacks)
//!            ──► refresh_queue_depths (after most transitions, detached)
//! spawn_poller ─► refresh_queue_depths every poll interval (cancellable)
//! snapshot() ──► dashboard / metrics endpoint
//! ```

mod collector;

pub use collector::{DurationStats, MetricsCollector, MetricsSnapshot, Outcome};
