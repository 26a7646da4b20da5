//! Retry scheduling policies.
//!
//! This module holds the knob that controls **how long** the queue waits
//! before redelivering a failed job.
//!
//! ## Contents
//! - [`BackoffPolicy`] — fixed or exponential retry delay, as stored in the
//!   queue's job options
//! - [`next_retry_at`] — pure computation of the next retry instant
//!
//! ## Quick wiring
//! ```text
//! Job.opts.backoff: Option<BackoffPolicy>
//!      └─► monitor::JobMonitor on `failed`:
//!           - next_retry_at(policy, attempts_made, attempts_allowed, now)
//!           - Some(at) → status `retrying`, event carries the instant
//!           - None     → status `failed`, dead-letter path
//! ```

mod backoff;

pub use backoff::{next_retry_at, BackoffPolicy};
