//! Queue boundary: job views, lifecycle signals, and external seams.
//!
//! Everything the external queue shows this crate lives here, narrowed into
//! fixed shapes at the boundary (raw queue payloads never travel further).
//!
//! ## Contents
//! - [`Job`], [`JobOpts`], [`JobPayload`], [`ProgressPayload`] — read-only
//!   views of queue-owned data
//! - [`QueueSignal`] — one lifecycle callback, as the adapter forwards it
//! - [`QueueSource`] — job lookup and per-state depth counts
//! - [`DeadLetterQueue`], [`DeadLetterRecord`] — handoff for exhausted jobs,
//!   the only call flowing back toward the queue

mod job;
mod signal;
mod source;

pub use job::{Job, JobOpts, JobPayload, ProgressPayload};
pub use signal::QueueSignal;
pub use source::{DeadLetterQueue, DeadLetterRecord, QueueDepths, QueueSource};
