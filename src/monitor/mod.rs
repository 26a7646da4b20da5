//! Job state tracking: the orchestrator and its external write seams.
//!
//! ## Contents
//! - [`JobMonitor`] — consumes queue lifecycle signals, maintains per-job
//!   timing state, publishes events, feeds metrics and alerts, performs the
//!   dead-letter handoff
//! - [`JobHistoryStore`] — write-side contract of the durable history store
//! - [`hints`] — operator hints attached to events
//!
//! See `tracker.rs` for the full signal-flow diagram.

pub mod hints;

mod history;
mod tracker;

pub use history::JobHistoryStore;
pub use tracker::JobMonitor;
