//! # In-process event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`]
//! fan-out, and the built-in [`LogWriter`] for handling lifecycle events
//! broadcast through the [`EventBus`](crate::events::EventBus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   JobMonitor ── publish(JobEvent) ──► EventBus ──► spawn_bridge task
//!                                                        │
//!                                                   SubscriberSet::emit
//!                                                   ┌────┴────┬────────┐
//!                                                   ▼         ▼        ▼
//!                                                LogWriter  Custom   ...
//! ```
//!
//! External consumers (e.g. an SSE endpoint) subscribe to the bus directly;
//! this module serves in-process consumers that want bounded queues and
//! panic isolation for free.

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
