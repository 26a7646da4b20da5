//! Lifecycle events: data model and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by the job monitor.
//!
//! ## Contents
//! - [`JobStatus`], [`JobEvent`] — event classification and payload metadata
//! - [`EventBus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publisher**: `JobMonitor` (one event per observed queue transition).
//! - **Consumers**: the SSE endpoint backing the operator dashboard, the
//!   `SubscriberSet` bridge (logging and other in-process observers), tests.

mod bus;
mod event;

pub(crate) use event::epoch_ms;

pub use bus::EventBus;
pub use event::{JobEvent, JobStatus};
