//! Failure-streak alerting: tracking, rate limiting, and delivery.
//!
//! ## Contents
//! - [`AlertService`] — consecutive-failure streaks per (job type, project)
//!   key, threshold + cooldown gating
//! - [`AlertTransport`] — delivery seam; [`WebhookTransport`] POSTs JSON
//! - [`AlertPayload`] — what a receiving channel gets
//!
//! ## Quick wiring
//! ```text
//! JobMonitor on `completed` ──► AlertService::record_success (streak reset)
//! JobMonitor on dead-letter ──► AlertService::record_failure
//!      └─► streak >= threshold && outside cooldown
//!           └─► AlertTransport::send(AlertPayload)   (failures logged only)
//! ```

mod service;
mod transport;

pub use service::AlertService;
pub use transport::{AlertPayload, AlertTransport, WebhookTransport};
