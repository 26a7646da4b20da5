//! # Alert delivery seam and the webhook transport.
//!
//! [`AlertTransport`] is the extension point for delivering alert payloads to
//! the outside world; [`WebhookTransport`] is the production implementation,
//! POSTing the payload as JSON to a configured URL.
//!
//! Transports report failures as [`AlertError`]; the alert service logs and
//! swallows them, so a broken webhook can never affect queue processing.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AlertError;

/// Notification sent when a failure streak crosses the alert threshold.
#[derive(Clone, Debug, Serialize)]
pub struct AlertPayload {
    /// Human-readable summary for the receiving channel.
    pub message: String,
    /// Queue-assigned job id of the failure that tripped the alert.
    pub job_id: String,
    /// Job type name.
    pub job_name: String,
    /// Queue the job belongs to.
    pub queue: String,
    /// Attempts the queue had made when the alert fired.
    pub attempts_made: u32,
    /// Attempt budget for the job.
    pub max_attempts: u32,
    /// Consecutive failures recorded for the (job type, project) key.
    pub consecutive_failures: u32,
    /// Serialized failure reason.
    pub error: String,
    /// Alert timestamp (epoch ms).
    pub at_ms: u64,
}

/// Contract for alert delivery.
#[async_trait]
pub trait AlertTransport: Send + Sync + 'static {
    /// Delivers one alert payload.
    async fn send(&self, payload: &AlertPayload) -> Result<(), AlertError>;

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// POSTs alert payloads as JSON to a webhook URL.
pub struct WebhookTransport {
    client: reqwest::Client,
    url: String,
}

impl WebhookTransport {
    /// Creates a transport targeting the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl AlertTransport for WebhookTransport {
    async fn send(&self, payload: &AlertPayload) -> Result<(), AlertError> {
        let response = self.client.post(&self.url).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_serializes_flat_json() {
        let payload = AlertPayload {
            message: "job analyze-project failing repeatedly".into(),
            job_id: "j-1".into(),
            job_name: "analyze-project".into(),
            queue: "analysis".into(),
            attempts_made: 3,
            max_attempts: 3,
            consecutive_failures: 3,
            error: "upstream timed out".into(),
            at_ms: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&payload).expect("payload serializes");
        assert_eq!(json["job_name"], "analyze-project");
        assert_eq!(json["consecutive_failures"], 3);
        assert_eq!(json["at_ms"], 1_700_000_000_000u64);
    }
}
