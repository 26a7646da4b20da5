//! # Operator hints attached to lifecycle events.
//!
//! Hints are short, static strings a dashboard can surface next to an event
//! so an operator knows what to look at without reading runbooks.

use crate::events::JobStatus;

/// Attached to `retrying` events.
pub const HINT_RETRYING: &str = "monitor the retry countdown; check logs if it fails again";

/// Attached to `failed` and `dead-lettered` events.
pub const HINT_FAILED: &str =
    "inspect the payload and recent logs; consider a requeue from the dead-letter queue once resolved";

/// Attached to `processing` events for configured long-running job types.
pub const HINT_LONG_RUNNING: &str =
    "long-running job type; watch third-party API quota and latency";

/// Attached to the `retrying` event published for a stalled job.
pub const HINT_STALLED: &str =
    "job stalled mid-attempt; check worker CPU and memory pressure";

/// Hints for a status. `long_running` marks job types configured as such.
pub fn hints_for(status: JobStatus, long_running: bool) -> Vec<&'static str> {
    match status {
        JobStatus::Retrying => vec![HINT_RETRYING],
        JobStatus::Failed | JobStatus::DeadLettered => vec![HINT_FAILED],
        JobStatus::Processing if long_running => vec![HINT_LONG_RUNNING],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hints_follow_status() {
        assert_eq!(hints_for(JobStatus::Retrying, false), vec![HINT_RETRYING]);
        assert_eq!(hints_for(JobStatus::Failed, false), vec![HINT_FAILED]);
        assert_eq!(hints_for(JobStatus::DeadLettered, false), vec![HINT_FAILED]);
        assert_eq!(
            hints_for(JobStatus::Processing, true),
            vec![HINT_LONG_RUNNING]
        );
        assert!(hints_for(JobStatus::Processing, false).is_empty());
        assert!(hints_for(JobStatus::Waiting, false).is_empty());
    }
}
