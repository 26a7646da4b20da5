//! # Pipeline configuration.
//!
//! [`MonitorConfig`] centralizes the tunables of the observability pipeline.
//! It is used in two ways:
//! 1. **Monitor creation**: `JobMonitor::new(&config, ...)`
//! 2. **Alert service creation**: `AlertService::from_config(&config)`
//!
//! ## Sentinel values
//! - `webhook_url = None` → alerting disabled entirely
//! - `bus_capacity` below 1 → clamped to 1 by the bus
//!
//! ## Environment variables ([`MonitorConfig::from_env`])
//! | Variable                      | Field                   | Default  |
//! |-------------------------------|-------------------------|----------|
//! | `JOBWATCH_ALERT_THRESHOLD`    | `alert_threshold`       | 3        |
//! | `JOBWATCH_ALERT_COOLDOWN_MS`  | `alert_cooldown`        | 900000   |
//! | `JOBWATCH_ALERT_WEBHOOK_URL`  | `webhook_url`           | unset    |
//! | `JOBWATCH_METRICS_POLL_MS`    | `metrics_poll_interval` | 10000    |
//! | `JOBWATCH_BUS_CAPACITY`       | `bus_capacity`          | 1024     |
//! | `JOBWATCH_LONG_RUNNING_JOBS`  | `long_running_jobs`     | analyze-project |
//!
//! Unparseable values fall back to the default with a warning; they never
//! abort startup.

use std::time::Duration;

/// Configuration for the job monitor, alert service, and metrics poller.
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    /// Consecutive failures for one (job type, project) key before an alert
    /// is considered.
    pub alert_threshold: u32,

    /// Minimum time between two alerts for the same key, regardless of how
    /// many failures occur inside the window.
    pub alert_cooldown: Duration,

    /// Webhook URL alerts are POSTed to. `None` disables alerting: failure
    /// streaks are still tracked, nothing is ever sent.
    pub webhook_url: Option<String>,

    /// Interval of the background queue-depth refresh.
    pub metrics_poll_interval: Duration,

    /// Event bus ring-buffer capacity. Slow subscribers lagging more than
    /// this many events skip the oldest ones.
    pub bus_capacity: usize,

    /// Job type names known to run long; their `processing` events carry a
    /// hint to watch third-party API quota and latency.
    pub long_running_jobs: Vec<String>,
}

impl Default for MonitorConfig {
    /// Default configuration:
    ///
    /// - `alert_threshold = 3`
    /// - `alert_cooldown = 15 min`
    /// - `webhook_url = None` (alerting disabled)
    /// - `metrics_poll_interval = 10s`
    /// - `bus_capacity = 1024`
    /// - `long_running_jobs = ["analyze-project"]`
    fn default() -> Self {
        Self {
            alert_threshold: 3,
            alert_cooldown: Duration::from_millis(900_000),
            webhook_url: None,
            metrics_poll_interval: Duration::from_millis(10_000),
            bus_capacity: 1024,
            long_running_jobs: vec!["analyze-project".to_string()],
        }
    }
}

impl MonitorConfig {
    /// Builds a configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            alert_threshold: env_parse("JOBWATCH_ALERT_THRESHOLD")
                .unwrap_or(defaults.alert_threshold),
            alert_cooldown: env_parse("JOBWATCH_ALERT_COOLDOWN_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.alert_cooldown),
            webhook_url: std::env::var("JOBWATCH_ALERT_WEBHOOK_URL")
                .ok()
                .filter(|v| !v.is_empty()),
            metrics_poll_interval: env_parse("JOBWATCH_METRICS_POLL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.metrics_poll_interval),
            bus_capacity: env_parse("JOBWATCH_BUS_CAPACITY").unwrap_or(defaults.bus_capacity),
            long_running_jobs: std::env::var("JOBWATCH_LONG_RUNNING_JOBS")
                .ok()
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.long_running_jobs),
        }
    }

    /// True when a webhook URL is configured.
    #[inline]
    pub fn alerting_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

/// Reads and parses one environment variable; warns (and returns `None`) on
/// values that fail to parse.
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!(
                target: "jobwatch::config",
                "ignoring unparseable {key}={raw:?}; using default"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let cfg = MonitorConfig::default();
        assert_eq!(cfg.alert_threshold, 3);
        assert_eq!(cfg.alert_cooldown, Duration::from_millis(900_000));
        assert_eq!(cfg.webhook_url, None);
        assert!(!cfg.alerting_enabled());
        assert_eq!(cfg.metrics_poll_interval, Duration::from_millis(10_000));
        assert_eq!(cfg.bus_capacity, 1024);
        assert_eq!(cfg.long_running_jobs, vec!["analyze-project".to_string()]);
    }

    #[test]
    fn test_bus_capacity_clamps_to_one() {
        let cfg = MonitorConfig {
            bus_capacity: 0,
            ..MonitorConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
