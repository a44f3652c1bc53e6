//! Scheduler configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Concurrency and polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum number of converter processes running at once.
    #[serde(default = "default_admission_limit")]
    pub admission_limit: usize,

    /// Delay between two progress checks (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_admission_limit() -> usize {
    3
}

fn default_poll_interval() -> u64 {
    2000 // 2 seconds
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            admission_limit: default_admission_limit(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl SchedulerConfig {
    /// Sets the admission limit.
    pub fn with_admission_limit(mut self, limit: usize) -> Self {
        self.admission_limit = limit;
        self
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.admission_limit, 3);
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SchedulerConfig = toml::from_str("admission_limit = 8").unwrap();
        assert_eq!(config.admission_limit, 8);
        assert_eq!(config.poll_interval_ms, 2000);
    }

    #[test]
    fn test_builder() {
        let config = SchedulerConfig::default()
            .with_admission_limit(1)
            .with_poll_interval(Duration::from_millis(50));
        assert_eq!(config.admission_limit, 1);
        assert_eq!(config.poll_interval_ms, 50);
    }
}
