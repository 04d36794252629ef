//! Replica configuration.

use std::time::Duration;

/// Configuration for a replica and its sync driver.
#[derive(Debug, Clone)]
pub struct ReplicaConfig {
    /// Human-readable name, used in log output.
    pub name: String,
    /// Delay between attempts to publish an operation the transport refused (ms).
    pub retry_interval_ms: u64,
    /// Pending-buffer size above which every receive logs a warning.
    pub pending_warn_threshold: usize,
}

impl ReplicaConfig {
    /// The retry interval as a [`Duration`].
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self {
            name: "cfjson replica".to_string(),
            retry_interval_ms: 2_000,
            pending_warn_threshold: 1_024,
        }
    }
}
