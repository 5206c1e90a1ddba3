//! Configuration for the worker loop
//!
//! Defines the poll interval and the windows used by retry and dedup.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the ingestion worker
///
/// # Examples
///
/// ```
/// use custos_worker::WorkerConfig;
///
/// // Default configuration
/// let config = WorkerConfig::default();
/// assert_eq!(config.backoff_secs, 30);
///
/// // Fast polling, quick retries
/// let config = WorkerConfig::aggressive();
/// assert_eq!(config.poll_interval_secs, 1);
///
/// // Slow polling, patient retries
/// let config = WorkerConfig::lenient();
/// assert_eq!(config.backoff_secs, 120);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Seconds between cycles of the background loop
    /// Default: 2
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Age a failed job must reach before it is requeued
    /// Default: 30
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,

    /// How far back the cheap succeeded-job dedup lookup reaches
    /// Default: 300
    #[serde(default = "default_recent_success_window_secs")]
    pub recent_success_window_secs: u64,

    /// Character cap on excerpts sent to the memory index
    /// Default: 200
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_backoff_secs() -> u64 {
    30
}

fn default_recent_success_window_secs() -> u64 {
    300
}

fn default_excerpt_chars() -> usize {
    200
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            backoff_secs: default_backoff_secs(),
            recent_success_window_secs: default_recent_success_window_secs(),
            excerpt_chars: default_excerpt_chars(),
        }
    }
}

impl WorkerConfig {
    /// Poll every second and retry failures after 10 seconds
    pub fn aggressive() -> Self {
        Self {
            poll_interval_secs: 1,
            backoff_secs: 10,
            ..Self::default()
        }
    }

    /// Poll every 10 seconds and retry failures after 2 minutes
    pub fn lenient() -> Self {
        Self {
            poll_interval_secs: 10,
            backoff_secs: 120,
            ..Self::default()
        }
    }

    /// Interval between background cycles
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Backoff before a failed job is retried
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WorkerConfig::default();
        assert_eq!(config.poll_interval_secs, 2);
        assert_eq!(config.backoff_secs, 30);
        assert_eq!(config.recent_success_window_secs, 300);
        assert_eq!(config.excerpt_chars, 200);
    }

    #[test]
    fn test_presets_keep_dedup_window() {
        assert_eq!(WorkerConfig::aggressive().recent_success_window_secs, 300);
        assert_eq!(WorkerConfig::lenient().excerpt_chars, 200);
        assert!(WorkerConfig::aggressive().backoff() < WorkerConfig::lenient().backoff());
    }

    #[test]
    fn test_duration_conversions() {
        let config = WorkerConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.backoff(), Duration::from_secs(30));
    }
}
