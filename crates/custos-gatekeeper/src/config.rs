//! Admission configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the admission gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// How far back (seconds) a resubmission replays an existing job
    #[serde(default = "default_lookback_secs")]
    pub lookback_secs: u64,
}

fn default_lookback_secs() -> u64 {
    120
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            lookback_secs: default_lookback_secs(),
        }
    }
}

impl AdmissionConfig {
    /// Replay window as a Duration
    pub fn lookback(&self) -> Duration {
        Duration::from_secs(self.lookback_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AdmissionConfig::default();
        assert_eq!(config.lookback_secs, 120);
        assert_eq!(config.lookback(), Duration::from_secs(120));
    }
}
