//! Scheduler configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Background scheduler configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the background expiration sweeper runs at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between expiration sweep passes
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl SchedulerConfig {
    /// Get the sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Validate scheduler configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.enabled && self.sweep_interval_secs == 0 {
            return Err(ValidationError::InvalidSweepInterval);
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    3600
}
