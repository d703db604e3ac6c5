//! # Async Task Configuration
//!
//! Settings for the master-side async task machinery: how often in-flight tasks
//! are probed, how many consecutive query failures are tolerated, and how wide
//! fan-out command dispatch may go.
//!
//! ## Sources
//!
//! Layered by [`loader`], later sources overriding earlier ones:
//!
//! 1. Built-in defaults (`AsyncTaskConfig::default()`)
//! 2. `config/fanout.toml`
//! 3. `config/fanout.<environment>.toml`
//! 4. `FANOUT__*` environment variables (e.g. `FANOUT__CHECK_INTERVAL_MS=500`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fanout_core::config::AsyncTaskConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AsyncTaskConfig::load()?;
//! let interval = config.check_interval();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::defaults;

pub use error::{ConfigResult, ConfigurationError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AsyncTaskConfig {
    /// Delay between probes of one in-flight task
    pub check_interval_ms: u64,
    /// Consecutive probe query failures tolerated before the task is reported as errored
    pub max_consecutive_probe_errors: u32,
    /// Fallback cap on children per fan-out when parameters do not set one
    pub default_max_sub_workflows: usize,
    /// Capacity of the lifecycle event broadcast channel
    pub event_channel_capacity: usize,
    /// Generation commands in flight at once while a fan-out starts
    pub dispatch_concurrency: usize,
}

impl Default for AsyncTaskConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: defaults::CHECK_INTERVAL_MS,
            max_consecutive_probe_errors: defaults::MAX_CONSECUTIVE_PROBE_ERRORS,
            default_max_sub_workflows: defaults::MAX_NUM_OF_SUB_WORKFLOW,
            event_channel_capacity: defaults::EVENT_CHANNEL_CAPACITY,
            dispatch_concurrency: defaults::DISPATCH_CONCURRENCY,
        }
    }
}

impl AsyncTaskConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.check_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "check_interval_ms",
                self.check_interval_ms,
                "must be greater than zero",
            ));
        }
        if self.max_consecutive_probe_errors == 0 {
            return Err(ConfigurationError::invalid_value(
                "max_consecutive_probe_errors",
                self.max_consecutive_probe_errors,
                "must allow at least one attempt",
            ));
        }
        if self.default_max_sub_workflows == 0 {
            return Err(ConfigurationError::invalid_value(
                "default_max_sub_workflows",
                self.default_max_sub_workflows,
                "must be greater than zero",
            ));
        }
        if self.event_channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "event_channel_capacity",
                self.event_channel_capacity,
                "broadcast channels need a positive capacity",
            ));
        }
        if self.dispatch_concurrency == 0 {
            return Err(ConfigurationError::invalid_value(
                "dispatch_concurrency",
                self.dispatch_concurrency,
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AsyncTaskConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.check_interval(), Duration::from_secs(10));
        assert_eq!(config.max_consecutive_probe_errors, 3);
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let config = AsyncTaskConfig {
            check_interval_ms: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("check_interval_ms"));

        let config = AsyncTaskConfig {
            max_consecutive_probe_errors: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AsyncTaskConfig {
            event_channel_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialization_keeps_defaults() {
        let config: AsyncTaskConfig =
            serde_json::from_str(r#"{"check_interval_ms": 250}"#).unwrap();
        assert_eq!(config.check_interval_ms, 250);
        assert_eq!(config.dispatch_concurrency, 16);
    }
}
