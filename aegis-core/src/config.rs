//! Runtime configuration for the aegis core
//!
//! Every field has a default, so an empty TOML document is a valid config.
//! Durations are written in humantime form (`"5s"`, `"750ms"`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub liveness: LivenessConfig,

    #[serde(default)]
    pub transit: TransitConfig,

    #[serde(default)]
    pub bus: BusConfig,
}

impl RuntimeConfig {
    /// Parse and validate a TOML document
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the scheduler cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.batch_size must be at least 1".to_string(),
            ));
        }
        if self.scheduler.cycle_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "scheduler.cycle_interval must be positive".to_string(),
            ));
        }
        if self.liveness.sweep_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "liveness.sweep_interval must be positive".to_string(),
            ));
        }
        if self.transit.delivery_min > self.transit.delivery_max {
            return Err(ConfigError::Invalid(
                "transit.delivery_min exceeds transit.delivery_max".to_string(),
            ));
        }
        if self.transit.response_min > self.transit.response_max {
            return Err(ConfigError::Invalid(
                "transit.response_min exceeds transit.response_max".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-agent task scheduler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Interval between processing cycles
    #[serde(default = "default_cycle_interval", with = "humantime_serde")]
    pub cycle_interval: Duration,

    /// Maximum tasks executed per cycle
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Sleep for a task's estimated duration before dispatching it
    #[serde(default)]
    pub simulate_task_duration: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cycle_interval: default_cycle_interval(),
            batch_size: default_batch_size(),
            simulate_task_duration: false,
        }
    }
}

/// Liveness sweep settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivenessConfig {
    #[serde(default = "default_sweep_interval", with = "humantime_serde")]
    pub sweep_interval: Duration,

    /// Silence after which an agent is marked offline
    #[serde(default = "default_heartbeat_timeout", with = "humantime_serde")]
    pub heartbeat_timeout: Duration,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            sweep_interval: default_sweep_interval(),
            heartbeat_timeout: default_heartbeat_timeout(),
        }
    }
}

/// Simulated network transit windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitConfig {
    #[serde(default = "default_delivery_min", with = "humantime_serde")]
    pub delivery_min: Duration,

    #[serde(default = "default_delivery_max", with = "humantime_serde")]
    pub delivery_max: Duration,

    /// Delay between a request's delivery and the synthesized response
    #[serde(default = "default_response_min", with = "humantime_serde")]
    pub response_min: Duration,

    #[serde(default = "default_response_max", with = "humantime_serde")]
    pub response_max: Duration,
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            delivery_min: default_delivery_min(),
            delivery_max: default_delivery_max(),
            response_min: default_response_min(),
            response_max: default_response_max(),
        }
    }
}

/// Event bus sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Broadcast buffer per subscriber before it starts lagging
    #[serde(default = "default_bus_capacity")]
    pub capacity: usize,

    /// Events retained for replay
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: default_bus_capacity(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_cycle_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_batch_size() -> usize {
    3
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_heartbeat_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_delivery_min() -> Duration {
    Duration::from_millis(500)
}

fn default_delivery_max() -> Duration {
    Duration::from_millis(1500)
}

fn default_response_min() -> Duration {
    Duration::from_millis(1000)
}

fn default_response_max() -> Duration {
    Duration::from_millis(3000)
}

fn default_bus_capacity() -> usize {
    1024
}

fn default_history_limit() -> usize {
    10_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RuntimeConfig::default();
        assert_eq!(config.scheduler.cycle_interval, Duration::from_secs(5));
        assert_eq!(config.scheduler.batch_size, 3);
        assert!(!config.scheduler.simulate_task_duration);
        assert_eq!(config.liveness.sweep_interval, Duration::from_secs(30));
        assert_eq!(config.liveness.heartbeat_timeout, Duration::from_secs(60));
        assert_eq!(config.bus.capacity, 1024);
    }

    #[test]
    fn test_deserialize_toml_defaults() {
        let config = RuntimeConfig::from_toml("").unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn test_deserialize_humantime_durations() {
        let toml = r#"
            [scheduler]
            cycle_interval = "250ms"
            batch_size = 5

            [liveness]
            heartbeat_timeout = "2m"
        "#;
        let config = RuntimeConfig::from_toml(toml).unwrap();
        assert_eq!(config.scheduler.cycle_interval, Duration::from_millis(250));
        assert_eq!(config.scheduler.batch_size, 5);
        assert_eq!(config.liveness.heartbeat_timeout, Duration::from_secs(120));
        // untouched sections keep defaults
        assert_eq!(config.liveness.sweep_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let toml = r#"
            [scheduler]
            batch_size = 0
        "#;
        assert!(matches!(
            RuntimeConfig::from_toml(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_inverted_transit_window_rejected() {
        let toml = r#"
            [transit]
            delivery_min = "2s"
            delivery_max = "1s"
        "#;
        assert!(RuntimeConfig::from_toml(toml).is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = RuntimeConfig::default();
        config.scheduler.batch_size = 7;
        config.transit.response_max = Duration::from_secs(4);

        let toml_str = toml::to_string(&config).unwrap();
        let parsed = RuntimeConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }
}
