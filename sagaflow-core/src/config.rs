//! Scheduler Configuration
//!
//! Settings are plain data with serde defaults, so a config can be built in
//! code or parsed from JSON:
//!
//! ```rust,ignore
//! let config = SchedulerConfig::from_json(r#"{ "name": "checkout" }"#)?;
//! assert_eq!(config.max_delegation_depth, 64);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Settings for a [`Scheduler`](crate::saga::Scheduler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Name attached to log output of this scheduler.
    #[serde(default = "default_name")]
    pub name: String,

    /// Maximum number of nested computations (delegation frames plus opaque
    /// sub-invocations) a single chain may reach.
    #[serde(default = "default_max_delegation_depth")]
    pub max_delegation_depth: usize,

    /// Number of unrecovered failures kept for inspection. Oldest are
    /// dropped first. Zero disables the log.
    #[serde(default = "default_failure_log_capacity")]
    pub failure_log_capacity: usize,
}

fn default_name() -> String {
    "sagaflow".to_string()
}

fn default_max_delegation_depth() -> usize {
    64
}

fn default_failure_log_capacity() -> usize {
    128
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            max_delegation_depth: default_max_delegation_depth(),
            failure_log_capacity: default_failure_log_capacity(),
        }
    }
}

impl SchedulerConfig {
    /// Parse and validate a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the settings are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "name must not be empty".to_string(),
            ));
        }
        if self.max_delegation_depth == 0 {
            return Err(ConfigError::ValidationError(
                "max_delegation_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let config = SchedulerConfig::from_json("{}").unwrap();
        assert_eq!(config, SchedulerConfig::default());
    }

    #[test]
    fn fields_override_defaults() {
        let config =
            SchedulerConfig::from_json(r#"{ "name": "fruit", "max_delegation_depth": 4 }"#)
                .unwrap();
        assert_eq!(config.name, "fruit");
        assert_eq!(config.max_delegation_depth, 4);
        assert_eq!(config.failure_log_capacity, 128);
    }

    #[test]
    fn zero_depth_is_rejected() {
        let err = SchedulerConfig::from_json(r#"{ "max_delegation_depth": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = SchedulerConfig::from_json("{ name: }").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
