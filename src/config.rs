//! Configuration management for Keraunos
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files.

use crate::error::{KeraunosError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Lower bound for the polling interval. The Tesla cloud API keeps
/// vehicles awake while they are being polled, so anything more
/// aggressive drains the battery.
pub const MIN_SCAN_INTERVAL_SECS: u64 = 300;

fn default_scan_interval() -> u64 {
    MIN_SCAN_INTERVAL_SECS
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Tesla account credentials
    pub tesla: TeslaConfig,

    /// Polling interval in seconds (clamped to at least 300)
    #[serde(default = "default_scan_interval")]
    pub scan_interval_seconds: u64,

    /// Retry policy for remote API calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Web server binding configuration
    #[serde(default)]
    pub web: WebConfig,
}

/// Tesla account credentials for the owner API
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TeslaConfig {
    /// Account email address
    pub username: String,

    /// Account password
    pub password: String,
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Max attempts per remote call before giving up
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds
    pub initial_delay_ms: u64,

    /// Upper bound on the backoff delay in milliseconds
    pub max_delay_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Directory for rotated log files; empty disables file logging
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: String::new(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8720,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tesla: TeslaConfig::default(),
            scan_interval_seconds: MIN_SCAN_INTERVAL_SECS,
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default locations
    pub fn load() -> Result<Self> {
        let default_paths = [
            "keraunos_config.yaml",
            "/data/keraunos_config.yaml",
            "/etc/keraunos/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Effective polling interval, clamped to the minimum
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_seconds.max(MIN_SCAN_INTERVAL_SECS))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.tesla.username.is_empty() {
            return Err(KeraunosError::validation(
                "tesla.username",
                "Username cannot be empty",
            ));
        }

        if self.tesla.password.is_empty() {
            return Err(KeraunosError::validation(
                "tesla.password",
                "Password cannot be empty",
            ));
        }

        if self.scan_interval_seconds == 0 {
            return Err(KeraunosError::validation(
                "scan_interval_seconds",
                "Must be greater than 0",
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(KeraunosError::validation(
                "retry.max_attempts",
                "Must be greater than 0",
            ));
        }

        if self.web.port == 0 {
            return Err(KeraunosError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            tesla: TeslaConfig {
                username: "owner@example.com".to_string(),
                password: "hunter2".to_string(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scan_interval_seconds, 300);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.web.port, 8720);
        assert!(config.logging.console_output);
    }

    #[test]
    fn test_scan_interval_clamped() {
        let mut config = valid_config();
        config.scan_interval_seconds = 30;
        assert_eq!(config.scan_interval(), Duration::from_secs(300));

        config.scan_interval_seconds = 600;
        assert_eq!(config.scan_interval(), Duration::from_secs(600));
    }

    #[test]
    fn test_config_validation() {
        let mut config = valid_config();
        assert!(config.validate().is_ok());

        config.tesla.username = String::new();
        assert!(config.validate().is_err());

        config = valid_config();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        config = valid_config();
        config.web.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = valid_config();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let deserialized: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.tesla.username, deserialized.tesla.username);
        assert_eq!(
            config.scan_interval_seconds,
            deserialized.scan_interval_seconds
        );
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "tesla:\n  username: owner@example.com\n  password: hunter2\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.scan_interval_seconds, 300);
        assert_eq!(config.retry.initial_delay_ms, 500);
    }
}
