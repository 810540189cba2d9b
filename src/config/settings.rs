//! Configuration settings for testdb.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::TestDbError;
use crate::validation::{validate_database_name, validate_prefix};

/// Main configuration structure.
///
/// Every section is optional so an empty file (or no file) is valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format ("pretty" or "json").
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Subprocess execution configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Timeout for a single client tool call.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_seconds: u64,
    /// Pause before retrying a failed drop.
    #[serde(default = "default_drop_retry_delay")]
    pub drop_retry_delay_ms: u64,
}

/// Defaults applied to every database this process provisions.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisioningConfig {
    /// Prefix for generated database names.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Database encoding (PostgreSQL only).
    pub encoding: Option<String>,
    /// Template database to cache the schema in (PostgreSQL only).
    pub template: Option<String>,
    /// Rebuild the template even when its schema timestamp is current.
    #[serde(default)]
    pub force_template: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_command_timeout() -> u64 {
    60
}

fn default_drop_retry_delay() -> u64 {
    1000
}

fn default_prefix() -> String {
    "testdb".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            command_timeout_seconds: default_command_timeout(),
            drop_retry_delay_ms: default_drop_retry_delay(),
        }
    }
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            encoding: None,
            template: None,
            force_template: false,
        }
    }
}

impl ExecutionConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_seconds)
    }

    pub fn drop_retry_delay(&self) -> Duration {
        Duration::from_millis(self.drop_retry_delay_ms)
    }
}

impl Settings {
    /// Load settings from a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TestDbError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| TestDbError::Config {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        let settings = Self::from_toml(&content).map_err(|e| TestDbError::Config {
            message: format!("Failed to load config file '{}': {}", path.display(), e),
        })?;

        Ok(settings)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, TestDbError> {
        let settings: Settings = toml::from_str(content).map_err(|e| TestDbError::Config {
            message: e.to_string(),
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate the settings.
    fn validate(&self) -> Result<(), TestDbError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(TestDbError::Config {
                message: format!(
                    "Invalid log level '{}'. Valid levels: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(TestDbError::Config {
                message: format!(
                    "Invalid log format '{}'. Valid formats: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        if self.execution.command_timeout_seconds == 0 {
            return Err(TestDbError::Config {
                message: "command_timeout_seconds must be greater than zero".to_string(),
            });
        }

        validate_prefix(&self.provisioning.prefix)?;
        if let Some(template) = &self.provisioning.template {
            validate_database_name(template)?;
        }

        Ok(())
    }
}
