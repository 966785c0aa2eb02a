//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! Every section falls back to its defaults, so an empty file is valid.

use super::error::{ConfigError, ConfigResult};
use crate::at::POLL_INTERVAL;
use crate::port::FlowControl;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Modem link configuration
    pub modem: ModemConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Check values that would make a run meaningless.
    pub fn validate(&self) -> ConfigResult<()> {
        self.modem.validate()?;
        self.logging.validate()
    }
}

/// Modem link configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    /// Line speed
    pub baud_rate: u32,
    /// Flow control: "none", "software" or "hardware"
    pub flow_control: FlowControl,
    /// How long to keep retrying to open the device
    pub connect_timeout_ms: u64,
    /// How long to wait for a command reply
    pub response_timeout_ms: u64,
    /// How long to wait for call state notifications
    pub dial_timeout_ms: u64,
    /// Short names for device paths
    #[serde(default)]
    pub port_aliases: HashMap<String, String>,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115200,
            flow_control: FlowControl::None,
            connect_timeout_ms: 5000,
            response_timeout_ms: 5000,
            dial_timeout_ms: 60000,
            port_aliases: HashMap::new(),
        }
    }
}

impl ModemConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.dial_timeout_ms)
    }

    /// Resolve a device name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.baud_rate == 0 {
            return Err(ConfigError::validation("modem.baud_rate", "must be non-zero"));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "modem.connect_timeout_ms",
                "must be non-zero",
            ));
        }
        if self.response_timeout() < POLL_INTERVAL {
            return Err(ConfigError::validation(
                "modem.response_timeout_ms",
                format!("must be at least {} ms", POLL_INTERVAL.as_millis()),
            ));
        }
        if self.dial_timeout() < POLL_INTERVAL {
            return Err(ConfigError::validation(
                "modem.dial_timeout_ms",
                format!("must be at least {} ms", POLL_INTERVAL.as_millis()),
            ));
        }
        Ok(())
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> ConfigResult<()> {
        match self.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" | "off" => Ok(()),
            other => Err(ConfigError::validation(
                "logging.level",
                format!("unknown level '{other}'"),
            )),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Multi-line records with source location, colored on a terminal
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}
