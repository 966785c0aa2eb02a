//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "GSM_CALL_TEST";

/// Config file name in the current directory
const LOCAL_CONFIG_FILE_NAME: &str = "gsm-call-test.toml";

/// Config file name in the platform config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "GSM_CALL_TEST_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `GSM_CALL_TEST_CONFIG` environment variable (explicit path)
    /// 2. `./gsm-call-test.toml` (current directory)
    /// 3. `<platform config dir>/gsm-call-test/config.toml`
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables override file values; the result is validated.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    ///
    /// A missing file is an error here, unlike in [`ConfigLoader::load`].
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(LOCAL_CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. Platform config directory
    if let Some(app_config) = get_default_config_path() {
        if app_config.exists() {
            return Some(app_config);
        }
    }

    // 4. No config file found - will use defaults
    None
}

/// Get the default config directory for this application.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "gsm-call-test").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the default config file path.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

fn env_var(key: &str) -> Option<(String, String)> {
    let name = format!("{}_{}", ENV_PREFIX, key);
    std::env::var(&name).ok().map(|val| (name, val))
}

fn parse_env<T: std::str::FromStr>(name: &str, val: &str, what: &str) -> ConfigResult<T> {
    val.trim()
        .parse()
        .map_err(|_| ConfigError::env_parse(name, format!("Invalid {what}: '{val}'")))
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `GSM_CALL_TEST_<SECTION>_<KEY>`
/// For example:
/// - `GSM_CALL_TEST_MODEM_BAUD_RATE=9600`
/// - `GSM_CALL_TEST_MODEM_DIAL_TIMEOUT_MS=30000`
/// - `GSM_CALL_TEST_LOGGING_FORMAT=json`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Modem overrides
    if let Some((name, val)) = env_var("MODEM_BAUD_RATE") {
        config.modem.baud_rate = parse_env(&name, &val, "baud rate")?;
    }
    if let Some((name, val)) = env_var("MODEM_FLOW_CONTROL") {
        config.modem.flow_control = match val.trim().to_ascii_lowercase().as_str() {
            "none" => crate::port::FlowControl::None,
            "software" => crate::port::FlowControl::Software,
            "hardware" => crate::port::FlowControl::Hardware,
            _ => {
                return Err(ConfigError::env_parse(
                    name,
                    format!("Invalid flow control: '{val}'"),
                ))
            }
        };
    }
    if let Some((name, val)) = env_var("MODEM_CONNECT_TIMEOUT_MS") {
        config.modem.connect_timeout_ms = parse_env(&name, &val, "timeout")?;
    }
    if let Some((name, val)) = env_var("MODEM_RESPONSE_TIMEOUT_MS") {
        config.modem.response_timeout_ms = parse_env(&name, &val, "timeout")?;
    }
    if let Some((name, val)) = env_var("MODEM_DIAL_TIMEOUT_MS") {
        config.modem.dial_timeout_ms = parse_env(&name, &val, "timeout")?;
    }

    // Logging overrides
    if let Some((_, val)) = env_var("LOGGING_LEVEL") {
        config.logging.level = val;
    }
    if let Some((name, val)) = env_var("LOGGING_FORMAT") {
        config.logging.format = val
            .parse()
            .map_err(|message: String| ConfigError::env_parse(name, message))?;
    }

    Ok(())
}
