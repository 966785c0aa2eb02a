//! Configuration module for gsm-call-test.
//!
//! This module provides TOML-based configuration with environment variable
//! overrides, and the immutable [`SessionConfig`] a run is built from.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `GSM_CALL_TEST_CONFIG` environment variable (explicit path)
//! 2. `./gsm-call-test.toml` (current directory)
//! 3. `gsm-call-test/config.toml` in the platform config directory
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is: `GSM_CALL_TEST_<SECTION>_<KEY>`
//!
//! Examples:
//! - `GSM_CALL_TEST_MODEM_BAUD_RATE=9600`
//! - `GSM_CALL_TEST_MODEM_DIAL_TIMEOUT_MS=30000`
//! - `GSM_CALL_TEST_LOGGING_LEVEL=debug`
//!
//! # Example
//!
//! ```rust,ignore
//! use gsm_call_test::config::{ConfigLoader, SessionConfig};
//!
//! let config = ConfigLoader::load()?.into_config();
//! let session = SessionConfig::builder(config.modem.resolve_port("gsm"))
//!     .modem(&config.modem)
//!     .pin(Some("0000".into()))
//!     .build()?;
//! ```

mod error;
mod loader;
mod schema;
mod session;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{Config, LogFormat, LoggingConfig, ModemConfig};
pub use session::{
    parse_seconds, SessionConfig, SessionConfigBuilder, DEFAULT_BAUD_RATE, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_DIAL_TIMEOUT, DEFAULT_RESPONSE_TIMEOUT,
};
