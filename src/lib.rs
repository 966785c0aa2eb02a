//! GSM call tester library
//!
//! Drives a GSM modem over its AT command serial link to check that an
//! outbound voice call can be placed and torn down.
//!
//! # Modules
//!
//! - `connection`: opens the serial device, retrying while it enumerates
//! - `at`: AT command session, reply token matching and SIM unlock
//! - `call`: call scenarios on top of an authenticated session
//! - `runner`: one complete run from connect to report
//! - `port`: serial port abstraction, real port and scripted mock
//! - `clock`: injectable time source for the polling loops
//! - `config`: TOML configuration with environment overrides
//! - `report`: final report and banner
//! - `logging`: `tracing` subscriber setup
//! - `error`: unified error handling

pub mod at;
pub mod call;
pub mod clock;
pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod port;
pub mod report;
pub mod runner;

// Re-export commonly used types for convenience
pub use at::{AtCommand, AtSession, LinkState, TokenMatch, POLL_INTERVAL};
pub use call::{CallController, CallOutcome, FailReason, CALL_HOLD};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult, SessionConfig};
pub use connection::{connect, open_session, RETRY_INTERVAL};
pub use error::{AuthStage, CallTestError, CallTestResult};
pub use port::{
    MockOpener, MockSerialPort, PortConfiguration, PortError, PortOpener, SerialOpener,
    SerialPortAdapter, SyncSerialPort,
};
pub use report::{CallReport, Verdict};
pub use runner::{run, RunResult, Scenario};
