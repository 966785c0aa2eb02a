//! Unified error handling for the call tester.
//!
//! Port and configuration errors convert into [`CallTestError`] so `?` works
//! across layers. Each variant maps to its own process exit code.

use crate::at::TokenMatch;
use crate::config::ConfigError;
use crate::port::PortError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A specialized `Result` type for call test operations.
pub type CallTestResult<T> = Result<T, CallTestError>;

/// Process exit codes, one per failure kind.
pub mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const NOT_CONNECTED: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const CONNECTION_FAILED: u8 = 3;
    pub const AUTH_FAILED: u8 = 5;
    pub const CONFIG_ERROR: u8 = 8;
    pub const PORT_ERROR: u8 = 9;
    pub const CALL_FAILED: u8 = 10;
}

/// Step of the SIM unlock sequence that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    /// `AT` was not answered with `OK`.
    Handshake,
    /// The SIM wants a PIN and none was given.
    PinRequired,
    /// `AT+CPIN=<pin>` was not followed by `PB DONE`.
    PinEntry,
    /// The SIM still was not ready after the PIN was accepted.
    PinVerify,
}

impl AuthStage {
    /// Whether a PIN was, or would have had to be, submitted at this stage.
    pub fn involves_pin(self) -> bool {
        !matches!(self, Self::Handshake)
    }
}

impl fmt::Display for AuthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handshake => write!(f, "Connection to GSM"),
            Self::PinRequired => write!(f, "PIN login (SIM requires a PIN but none was given)"),
            Self::PinEntry => write!(f, "PIN login"),
            Self::PinVerify => write!(f, "PIN verification"),
        }
    }
}

/// Errors that abort a call test run.
#[derive(Debug, Error)]
pub enum CallTestError {
    /// The device never became ready within the connect timeout.
    #[error("Cannot create connection with {device}: not ready after {timeout:?} ({attempts} attempts)")]
    Connect {
        device: String,
        timeout: Duration,
        attempts: usize,
        #[source]
        last_error: Option<PortError>,
    },

    /// AT handshake or PIN sequence failed.
    #[error("{stage} failed: {outcome}{}", sim_lock_warning(.stage))]
    Authentication { stage: AuthStage, outcome: TokenMatch },

    /// The dial command was not acknowledged with `OK`.
    #[error("Dial to {number} rejected: {outcome}")]
    Dial { number: String, outcome: TokenMatch },

    /// The call was dialed but the modem never reported it as started.
    #[error("Call to {number} was not established: {outcome}")]
    CallNotEstablished { number: String, outcome: TokenMatch },

    /// The serial link failed while it was open.
    #[error("Serial link error: {0}")]
    Port(#[from] PortError),

    /// A command was issued on a session whose link is closed.
    #[error("Serial link is not connected")]
    NotConnected,

    /// Configuration could not be loaded or validated.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

fn sim_lock_warning(stage: &AuthStage) -> &'static str {
    if stage.involves_pin() {
        ". BE CAREFUL NOT TO BLOCK YOUR SIM !"
    } else {
        ""
    }
}

impl CallTestError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Connect { .. } => exit_codes::CONNECTION_FAILED,
            Self::Authentication { .. } => exit_codes::AUTH_FAILED,
            Self::Dial { .. } | Self::CallNotEstablished { .. } => exit_codes::CALL_FAILED,
            Self::Port(_) => exit_codes::PORT_ERROR,
            Self::NotConnected => exit_codes::NOT_CONNECTED,
            Self::Config(_) => exit_codes::CONFIG_ERROR,
        }
    }

    /// Short machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect_failure",
            Self::Authentication { .. } => "authentication_failure",
            Self::Dial { .. } => "dial_failure",
            Self::CallNotEstablished { .. } => "call_not_established",
            Self::Port(_) => "port_error",
            Self::NotConnected => "not_connected",
            Self::Config(_) => "config_error",
        }
    }
}
