//! AT session over an open serial link.
//!
//! The session owns the link for its whole life and closes it when dropped,
//! so every exit path, including early `?` returns, releases the device.
//!
//! Replies are matched per poll iteration: each iteration drains whatever the
//! modem has sent since the last one and looks for the tokens in those bytes
//! only. A token split across two iterations is not recognised.

use super::command::AtCommand;
use super::token::{self, TokenMatch};
use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::error::{AuthStage, CallTestError, CallTestResult};
use crate::port::SerialPortAdapter;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fixed cadence of every polling loop.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Logical state of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    /// No link; nothing can be sent.
    Disconnected,
    /// Link open, SIM state unknown.
    Connected,
    /// SIM asked for a PIN.
    PinChecked,
    /// SIM ready for calls.
    Authenticated,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::PinChecked => "pin-checked",
            Self::Authenticated => "authenticated",
        };
        f.write_str(name)
    }
}

/// Command/response session with one modem.
pub struct AtSession<P: SerialPortAdapter, C: Clock = SystemClock> {
    port: Option<P>,
    clock: C,
    device: String,
    pin: Option<String>,
    response_timeout: Duration,
    state: LinkState,
    history: Vec<String>,
}

impl<P: SerialPortAdapter, C: Clock> AtSession<P, C> {
    /// Wrap a freshly opened link. The session starts `Connected`.
    pub fn new(port: P, clock: C, config: &SessionConfig) -> Self {
        Self {
            device: port.name().to_string(),
            port: Some(port),
            clock,
            pin: config.pin().map(str::to_string),
            response_timeout: config.response_timeout(),
            state: LinkState::Connected,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    /// Commands sent so far, PIN masked.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    fn set_state(&mut self, state: LinkState) {
        if self.state != state {
            debug!("link {}: {} -> {}", self.device, self.state, state);
            self.state = state;
        }
    }

    fn port_mut(&mut self) -> CallTestResult<&mut P> {
        self.port.as_mut().ok_or(CallTestError::NotConnected)
    }

    /// Write one command line. No acknowledgment is awaited.
    pub fn send(&mut self, command: &AtCommand) -> CallTestResult<()> {
        let line = command.to_line();
        self.port_mut()?.write_bytes(&line)?;
        info!(">> {}", command);
        self.history.push(command.to_string());
        Ok(())
    }

    /// Poll for `success` (or `failure`) until `timeout` elapses.
    ///
    /// Each iteration sleeps one [`POLL_INTERVAL`], drains the link and scans
    /// only the bytes of that drain; success is checked before failure.
    pub fn await_token(
        &mut self,
        success: &str,
        timeout: Duration,
        failure: Option<&str>,
    ) -> CallTestResult<TokenMatch> {
        let start = self.clock.now();
        while self.clock.elapsed_since(start) < timeout {
            self.clock.sleep(POLL_INTERVAL);
            let received = self.port_mut()?.read_available()?;
            if received.is_empty() {
                continue;
            }
            debug!("<< {}", token::printable(&received));
            if let Some(found) = token::scan(&received, success, failure) {
                debug!("{:?} while waiting for {:?}", found, success);
                return Ok(found);
            }
        }
        debug!("no {:?} within {:?}", success, timeout);
        Ok(TokenMatch::TimedOut)
    }

    /// Wait for `OK`, by default within the response timeout.
    pub fn check_ok(&mut self, timeout: Option<Duration>) -> CallTestResult<bool> {
        let timeout = timeout.unwrap_or(self.response_timeout);
        Ok(self.await_token(token::OK, timeout, None)?.is_success())
    }

    /// `AT` → `OK`.
    pub fn check_connection(&mut self) -> CallTestResult<TokenMatch> {
        info!("check connection...");
        self.send(&AtCommand::Attention)?;
        let outcome = self.await_token(token::OK, self.response_timeout, None)?;
        if !outcome.is_success() {
            warn!("connection ERROR !");
        }
        Ok(outcome)
    }

    /// `AT+CPIN?` → `OK` means the SIM is ready.
    pub fn check_pin(&mut self) -> CallTestResult<TokenMatch> {
        info!("check pin...");
        self.send(&AtCommand::PinQuery)?;
        let outcome = self.await_token(token::OK, self.response_timeout, None)?;
        if outcome.is_success() {
            self.set_state(LinkState::Authenticated);
        } else {
            self.set_state(LinkState::PinChecked);
        }
        Ok(outcome)
    }

    /// Unlock the SIM if needed.
    ///
    /// The PIN is submitted at most once per call; a failure is final.
    pub fn do_pin(&mut self) -> CallTestResult<()> {
        info!("enter pin code...");
        let status = self.check_pin()?;
        if status.is_success() {
            return Ok(());
        }

        let Some(pin) = self.pin.clone() else {
            return Err(CallTestError::Authentication {
                stage: AuthStage::PinRequired,
                outcome: status,
            });
        };

        self.send(&AtCommand::PinEntry(pin))?;
        let unlocked = self.await_token(token::PB_DONE, self.response_timeout, Some(token::ERROR))?;
        if !unlocked.is_success() {
            return Err(CallTestError::Authentication {
                stage: AuthStage::PinEntry,
                outcome: unlocked,
            });
        }

        let verified = self.check_pin()?;
        if !verified.is_success() {
            return Err(CallTestError::Authentication {
                stage: AuthStage::PinVerify,
                outcome: verified,
            });
        }
        Ok(())
    }

    /// Handshake then SIM unlock.
    pub fn init(&mut self) -> CallTestResult<()> {
        let handshake = self.check_connection()?;
        if !handshake.is_success() {
            return Err(CallTestError::Authentication {
                stage: AuthStage::Handshake,
                outcome: handshake,
            });
        }
        self.do_pin()
    }

    /// Close the link. Safe to call more than once.
    pub fn disconnect(&mut self) {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.close() {
                warn!("error while closing {}: {}", self.device, e);
            }
            info!("closed link to {}", self.device);
        }
        self.set_state(LinkState::Disconnected);
    }
}

impl<P: SerialPortAdapter, C: Clock> Drop for AtSession<P, C> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl<P: SerialPortAdapter, C: Clock> fmt::Debug for AtSession<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtSession")
            .field("device", &self.device)
            .field("state", &self.state)
            .field("response_timeout", &self.response_timeout)
            .finish()
    }
}
