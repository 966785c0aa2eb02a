//! Call controller: the voice call scenarios run over an authenticated
//! [`AtSession`].

use crate::at::token::{self, TokenMatch};
use crate::at::{AtCommand, AtSession};
use crate::clock::Clock;
use crate::error::{CallTestError, CallTestResult};
use crate::port::SerialPortAdapter;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// How long a connected call is kept up.
pub const CALL_HOLD: Duration = Duration::from_secs(10);

/// Why a scenario failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailReason {
    /// `ATD` was not acknowledged with `OK`.
    DialRejected { number: String, outcome: TokenMatch },
    /// The modem never reported the call as started.
    CallNotEstablished { number: String, outcome: TokenMatch },
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DialRejected { number, outcome } => {
                write!(f, "dial rejected ({number}: {outcome})")
            }
            Self::CallNotEstablished { number, outcome } => {
                write!(f, "call not established ({number}: {outcome})")
            }
        }
    }
}

impl From<FailReason> for CallTestError {
    fn from(reason: FailReason) -> Self {
        match reason {
            FailReason::DialRejected { number, outcome } => Self::Dial { number, outcome },
            FailReason::CallNotEstablished { number, outcome } => {
                Self::CallNotEstablished { number, outcome }
            }
        }
    }
}

/// Verdict of a call scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Pass,
    Fail(FailReason),
}

impl CallOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Turn a failed verdict into the matching [`CallTestError`].
    pub fn into_result(self) -> CallTestResult<()> {
        match self {
            Self::Pass => Ok(()),
            Self::Fail(reason) => Err(reason.into()),
        }
    }
}

/// Drives dial, hold and hang up over a borrowed session.
pub struct CallController<'s, P: SerialPortAdapter, C: Clock> {
    session: &'s mut AtSession<P, C>,
    dial_timeout: Duration,
}

impl<'s, P: SerialPortAdapter, C: Clock> CallController<'s, P, C> {
    pub fn new(session: &'s mut AtSession<P, C>, dial_timeout: Duration) -> Self {
        Self {
            session,
            dial_timeout,
        }
    }

    /// `AT+CHUP`, wait for `OK`.
    pub fn hang_up(&mut self) -> CallTestResult<bool> {
        self.session.send(&AtCommand::HangUp)?;
        let ok = self.session.check_ok(None)?;
        if !ok {
            warn!("hang up was not acknowledged");
        }
        Ok(ok)
    }

    /// `ATD<number>;`, wait for `OK`; `NO CARRIER` fails early.
    pub fn dial(&mut self, number: &str) -> CallTestResult<TokenMatch> {
        self.session.send(&AtCommand::Dial(number.to_string()))?;
        let timeout = self.session.response_timeout();
        self.session
            .await_token(token::OK, timeout, Some(token::NO_CARRIER))
    }

    /// Keep the line up for [`CALL_HOLD`].
    pub fn hold(&self) {
        info!("holding call for {:?}", CALL_HOLD);
        self.session.clock().sleep(CALL_HOLD);
    }

    /// Wait for the callee to pick up (`VOICE CALL: BEGIN`), then stay on the
    /// line for [`CALL_HOLD`] so a voicemail records something.
    pub fn leave_audio_message(&mut self) -> CallTestResult<TokenMatch> {
        let begun = self.session.await_token(
            token::VOICE_CALL_BEGIN,
            self.dial_timeout,
            Some(token::NO_CARRIER),
        )?;
        if begun.is_success() {
            self.hold();
        } else {
            warn!("call did not start: {}", begun);
        }
        Ok(begun)
    }

    /// Wait for `VOICE CALL: END`.
    pub fn wait_for_call_end(&mut self) -> CallTestResult<TokenMatch> {
        self.session
            .await_token(token::VOICE_CALL_END, self.dial_timeout, None)
    }

    /// Basic scenario: reset, dial, hold, hang up.
    pub fn test_call(&mut self, number: &str) -> CallTestResult<CallOutcome> {
        // Nothing may be up; the reply does not matter.
        self.hang_up()?;

        let dialed = self.dial(number)?;
        if !dialed.is_success() {
            return Ok(CallOutcome::Fail(FailReason::DialRejected {
                number: number.to_string(),
                outcome: dialed,
            }));
        }

        self.hold();
        self.hang_up()?;
        Ok(CallOutcome::Pass)
    }

    /// Voicemail scenario: reset, dial, wait for the call to start, hold,
    /// hang up, then wait for the end notification.
    pub fn test_audio_message(&mut self, number: &str) -> CallTestResult<CallOutcome> {
        self.hang_up()?;

        let dialed = self.dial(number)?;
        if !dialed.is_success() {
            return Ok(CallOutcome::Fail(FailReason::DialRejected {
                number: number.to_string(),
                outcome: dialed,
            }));
        }

        let begun = self.leave_audio_message()?;
        if !begun.is_success() {
            self.hang_up()?;
            return Ok(CallOutcome::Fail(FailReason::CallNotEstablished {
                number: number.to_string(),
                outcome: begun,
            }));
        }

        self.hang_up()?;
        let ended = self.wait_for_call_end()?;
        if !ended.is_success() {
            warn!("no end of call notification: {}", ended);
        }
        Ok(CallOutcome::Pass)
    }
}
