//! One complete test run: connect, authenticate, run a scenario, close.

use crate::at::AtSession;
use crate::call::{CallController, CallOutcome};
use crate::clock::Clock;
use crate::config::SessionConfig;
use crate::connection::open_session;
use crate::error::{exit_codes, CallTestError, CallTestResult};
use crate::port::{PortOpener, SerialPortAdapter};
use crate::report::{CallReport, Verdict};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{error, info};

/// Which call sequence to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Reset, dial, hold ten seconds, hang up.
    #[default]
    Basic,
    /// Dial, wait for the call to start, hold, hang up, wait for the end.
    AudioMessage,
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => f.write_str("basic"),
            Self::AudioMessage => f.write_str("audio-message"),
        }
    }
}

/// Report plus the error that ended the run, if any.
#[derive(Debug)]
pub struct RunResult {
    pub report: CallReport,
    pub error: Option<CallTestError>,
}

impl RunResult {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }

    pub fn exit_code(&self) -> u8 {
        self.error
            .as_ref()
            .map_or(exit_codes::SUCCESS, CallTestError::exit_code)
    }
}

/// Run `scenario` against `number` on the device described by `config`.
///
/// The link is closed before this returns, whatever the outcome.
pub fn run<O, C>(
    opener: &O,
    clock: C,
    config: &SessionConfig,
    number: &str,
    scenario: Scenario,
) -> RunResult
where
    O: PortOpener,
    C: Clock + Clone,
{
    let start = clock.now();
    let mut commands = Vec::new();

    let result = open_session(opener, clock.clone(), config).and_then(|mut session| {
        let outcome = run_on_session(&mut session, config, number, scenario);
        commands = session.history().to_vec();
        session.disconnect();
        outcome
    });

    let elapsed = clock.elapsed_since(start);
    let (verdict, reason, error) = match result {
        Ok(()) => {
            info!("call test passed in {:?}", elapsed);
            (Verdict::Pass, None, None)
        }
        Err(e) => {
            error!("call test failed: {}", e);
            (Verdict::Fail, Some(e.to_string()), Some(e))
        }
    };

    RunResult {
        report: CallReport {
            device: config.device().to_string(),
            number: number.to_string(),
            scenario,
            verdict,
            failure_kind: error.as_ref().map(|e| e.kind().to_string()),
            reason,
            elapsed_ms: millis(elapsed),
            commands,
        },
        error,
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn run_on_session<P, C>(
    session: &mut AtSession<P, C>,
    config: &SessionConfig,
    number: &str,
    scenario: Scenario,
) -> CallTestResult<()>
where
    P: SerialPortAdapter,
    C: Clock,
{
    session.init()?;
    let mut controller = CallController::new(session, config.dial_timeout());
    let outcome: CallOutcome = match scenario {
        Scenario::Basic => controller.test_call(number)?,
        Scenario::AudioMessage => controller.test_audio_message(number)?,
    };
    outcome.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::port::{MockOpener, MockSerialPort};

    fn ready_modem() -> MockSerialPort {
        let mut port = MockSerialPort::new("MOCK0");
        port.reply_to("AT\r", ["\r\nOK\r\n"]);
        port.reply_to("AT+CPIN?", ["+CPIN: READY\r\n\r\nOK\r\n"]);
        port.reply_to("AT+CHUP", ["\r\nOK\r\n"]);
        port.reply_to("ATD", ["\r\nOK\r\n"]);
        port.reply_to("AT+CHUP", ["\r\nOK\r\n"]);
        port
    }

    #[test]
    fn test_run_pass_report() {
        let port = ready_modem();
        let opener = MockOpener::ready(port.clone());
        let config = SessionConfig::builder("/dev/ttyUSB4").build().unwrap();

        let result = run(&opener, ManualClock::new(), &config, "+33612345678", Scenario::Basic);

        assert!(result.passed());
        assert_eq!(result.exit_code(), 0);
        assert_eq!(result.report.verdict, Verdict::Pass);
        assert_eq!(
            result.report.commands,
            vec!["AT", "AT+CPIN?", "AT+CHUP", "ATD+33612345678;", "AT+CHUP"]
        );
        assert!(port.is_closed());
    }

    #[test]
    fn test_run_connect_failure_report() {
        let opener = MockOpener::never();
        let config = SessionConfig::builder("/dev/ttyUSB4").build().unwrap();
        let clock = ManualClock::new();

        let result = run(&opener, clock.clone(), &config, "+33612345678", Scenario::Basic);

        assert!(!result.passed());
        assert_eq!(result.exit_code(), exit_codes::CONNECTION_FAILED);
        assert_eq!(result.report.failure_kind.as_deref(), Some("connect_failure"));
        assert!(result.report.commands.is_empty());
        assert_eq!(clock.elapsed(), Duration::from_secs(5));
    }

    #[test]
    fn test_run_closes_link_on_auth_failure() {
        let mut port = MockSerialPort::new("MOCK0");
        port.reply_to("AT\r", ["\r\nOK\r\n"]);
        port.reply_to("AT+CPIN?", ["+CPIN: SIM PIN\r\n"]);
        let opener = MockOpener::ready(port.clone());
        let config = SessionConfig::builder("/dev/ttyUSB4").build().unwrap();

        let result = run(&opener, ManualClock::new(), &config, "112", Scenario::Basic);

        assert_eq!(result.exit_code(), exit_codes::AUTH_FAILED);
        assert_eq!(port.close_count(), 1);
        assert_eq!(port.count_sent("ATD"), 0);
    }

    #[test]
    fn test_elapsed_millis_saturates() {
        assert_eq!(millis(Duration::from_micros(11_500_900)), 11_500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_scenario_names() {
        assert_eq!(Scenario::AudioMessage.to_string(), "audio-message");
        assert_eq!(
            serde_json::to_string(&Scenario::AudioMessage).unwrap(),
            "\"audio-message\""
        );
    }
}
