//! Connection manager: open the modem's serial device, retrying while it
//! enumerates.
//!
//! USB modems often show up some time after power-on or reset, so a failed
//! open is treated as "not ready yet" until the connect timeout runs out.

use crate::at::AtSession;
use crate::clock::Clock;
use crate::config::SessionConfig;
use crate::error::{CallTestError, CallTestResult};
use crate::port::{PortConfiguration, PortError, PortOpener};
use std::time::Duration;
use tracing::{error, info, warn};

/// Delay before each open attempt.
pub const RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Try to open `device` every [`RETRY_INTERVAL`] until it succeeds or
/// `timeout` has elapsed.
pub fn connect<O, C>(
    opener: &O,
    clock: &C,
    device: &str,
    config: &PortConfiguration,
    timeout: Duration,
) -> CallTestResult<O::Port>
where
    O: PortOpener,
    C: Clock,
{
    info!(
        "create connection to device {} with baudrate {}",
        device, config.baud_rate
    );
    let start = clock.now();
    let mut attempts = 0;
    let mut last_error: Option<PortError> = None;

    while clock.elapsed_since(start) < timeout {
        clock.sleep(RETRY_INTERVAL);
        attempts += 1;
        match opener.open(device, config) {
            Ok(port) => {
                info!("device ready after {} attempt(s)", attempts);
                return Ok(port);
            }
            Err(e) => {
                warn!("wait for device ready... ({})", e);
                last_error = Some(e);
            }
        }
    }

    error!("device {} can't be ready !", device);
    Err(CallTestError::Connect {
        device: device.to_string(),
        timeout,
        attempts,
        last_error,
    })
}

/// Connect with the session's settings and wrap the link in an
/// [`AtSession`]. No AT command is sent yet.
pub fn open_session<O, C>(
    opener: &O,
    clock: C,
    config: &SessionConfig,
) -> CallTestResult<AtSession<O::Port, C>>
where
    O: PortOpener,
    C: Clock,
{
    let port = connect(
        opener,
        &clock,
        config.device(),
        &config.port_configuration(),
        config.connect_timeout(),
    )?;
    Ok(AtSession::new(port, clock, config))
}
