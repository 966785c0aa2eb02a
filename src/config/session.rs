//! Immutable parameters of one test session.

use super::error::{ConfigError, ConfigResult};
use super::schema::ModemConfig;
use crate::at::POLL_INTERVAL;
use crate::port::{FlowControl, PortConfiguration};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BAUD_RATE: u32 = 115200;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything the connection manager, AT session and call controller need.
///
/// Built once through [`SessionConfigBuilder`] and read-only afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    device: String,
    baud_rate: u32,
    flow_control: FlowControl,
    pin: Option<String>,
    connect_timeout: Duration,
    response_timeout: Duration,
    dial_timeout: Duration,
}

impl SessionConfig {
    /// Start building a configuration for `device` with the defaults.
    pub fn builder(device: impl Into<String>) -> SessionConfigBuilder {
        SessionConfigBuilder::new(device)
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn flow_control(&self) -> FlowControl {
        self.flow_control
    }

    pub fn pin(&self) -> Option<&str> {
        self.pin.as_deref()
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    pub fn dial_timeout(&self) -> Duration {
        self.dial_timeout
    }

    /// Low level port settings; the device read timeout follows the
    /// response timeout.
    pub fn port_configuration(&self) -> PortConfiguration {
        PortConfiguration {
            baud_rate: self.baud_rate,
            flow_control: self.flow_control,
            timeout: self.response_timeout,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("device", &self.device)
            .field("baud_rate", &self.baud_rate)
            .field("flow_control", &self.flow_control)
            .field("pin", &self.pin.as_ref().map(|_| "****"))
            .field("connect_timeout", &self.connect_timeout)
            .field("response_timeout", &self.response_timeout)
            .field("dial_timeout", &self.dial_timeout)
            .finish()
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Clone)]
pub struct SessionConfigBuilder {
    inner: SessionConfig,
}

impl SessionConfigBuilder {
    fn new(device: impl Into<String>) -> Self {
        Self {
            inner: SessionConfig {
                device: device.into(),
                baud_rate: DEFAULT_BAUD_RATE,
                flow_control: FlowControl::None,
                pin: None,
                connect_timeout: DEFAULT_CONNECT_TIMEOUT,
                response_timeout: DEFAULT_RESPONSE_TIMEOUT,
                dial_timeout: DEFAULT_DIAL_TIMEOUT,
            },
        }
    }

    /// Take baud rate, flow control and timeouts from the `[modem]` section.
    pub fn modem(mut self, modem: &ModemConfig) -> Self {
        self.inner.baud_rate = modem.baud_rate;
        self.inner.flow_control = modem.flow_control;
        self.inner.connect_timeout = modem.connect_timeout();
        self.inner.response_timeout = modem.response_timeout();
        self.inner.dial_timeout = modem.dial_timeout();
        self
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.inner.baud_rate = baud_rate;
        self
    }

    pub fn flow_control(mut self, flow_control: FlowControl) -> Self {
        self.inner.flow_control = flow_control;
        self
    }

    /// SIM PIN; empty strings count as no PIN.
    pub fn pin(mut self, pin: Option<String>) -> Self {
        self.inner.pin = pin.filter(|p| !p.is_empty());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.inner.connect_timeout = timeout;
        self
    }

    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.inner.response_timeout = timeout;
        self
    }

    pub fn dial_timeout(mut self, timeout: Duration) -> Self {
        self.inner.dial_timeout = timeout;
        self
    }

    /// Finish the configuration, rejecting values that cannot drive a run:
    /// a zero baud rate or connect timeout, and reply waits shorter than one
    /// poll.
    pub fn build(self) -> ConfigResult<SessionConfig> {
        let config = self.inner;
        if config.baud_rate == 0 {
            return Err(ConfigError::validation("baud_rate", "must be non-zero"));
        }
        if config.connect_timeout.is_zero() {
            return Err(ConfigError::validation("connect_timeout", "must be non-zero"));
        }
        for (key, timeout) in [
            ("response_timeout", config.response_timeout),
            ("dial_timeout", config.dial_timeout),
        ] {
            if timeout < POLL_INTERVAL {
                return Err(ConfigError::validation(
                    key,
                    format!("must be at least {:?}", POLL_INTERVAL),
                ));
            }
        }
        Ok(config)
    }
}

/// Parse a positive, finite number of seconds such as `2.5`.
pub fn parse_seconds(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number of seconds"))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(format!("'{value}' must be a positive number of seconds"));
    }
    Duration::try_from_secs_f64(seconds).map_err(|e| format!("'{value}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::builder("/dev/ttyUSB4").build().unwrap();
        assert_eq!(config.device(), "/dev/ttyUSB4");
        assert_eq!(config.baud_rate(), 115200);
        assert_eq!(config.pin(), None);
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.response_timeout(), Duration::from_secs(5));
        assert_eq!(config.dial_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_empty_pin_is_no_pin() {
        let config = SessionConfig::builder("/dev/ttyUSB4")
            .pin(Some(String::new()))
            .build()
            .unwrap();
        assert_eq!(config.pin(), None);
    }

    #[test]
    fn test_debug_masks_pin() {
        let config = SessionConfig::builder("/dev/ttyUSB4")
            .pin(Some("4321".into()))
            .build()
            .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("4321"));
        assert!(debug.contains("****"));
    }

    #[test]
    fn test_port_configuration_follows_session() {
        let config = SessionConfig::builder("/dev/ttyUSB4")
            .baud_rate(9600)
            .flow_control(FlowControl::Hardware)
            .response_timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let port = config.port_configuration();
        assert_eq!(port.baud_rate, 9600);
        assert_eq!(port.flow_control, FlowControl::Hardware);
        assert_eq!(port.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_modem_section_applies() {
        let modem = ModemConfig {
            baud_rate: 57600,
            dial_timeout_ms: 30_000,
            ..ModemConfig::default()
        };
        let config = SessionConfig::builder("gsm").modem(&modem).build().unwrap();
        assert_eq!(config.baud_rate(), 57600);
        assert_eq!(config.dial_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_build_rejects_zero_response_timeout() {
        let err = SessionConfig::builder("/dev/ttyUSB4")
            .response_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref key, .. } if key == "response_timeout"));
    }

    #[test]
    fn test_build_rejects_waits_shorter_than_a_poll() {
        let err = SessionConfig::builder("/dev/ttyUSB4")
            .dial_timeout(Duration::from_millis(499))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref key, .. } if key == "dial_timeout"));

        assert!(SessionConfig::builder("/dev/ttyUSB4")
            .response_timeout(POLL_INTERVAL)
            .dial_timeout(POLL_INTERVAL)
            .build()
            .is_ok());
    }

    #[test]
    fn test_build_rejects_zero_baud_and_connect_timeout() {
        assert!(SessionConfig::builder("/dev/ttyUSB4")
            .baud_rate(0)
            .build()
            .is_err());
        assert!(SessionConfig::builder("/dev/ttyUSB4")
            .connect_timeout(Duration::ZERO)
            .build()
            .is_err());
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("2.5"), Ok(Duration::from_millis(2500)));
        assert_eq!(parse_seconds(" 60 "), Ok(Duration::from_secs(60)));
        for bad in ["0", "-1", "NaN", "inf", "-inf", "soon", ""] {
            assert!(parse_seconds(bad).is_err(), "{bad} accepted");
        }
    }
}
