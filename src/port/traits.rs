//! Core traits for serial port abstraction.
//!
//! Defines the `SerialPortAdapter` trait that lets the AT session run over a
//! real modem or over the scripted `MockSerialPort`, and the `PortOpener`
//! trait the connection manager retries against.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Size of the scratch buffer used when draining a port.
const DRAIN_CHUNK: usize = 256;

/// Configuration parameters for opening a serial port.
///
/// Modems are driven 8N1; only the line speed, flow control and the low
/// level read timeout vary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Flow control mode.
    pub flow_control: FlowControl,

    /// Read/write timeout of the underlying device.
    pub timeout: Duration,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            baud_rate: 115200,
            flow_control: FlowControl::None,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Flow control modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControl {
    #[default]
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Trait for serial port I/O operations.
///
/// This trait abstracts over synchronous serial port operations, allowing both
/// real hardware ports and mock implementations for testing.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the serial port.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the serial port into the provided buffer.
    ///
    /// Returns the number of bytes actually read. An `Io` error of kind
    /// `WouldBlock` or `TimedOut` means no data is pending.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Read everything that is pending right now without waiting for more.
    ///
    /// Returns an empty vector when nothing has arrived.
    fn read_available(&mut self) -> Result<Vec<u8>, PortError> {
        let mut received = Vec::new();
        let mut chunk = [0u8; DRAIN_CHUNK];
        loop {
            match self.read_bytes(&mut chunk) {
                Ok(0) => break,
                Ok(n) => received.extend_from_slice(&chunk[..n]),
                Err(e) if e.is_would_block() => break,
                Err(e) => return Err(e),
            }
        }
        Ok(received)
    }

    /// Release the device.
    ///
    /// Ports close when dropped; this hook lets adapters flush or record the
    /// release explicitly.
    fn close(&mut self) -> Result<(), PortError> {
        Ok(())
    }
}

/// Opens a serial device, possibly failing while it is not enumerated yet.
pub trait PortOpener {
    /// The adapter produced by a successful open.
    type Port: SerialPortAdapter;

    /// Try once to open `port_name` with the given configuration.
    fn open(&self, port_name: &str, config: &PortConfiguration) -> Result<Self::Port, PortError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration() {
        let config = PortConfiguration::default();
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.flow_control, FlowControl::None);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_flow_control_conversion() {
        let flow = FlowControl::Hardware;
        let serialport_flow: serialport::FlowControl = flow.into();
        assert_eq!(serialport_flow, serialport::FlowControl::Hardware);
    }

    #[test]
    fn test_flow_control_serde_names() {
        let flow: FlowControl = serde_json::from_str("\"software\"").unwrap();
        assert_eq!(flow, FlowControl::Software);
        assert_eq!(serde_json::to_string(&FlowControl::None).unwrap(), "\"none\"");
    }

    /// Adapter returning a fixed sequence of read results.
    #[derive(Debug)]
    struct Reads(Vec<Result<Vec<u8>, std::io::ErrorKind>>);

    impl SerialPortAdapter for Reads {
        fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
            Ok(data.len())
        }

        fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
            if self.0.is_empty() {
                return Ok(0);
            }
            match self.0.remove(0) {
                Ok(bytes) => {
                    buffer[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Err(kind) => Err(PortError::Io(std::io::Error::new(kind, "scripted"))),
            }
        }

        fn name(&self) -> &str {
            "READS"
        }
    }

    #[test]
    fn test_read_available_stops_on_would_block() {
        let mut port = Reads(vec![
            Ok(b"\r\nO".to_vec()),
            Ok(b"K\r\n".to_vec()),
            Err(std::io::ErrorKind::WouldBlock),
            Ok(b"later".to_vec()),
        ]);
        assert_eq!(port.read_available().unwrap(), b"\r\nOK\r\n");
        assert_eq!(port.read_available().unwrap(), b"later");
    }

    #[test]
    fn test_read_available_propagates_hard_errors() {
        let mut port = Reads(vec![Ok(b"AT".to_vec()), Err(std::io::ErrorKind::BrokenPipe)]);
        assert!(matches!(port.read_available(), Err(PortError::Io(_))));
    }
}
