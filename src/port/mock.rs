//! Mock serial port implementation for testing.
//!
//! Provides a `MockSerialPort` that behaves like a scripted modem: reply
//! rules fire on matching writes, and each queued chunk is delivered as a
//! separate arrival so tests control exactly what one drain sees.

use super::error::PortError;
use super::traits::{PortConfiguration, PortOpener, SerialPortAdapter};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A one-shot reply rule: when a write starts with `trigger`, queue `replies`.
#[derive(Debug, Clone)]
struct ReplyRule {
    trigger: Vec<u8>,
    replies: Vec<Vec<u8>>,
}

/// Inner state of the mock port, protected by a mutex for interior mutability.
#[derive(Debug, Default)]
struct MockPortState {
    /// Pending arrivals; one drain consumes at most the front one.
    arrivals: VecDeque<VecDeque<u8>>,
    /// Log of all bytes written to the port.
    write_log: Vec<Vec<u8>>,
    /// Reply rules, consumed in order of registration.
    rules: Vec<ReplyRule>,
    /// Whether the next write should fail with a broken pipe.
    fail_next_write: bool,
    /// Number of times `close` was called.
    close_count: usize,
}

/// Mock serial port implementation for testing.
///
/// This implementation allows you to:
/// - Enqueue data to be returned by read operations, one arrival per drain
/// - Register replies that the "modem" sends when a command is written
/// - Inspect what data was written and whether the port was closed
///
/// # Example
/// ```
/// use gsm_call_test::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.reply_to("AT\r", ["\r\nOK\r\n"]);
///
/// port.write_bytes(b"AT\r").unwrap();
/// assert_eq!(port.read_available().unwrap(), b"\r\nOK\r\n");
///
/// assert_eq!(port.sent_commands(), vec!["AT".to_string()]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    /// The port name/identifier.
    name: String,
    /// The internal state, wrapped in Arc<Mutex<>> for interior mutability.
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState::default())),
        }
    }

    /// Enqueue one arrival of bytes, returned by a single later drain.
    pub fn enqueue_read(&mut self, data: impl AsRef<[u8]>) {
        let mut state = self.state.lock().unwrap();
        state.arrivals.push_back(data.as_ref().iter().copied().collect());
    }

    /// Register a one-shot reply: the first write starting with `trigger`
    /// after earlier rules for it are used queues each reply as an arrival.
    pub fn reply_to<T, I, R>(&mut self, trigger: T, replies: I)
    where
        T: AsRef<[u8]>,
        I: IntoIterator<Item = R>,
        R: AsRef<[u8]>,
    {
        let mut state = self.state.lock().unwrap();
        state.rules.push(ReplyRule {
            trigger: trigger.as_ref().to_vec(),
            replies: replies.into_iter().map(|r| r.as_ref().to_vec()).collect(),
        });
    }

    /// Get a copy of all data written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state.write_log.clone()
    }

    /// Written commands as text, with the trailing carriage return removed.
    pub fn sent_commands(&self) -> Vec<String> {
        self.get_write_log()
            .iter()
            .map(|w| {
                String::from_utf8_lossy(w)
                    .trim_end_matches('\r')
                    .to_string()
            })
            .collect()
    }

    /// Count written commands starting with `prefix`.
    pub fn count_sent(&self, prefix: &str) -> usize {
        self.sent_commands()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Make the next write fail as if the device was unplugged.
    pub fn fail_next_write(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.fail_next_write = true;
    }

    /// Number of times the port was closed.
    pub fn close_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.close_count
    }

    /// Whether the port was closed at least once.
    pub fn is_closed(&self) -> bool {
        self.close_count() > 0
    }

    /// Number of arrivals not yet drained.
    pub fn pending_arrivals(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.arrivals.len()
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock().unwrap();

        if state.fail_next_write {
            state.fail_next_write = false;
            return Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "device went away",
            )));
        }

        state.write_log.push(data.to_vec());

        if let Some(idx) = state
            .rules
            .iter()
            .position(|rule| data.starts_with(&rule.trigger))
        {
            let rule = state.rules.remove(idx);
            for reply in rule.replies {
                state.arrivals.push_back(reply.into_iter().collect());
            }
        }

        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock().unwrap();

        let would_block = || {
            PortError::Io(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "No data available",
            ))
        };

        let Some(front) = state.arrivals.front_mut() else {
            return Err(would_block());
        };

        // An exhausted arrival ends the current drain.
        if front.is_empty() {
            state.arrivals.pop_front();
            return Err(would_block());
        }

        let n = buffer.len().min(front.len());
        for (slot, byte) in buffer.iter_mut().zip(front.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock().unwrap();
        state.close_count += 1;
        Ok(())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("pending_arrivals", &self.pending_arrivals())
            .finish()
    }
}

/// Opener that refuses a number of attempts before handing out a mock port.
///
/// `MockOpener::never()` never succeeds, modelling a modem that does not
/// enumerate.
#[derive(Debug)]
pub struct MockOpener {
    port: MockSerialPort,
    failures_left: Mutex<Option<usize>>,
    attempts: Mutex<Vec<(String, PortConfiguration)>>,
}

impl MockOpener {
    /// Succeed on the first attempt.
    pub fn ready(port: MockSerialPort) -> Self {
        Self::after_failures(port, 0)
    }

    /// Fail `failures` times with `NotFound`, then succeed.
    pub fn after_failures(port: MockSerialPort, failures: usize) -> Self {
        Self {
            port,
            failures_left: Mutex::new(Some(failures)),
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Never succeed.
    pub fn never() -> Self {
        Self {
            port: MockSerialPort::new("MOCK-ABSENT"),
            failures_left: Mutex::new(None),
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Number of open attempts seen so far.
    pub fn attempts(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    /// The configuration passed to the most recent attempt.
    pub fn last_config(&self) -> Option<PortConfiguration> {
        self.attempts
            .lock()
            .unwrap()
            .last()
            .map(|(_, config)| config.clone())
    }
}

impl PortOpener for MockOpener {
    type Port = MockSerialPort;

    fn open(&self, port_name: &str, config: &PortConfiguration) -> Result<MockSerialPort, PortError> {
        self.attempts
            .lock()
            .unwrap()
            .push((port_name.to_string(), config.clone()));

        let mut failures_left = self.failures_left.lock().unwrap();
        match failures_left.as_mut() {
            Some(0) => Ok(self.port.clone()),
            Some(n) => {
                *n -= 1;
                Err(PortError::not_found(port_name))
            }
            None => Err(PortError::not_found(port_name)),
        }
    }
}
