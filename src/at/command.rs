//! AT command lines understood by the modem.

use std::fmt;

/// Line terminator appended to every command.
pub const TERMINATOR: &str = "\r";

/// Commands the tester issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtCommand {
    /// `AT`: is anybody there.
    Attention,
    /// `AT+CPIN?`: SIM lock status.
    PinQuery,
    /// `AT+CPIN=<pin>`: unlock the SIM.
    PinEntry(String),
    /// `ATD<number>;`: voice call.
    Dial(String),
    /// `AT+CHUP`: hang up every call.
    HangUp,
}

impl AtCommand {
    /// The command text without terminator.
    pub fn text(&self) -> String {
        match self {
            Self::Attention => "AT".to_string(),
            Self::PinQuery => "AT+CPIN?".to_string(),
            Self::PinEntry(pin) => format!("AT+CPIN={pin}"),
            Self::Dial(number) => format!("ATD{number};"),
            Self::HangUp => "AT+CHUP".to_string(),
        }
    }

    /// Bytes written to the link.
    pub fn to_line(&self) -> Vec<u8> {
        let mut line = self.text().into_bytes();
        line.extend_from_slice(TERMINATOR.as_bytes());
        line
    }
}

/// Displays the command with the PIN masked, for logs and reports.
impl fmt::Display for AtCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinEntry(_) => write!(f, "AT+CPIN=****"),
            other => write!(f, "{}", other.text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_lines() {
        assert_eq!(AtCommand::Attention.to_line(), b"AT\r");
        assert_eq!(AtCommand::PinQuery.to_line(), b"AT+CPIN?\r");
        assert_eq!(AtCommand::PinEntry("0000".into()).to_line(), b"AT+CPIN=0000\r");
        assert_eq!(AtCommand::Dial("+33612345678".into()).to_line(), b"ATD+33612345678;\r");
        assert_eq!(AtCommand::HangUp.to_line(), b"AT+CHUP\r");
    }

    #[test]
    fn test_pin_is_masked_in_display() {
        let cmd = AtCommand::PinEntry("1234".into());
        assert_eq!(cmd.to_string(), "AT+CPIN=****");
        assert!(!cmd.to_string().contains("1234"));
        assert_eq!(AtCommand::Dial("112".into()).to_string(), "ATD112;");
    }
}
