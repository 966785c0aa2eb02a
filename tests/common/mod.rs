//! Shared test utilities for the call tester integration tests.
//!
//! This module provides scripted modems for the common situations:
//! - an unlocked SIM that accepts every command
//! - a SIM that asks for a PIN and unlocks with the right one
//! - a SIM that rejects the PIN

#![allow(dead_code)]

use gsm_call_test::port::MockSerialPort;

pub const NUMBER: &str = "+33612345678";
pub const PIN: &str = "0000";

pub const OK: &str = "\r\nOK\r\n";

/// Modem with a SIM that needs no PIN, answering the handshake only.
pub fn unlocked_modem() -> MockSerialPort {
    let mut port = MockSerialPort::new("MOCK0");
    port.reply_to("AT\r", [OK]);
    port.reply_to("AT+CPIN?", ["\r\n+CPIN: READY\r\n\r\nOK\r\n"]);
    port
}

/// Unlocked modem that also acknowledges two hang ups and the dial.
pub fn answering_modem() -> MockSerialPort {
    let mut port = unlocked_modem();
    port.reply_to("AT+CHUP", [OK]);
    port.reply_to("ATD", [OK]);
    port.reply_to("AT+CHUP", ["\r\nVOICE CALL: END: 000010\r\n\r\nOK\r\n"]);
    port
}

/// Modem whose SIM asks for `pin` and prints `PB DONE` once unlocked.
pub fn pin_locked_modem(pin: &str) -> MockSerialPort {
    let mut port = MockSerialPort::new("MOCK0");
    port.reply_to("AT\r", [OK]);
    port.reply_to("AT+CPIN?", ["\r\n+CPIN: SIM PIN\r\n"]);
    port.reply_to(
        format!("AT+CPIN={pin}\r"),
        [OK, "\r\n+CPIN: READY\r\n", "\r\nSMS DONE\r\n\r\nPB DONE\r\n"],
    );
    port.reply_to("AT+CPIN?", ["\r\n+CPIN: READY\r\n\r\nOK\r\n"]);
    port
}
