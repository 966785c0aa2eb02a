//! Tests against a real modem.
//!
//! These place a real call, so they are ignored by default. Run them with:
//!
//! ```text
//! TEST_PORT=/dev/ttyUSB4 TEST_NUMBER=+33612345678 TEST_PIN=0000 \
//!     cargo test --features hardware-tests -- --ignored --test-threads=1
//! ```

#![cfg(feature = "hardware-tests")]

use gsm_call_test::{open_session, run, Scenario, SerialOpener, SessionConfig, SystemClock};
use serial_test::serial;
use std::env;

fn hardware_config() -> Option<(SessionConfig, String)> {
    let port = env::var("TEST_PORT").ok()?;
    let number = env::var("TEST_NUMBER").ok()?;
    let config = SessionConfig::builder(port)
        .pin(env::var("TEST_PIN").ok())
        .build()
        .ok()?;
    Some((config, number))
}

#[test]
#[ignore]
#[serial]
fn modem_answers_handshake_and_unlocks() {
    let Some((config, _)) = hardware_config() else {
        eprintln!("TEST_PORT / TEST_NUMBER not set, skipping");
        return;
    };

    let mut session = open_session(&SerialOpener, SystemClock, &config)
        .expect("modem did not enumerate");
    session.init().expect("handshake or PIN failed");
}

#[test]
#[ignore]
#[serial]
fn basic_call_passes() {
    let Some((config, number)) = hardware_config() else {
        eprintln!("TEST_PORT / TEST_NUMBER not set, skipping");
        return;
    };

    let result = run(&SerialOpener, SystemClock, &config, &number, Scenario::Basic);
    assert!(result.passed(), "{:?}", result.error);
}
