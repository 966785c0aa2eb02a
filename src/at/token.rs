//! Token matching over raw modem output.
//!
//! Replies are unframed text; a token is any substring. Matching is done on
//! bytes so partial UTF-8 from the modem never fails a read.

use memchr::memmem;
use serde::Serialize;
use std::fmt;

pub const OK: &str = "OK";
pub const ERROR: &str = "ERROR";
pub const PB_DONE: &str = "PB DONE";
pub const NO_CARRIER: &str = "NO CARRIER";
pub const VOICE_CALL_BEGIN: &str = "VOICE CALL: BEGIN";
pub const VOICE_CALL_END: &str = "VOICE CALL: END";

/// Result of waiting for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenMatch {
    /// The expected token was seen.
    Success,
    /// The failure token was seen first.
    Failure,
    /// Neither token arrived before the deadline.
    TimedOut,
}

impl TokenMatch {
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl fmt::Display for TokenMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "expected reply received"),
            Self::Failure => write!(f, "failure reply received"),
            Self::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Check one read for the success token, then for the failure token.
///
/// Success wins when both appear in the same read.
pub fn scan(data: &[u8], success: &str, failure: Option<&str>) -> Option<TokenMatch> {
    if contains(data, success) {
        return Some(TokenMatch::Success);
    }
    match failure {
        Some(token) if contains(data, token) => Some(TokenMatch::Failure),
        _ => None,
    }
}

fn contains(data: &[u8], token: &str) -> bool {
    memmem::find(data, token.as_bytes()).is_some()
}

/// Modem output rendered for a log line.
pub fn printable(data: &[u8]) -> String {
    String::from_utf8_lossy(data).escape_debug().to_string()
}
