//! Final report of a run and its terminal rendering.
//!
//! Rendering is a pure function of the report; whether to style it is the
//! caller's choice.

use crate::runner::Scenario;
use crossterm::style::Stylize;
use serde::Serialize;

/// Pass or fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
}

/// What happened during one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallReport {
    pub device: String,
    pub number: String,
    pub scenario: Scenario,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub elapsed_ms: u64,
    /// Commands sent, PIN masked.
    pub commands: Vec<String>,
}

impl CallReport {
    /// One line banner, green on pass and red on failure when `styled`.
    pub fn banner(&self, styled: bool) -> String {
        let text = match (&self.verdict, &self.reason) {
            (Verdict::Pass, _) => "CALL TEST OK !".to_string(),
            (Verdict::Fail, Some(reason)) => format!("CALL TEST FAILED: {reason}"),
            (Verdict::Fail, None) => "CALL TEST FAILED".to_string(),
        };
        if !styled {
            return text;
        }
        match self.verdict {
            Verdict::Pass => text.green().bold().to_string(),
            Verdict::Fail => text.red().bold().to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn report(verdict: Verdict, reason: Option<&str>) -> CallReport {
        CallReport {
            device: "/dev/ttyUSB4".into(),
            number: "+33612345678".into(),
            scenario: Scenario::Basic,
            verdict,
            failure_kind: reason.map(|_| "dial_failure".to_string()),
            reason: reason.map(str::to_string),
            elapsed_ms: 11_500,
            commands: vec!["AT".into(), "AT+CPIN=****".into()],
        }
    }

    #[test]
    fn test_plain_banners() {
        assert_eq!(report(Verdict::Pass, None).banner(false), "CALL TEST OK !");
        assert_eq!(
            report(Verdict::Fail, Some("Dial to 112 rejected: timed out")).banner(false),
            "CALL TEST FAILED: Dial to 112 rejected: timed out"
        );
    }

    #[test]
    fn test_styled_banner_wraps_text_in_escape_codes() {
        let banner = report(Verdict::Pass, None).banner(true);
        assert!(banner.contains("CALL TEST OK !"));
        assert!(banner.starts_with('\u{1b}'));
        assert!(banner.ends_with('m'));
    }

    #[test]
    fn test_json_report() {
        let json = report(Verdict::Pass, None).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["verdict"], "pass");
        assert_eq!(value["scenario"], "basic");
        assert_eq!(value["elapsed_ms"], 11_500);
        assert!(value.get("reason").is_none());
        assert_eq!(value["commands"][1], "AT+CPIN=****");
    }
}
