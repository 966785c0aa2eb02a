//! `tracing` subscriber setup for the binary.

use crate::config::{LogFormat, LoggingConfig};
use std::io::IsTerminal;
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Level directive for the configured level raised by `-v` flags.
pub fn level_directive(config: &LoggingConfig, verbosity: u8) -> String {
    match verbosity {
        0 => config.level.to_ascii_lowercase(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Subscriber writing `format` records that pass `filter` to `writer`.
pub fn dispatch<W>(format: LogFormat, filter: EnvFilter, writer: W, ansi: bool) -> Dispatch
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false);

    match format {
        LogFormat::Json => Dispatch::new(builder.json().finish()),
        LogFormat::Compact => Dispatch::new(builder.compact().finish()),
        LogFormat::Pretty => Dispatch::new(builder.pretty().finish()),
    }
}

/// Install the global subscriber. Logs go to stderr so stdout only carries
/// the report. `RUST_LOG`, when set, replaces the configured level.
pub fn init(config: &LoggingConfig, verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(config, verbosity)));
    let ansi = std::io::stderr().is_terminal();

    let subscriber = dispatch(config.format, filter, std::io::stderr, ansi);
    if let Err(e) = tracing::dispatcher::set_global_default(subscriber) {
        eprintln!("Warning: logging already initialised: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'w> MakeWriter<'w> for Capture {
        type Writer = Capture;

        fn make_writer(&'w self) -> Self::Writer {
            self.clone()
        }
    }

    fn emit(format: LogFormat) -> String {
        let capture = Capture::default();
        let subscriber = dispatch(format, EnvFilter::new("info"), capture.clone(), false);
        tracing::dispatcher::with_default(&subscriber, || {
            tracing::info!(">> AT");
            tracing::debug!("filtered out");
        });
        capture.text()
    }

    fn lines(text: &str) -> Vec<&str> {
        text.lines().filter(|l| !l.trim().is_empty()).collect()
    }

    #[test]
    fn test_level_directive() {
        let config = LoggingConfig {
            level: "WARN".into(),
            ..LoggingConfig::default()
        };
        assert_eq!(level_directive(&config, 0), "warn");
        assert_eq!(level_directive(&config, 1), "debug");
        assert_eq!(level_directive(&config, 4), "trace");
    }

    #[test]
    fn test_json_format() {
        let text = emit(LogFormat::Json);
        let records = lines(&text);
        assert_eq!(records.len(), 1);
        let record: serde_json::Value = serde_json::from_str(records[0]).unwrap();
        assert_eq!(record["fields"]["message"], ">> AT");
        assert_eq!(record["level"], "INFO");
    }

    #[test]
    fn test_compact_format_is_one_line() {
        let text = emit(LogFormat::Compact);
        let records = lines(&text);
        assert_eq!(records.len(), 1);
        assert!(records[0].contains(">> AT"));
        assert!(!text.contains("filtered out"));
    }

    #[test]
    fn test_pretty_format_adds_source_location() {
        let text = emit(LogFormat::Pretty);
        assert!(text.contains(">> AT"));
        assert!(lines(&text).len() > 1, "{text}");
        assert!(text.contains("src/logging.rs"), "{text}");
    }
}
