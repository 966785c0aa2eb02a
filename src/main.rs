use clap::Parser;
use gsm_call_test::config::{parse_seconds, Config, ConfigLoader, SessionConfig};
use gsm_call_test::error::exit_codes;
use gsm_call_test::port::list_ports;
use gsm_call_test::{logging, run, ConfigResult, Scenario, SerialOpener, SystemClock};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Test an outbound voice call on a GSM modem.",
    long_about = "Opens the modem's serial device, unlocks the SIM if needed, dials the given number, holds the call and hangs up. Exits with status 0 when the call went through."
)]
struct Args {
    /// The device path (ex: /dev/ttyUSB4) or an alias from the config file
    #[arg(required_unless_present = "list_ports")]
    device: Option<String>,

    /// The phone number to call (ex: +33612345678)
    #[arg(required_unless_present = "list_ports")]
    number: Option<String>,

    /// The SIM PIN code (ex: 0000)
    pin: Option<String>,

    /// Call sequence to run
    #[arg(long, value_enum, default_value_t = Scenario::Basic)]
    scenario: Scenario,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Baud rate
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    baud: Option<u32>,

    /// Seconds to wait for the device to appear
    #[arg(
        long,
        value_name = "SECONDS",
        value_parser = parse_seconds,
        allow_negative_numbers = true
    )]
    connect_timeout: Option<Duration>,

    /// Seconds to wait for a command reply
    #[arg(
        long,
        value_name = "SECONDS",
        value_parser = parse_seconds,
        allow_negative_numbers = true
    )]
    response_timeout: Option<Duration>,

    /// Seconds to wait for call state notifications
    #[arg(
        long,
        value_name = "SECONDS",
        value_parser = parse_seconds,
        allow_negative_numbers = true
    )]
    dial_timeout: Option<Duration>,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// List serial ports and exit
    #[arg(long)]
    list_ports: bool,
}

fn load_config(args: &Args) -> ConfigResult<Config> {
    let loaded = match args.config {
        Some(ref path) => ConfigLoader::load_from(path).map(ConfigLoader::into_config),
        None => ConfigLoader::load().map(ConfigLoader::into_config),
    };
    match loaded {
        // Listing ports needs no modem settings.
        Err(e) if args.list_ports => {
            eprintln!("Warning: ignoring configuration: {e}");
            Ok(Config::default())
        }
        other => other,
    }
}

fn session_config(
    args: &Args,
    config: &Config,
    device: &str,
) -> ConfigResult<SessionConfig> {
    let mut builder = SessionConfig::builder(config.modem.resolve_port(device))
        .modem(&config.modem)
        .pin(args.pin.clone());
    if let Some(baud) = args.baud {
        builder = builder.baud_rate(baud);
    }
    if let Some(timeout) = args.connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    if let Some(timeout) = args.response_timeout {
        builder = builder.response_timeout(timeout);
    }
    if let Some(timeout) = args.dial_timeout {
        builder = builder.dial_timeout(timeout);
    }
    builder.build()
}

fn print_ports() -> ExitCode {
    match list_ports() {
        Ok(ports) if ports.is_empty() => {
            println!("No serial ports detected on this system");
            ExitCode::SUCCESS
        }
        Ok(ports) => {
            for port in ports {
                println!("{}\t{}", port.name, port.description);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: cannot list serial ports: {e}");
            ExitCode::from(exit_codes::PORT_ERROR)
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(exit_codes::CONFIG_ERROR);
        }
    };

    logging::init(&config.logging, args.verbose);

    if args.list_ports {
        return print_ports();
    }

    let (Some(device), Some(number)) = (args.device.as_deref(), args.number.as_deref()) else {
        eprintln!("Error: a device and a number are required");
        return ExitCode::from(exit_codes::INVALID_ARGS);
    };

    let session = match session_config(&args, &config, device) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(exit_codes::INVALID_ARGS);
        }
    };
    tracing::debug!("{:?}", session);

    let result = run(&SerialOpener, SystemClock, &session, number, args.scenario);

    if args.json {
        match result.report.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error: cannot encode report: {e}"),
        }
    } else {
        if result.passed() {
            println!("{}", result.report.banner(std::io::stdout().is_terminal()));
        } else {
            eprintln!("{}", result.report.banner(std::io::stderr().is_terminal()));
        }
    }

    ExitCode::from(result.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use std::io::Write;

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec!["gsm-call-test", "/dev/ttyUSB4", "+33612345678"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv)
    }

    #[test]
    fn test_timeouts_in_seconds() {
        let args = parse(&["--response-timeout", "2.5", "--dial-timeout", "30"]).unwrap();
        assert_eq!(args.response_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(args.dial_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_rejects_bad_timeouts() {
        for flag in ["--connect-timeout", "--response-timeout", "--dial-timeout"] {
            for value in ["0", "-1", "NaN", "inf", "later"] {
                let err = parse(&[flag, value]).unwrap_err();
                assert_eq!(err.kind(), ErrorKind::ValueValidation, "{flag} {value}");
                assert_eq!(err.exit_code(), i32::from(exit_codes::INVALID_ARGS));
            }
        }
    }

    #[test]
    fn test_rejects_zero_baud() {
        let err = parse(&["--baud", "0"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert_eq!(parse(&["--baud", "9600"]).unwrap().baud, Some(9600));
    }

    #[test]
    fn test_reply_waits_shorter_than_a_poll_are_invalid() {
        let config = Config::default();

        let args = parse(&["--response-timeout", "0.1"]).unwrap();
        assert!(session_config(&args, &config, "/dev/ttyUSB4").is_err());

        let args = parse(&["--dial-timeout", "0.2"]).unwrap();
        assert!(session_config(&args, &config, "/dev/ttyUSB4").is_err());

        let args = parse(&["--connect-timeout", "0.1", "--baud", "9600"]).unwrap();
        let session = session_config(&args, &config, "/dev/ttyUSB4").unwrap();
        assert_eq!(session.connect_timeout(), Duration::from_millis(100));
        assert_eq!(session.baud_rate(), 9600);
    }

    #[test]
    fn test_broken_config_does_not_block_port_listing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[modem\nbaud_rate = ").unwrap();
        let path = file.path().to_str().unwrap();

        let listing = Args::try_parse_from(["gsm-call-test", "--list-ports", "--config", path]).unwrap();
        assert_eq!(load_config(&listing).unwrap(), Config::default());

        let calling = parse(&["--config", path]).unwrap();
        assert!(load_config(&calling).is_err());
    }
}
