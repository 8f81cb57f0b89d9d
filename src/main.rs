//! nativeterm - print the terminal size
//!
//! ```text
//! nativeterm              # "80 24" for the terminal on stdout
//! nativeterm -e           # query stderr instead (Unix)
//! nativeterm -a           # enable ANSI escape processing first (Windows)
//! ```

mod config;

use std::env;

use anyhow::Context;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use nativeterm::{Stream, TerminalSize};

use crate::config::Config;

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    eprintln!("nativeterm {}", VERSION);
}

fn print_help() {
    eprintln!("nativeterm {} - Print the terminal size", VERSION);
    eprintln!();
    eprintln!("Usage: nativeterm [OPTIONS]");
    eprintln!();
    eprintln!("Prints \"<columns> <rows>\" on stdout.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -e, --stderr          Query the terminal attached to stderr (Unix)");
    eprintln!("  -a, --ansi            Enable ANSI escape processing first (Windows)");
    eprintln!("  -v, --verbose         Debug logging on stderr");
    eprintln!("  -V, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Configuration: ~/.nativeterm/config.toml");
}

/// Command line overrides applied on top of the config file
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    stream: Option<Stream>,
    enable_ansi: bool,
    verbose: bool,
}

enum Command {
    Run(Args),
    Help,
    Version,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Command, String> {
    let mut parsed = Args::default();

    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-V" | "--version" => return Ok(Command::Version),
            "-e" | "--stderr" => parsed.stream = Some(Stream::Stderr),
            "-a" | "--ansi" => parsed.enable_ansi = true,
            "-v" | "--verbose" => parsed.verbose = true,
            other => {
                return Err(format!("Unknown argument: {}. Use -h for help.", other));
            }
        }
    }

    Ok(Command::Run(parsed))
}

fn init_logging(filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter)
        .with_context(|| format!("Invalid log filter: {}", filter))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args(env::args().skip(1)) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            print_help();
            return Ok(());
        }
        Ok(Command::Version) => {
            print_version();
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(2);
        }
    };

    let mut config = Config::load()?;
    if let Some(stream) = args.stream {
        config.stream = stream;
    }
    config.enable_ansi |= args.enable_ansi;
    if args.verbose {
        config.log_level = "debug".to_string();
    }

    init_logging(&config.log_level)?;
    debug!(?config, "Configuration loaded");

    nativeterm::init().context("Native terminal support unavailable")?;

    let size = query(&config)?;
    info!(%size, "Terminal size");
    println!("{} {}", size.columns, size.rows);

    Ok(())
}

#[cfg(unix)]
fn query(config: &Config) -> anyhow::Result<TerminalSize> {
    if config.enable_ansi {
        debug!("ANSI escape processing is native on Unix; nothing to enable");
    }
    let size = nativeterm::get_terminal_size(config.stream == Stream::Stdout)
        .with_context(|| format!("Failed to query terminal size on {:?}", config.stream))?;
    Ok(size)
}

#[cfg(windows)]
fn query(config: &Config) -> anyhow::Result<TerminalSize> {
    if config.enable_ansi {
        nativeterm::enable_ansi_windows().context("Failed to enable ANSI output")?;
    }
    if config.stream != Stream::Stdout {
        debug!(stream = ?config.stream, "Console size is always read from stdout on Windows");
    }
    let size = nativeterm::get_terminal_size_windows().context("Failed to query console size")?;
    Ok(size)
}

#[cfg(not(any(unix, windows)))]
fn query(_config: &Config) -> anyhow::Result<TerminalSize> {
    anyhow::bail!("nativeterm supports Unix and Windows only")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, String> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_no_args() {
        match parse(&[]) {
            Ok(Command::Run(args)) => assert_eq!(args, Args::default()),
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_flags() {
        match parse(&["-e", "--ansi", "-v"]) {
            Ok(Command::Run(args)) => {
                assert_eq!(args.stream, Some(Stream::Stderr));
                assert!(args.enable_ansi);
                assert!(args.verbose);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_help_and_version() {
        assert!(matches!(parse(&["-e", "--help"]), Ok(Command::Help)));
        assert!(matches!(parse(&["-V"]), Ok(Command::Version)));
    }

    #[test]
    fn test_unknown_argument() {
        let err = parse(&["--rows"]).err().unwrap();
        assert!(err.contains("--rows"));
    }
}
