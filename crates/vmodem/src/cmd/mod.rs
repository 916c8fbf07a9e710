use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use vmodem_frame::ResponseKind;
use vmodem_transport::HostChannelSpec;

use crate::exit::{transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod monitor;
pub mod parse;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize the modem and print unsolicited responses.
    Monitor(MonitorArgs),
    /// Send one AT command and print the reply.
    Send(SendArgs),
    /// Parse a captured modem byte stream offline.
    Parse(ParseArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Monitor(args) => monitor::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Parse(args) => parse::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Host channel: a device path, or `unix:<path>` for an emulator socket.
    #[arg(env = "VMODEM_DEVICE")]
    pub channel: String,
    /// Skip the standard init sequence.
    #[arg(long)]
    pub no_init: bool,
    /// Exit after printing N responses.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Host channel: a device path, or `unix:<path>` for an emulator socket.
    #[arg(env = "VMODEM_DEVICE")]
    pub channel: String,
    /// AT command to send, without the trailing carriage return.
    pub command: String,
    /// Response tag to wait for (e.g. CSQ, +CREG). Default: the final result.
    #[arg(long, value_name = "TAG")]
    pub expect: Option<String>,
    /// Maximum time to wait for the reply (e.g. 3s, 500ms).
    #[arg(long, default_value = "3s")]
    pub timeout: String,
    /// Skip the standard init sequence.
    #[arg(long)]
    pub no_init: bool,
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Capture file. Default: stdin.
    pub file: Option<PathBuf>,
    /// Treat bare LF line endings as CR.
    #[arg(long)]
    pub lf: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_channel(input: &str) -> CliResult<HostChannelSpec> {
    input
        .parse()
        .map_err(|err| transport_error("invalid channel", err))
}

pub(crate) fn parse_kind(input: &str) -> CliResult<ResponseKind> {
    input
        .parse()
        .map_err(|err: String| CliError::new(USAGE, err))
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn parse_kind_accepts_sigils_and_case() {
        assert_eq!(parse_kind("+CSQ").unwrap(), ResponseKind::Csq);
        assert_eq!(parse_kind("creg").unwrap(), ResponseKind::Creg);
        assert_eq!(parse_kind("^MBAU").unwrap(), ResponseKind::Mbau);
        assert_eq!(parse_kind("NOPE").unwrap_err().code, USAGE);
    }

    #[test]
    fn parse_channel_maps_bad_specs_to_usage() {
        assert!(matches!(
            parse_channel("unix:/tmp/modem.sock").unwrap(),
            HostChannelSpec::Socket(_)
        ));
        assert_eq!(parse_channel("unix:").unwrap_err().code, USAGE);
    }
}
