mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "lorauplink", version, about = "LoRaWAN uplink decoder CLI")]
struct Cli {
    /// Output format (default: table on a terminal, json otherwise).
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        env = "LORAUPLINK_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decode_subcommand() {
        let cli = Cli::try_parse_from([
            "lorauplink",
            "--format",
            "json",
            "decode",
            "4004030201000500013C37AABBCCDD",
            "--devices",
            "devices.json",
            "--decode-timeout",
            "50ms",
        ])
        .expect("decode args should parse");

        match cli.command {
            Command::Decode(args) => {
                assert_eq!(args.pipeline.devices.to_str(), Some("devices.json"));
                assert_eq!(args.pipeline.decode_timeout, "50ms");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_stream_flags() {
        let cli = Cli::try_parse_from([
            "lorauplink",
            "stream",
            "-d",
            "devices.json",
            "--show-ignored",
            "--fail-fast",
        ])
        .expect("stream args should parse");

        assert!(matches!(
            cli.command,
            Command::Stream(ref args) if args.show_ignored && args.fail_fast
        ));
    }

    #[test]
    fn parses_parse_subcommand_without_devices() {
        let cli = Cli::try_parse_from(["lorauplink", "parse", "40040302010005000100000000"])
            .expect("parse args should parse");
        assert!(matches!(cli.command, Command::Parse(_)));
    }

    #[test]
    fn rejects_unknown_output_format() {
        let err = Cli::try_parse_from(["lorauplink", "--format", "raw", "version"])
            .expect_err("raw is not an output format");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
