use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use lorauplink_decoder::DecoderConfig;
use lorauplink_device::{DeviceRegistry, DevicesConfig, DEFAULT_MAX_CONFIG_SIZE};
use lorauplink_pipeline::{ReadingSchemas, UplinkPipeline};

use crate::exit::{config_error, pipeline_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod check;
pub mod decode;
pub mod parse;
pub mod stream;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode one hex-encoded uplink.
    Decode(DecodeArgs),
    /// Decode hex-encoded uplinks from stdin, one per line.
    Stream(StreamArgs),
    /// Show the fields of a hex-encoded frame without decrypting it.
    Parse(ParseArgs),
    /// Validate a device provisioning file and its decoder scripts.
    Check(CheckArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Stream(args) => stream::run(args, format),
        Command::Parse(args) => parse::run(args, format),
        Command::Check(args) => check::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct PipelineArgs {
    /// Device provisioning file (JSON).
    #[arg(long, short = 'd', value_name = "FILE", env = "LORAUPLINK_DEVICES")]
    pub devices: PathBuf,
    /// Wall-clock budget per decoder call (e.g. 10ms, 1s).
    #[arg(long, default_value = "10ms")]
    pub decode_timeout: String,
    /// Interpreter stack budget in KiB.
    #[arg(long, default_value_t = 256)]
    pub stack_kib: usize,
    /// Largest decoder script accepted, in KiB.
    #[arg(long, default_value_t = 256)]
    pub max_script_kib: usize,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// PHYPayload as hex (optionally 0x-prefixed, whitespace ignored).
    pub frame: String,
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
pub struct StreamArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,
    /// Also print frames from unknown devices.
    #[arg(long)]
    pub show_ignored: bool,
    /// Stop at the first frame that fails.
    #[arg(long)]
    pub fail_fast: bool,
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// PHYPayload as hex (optionally 0x-prefixed, whitespace ignored).
    pub frame: String,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Device provisioning file (JSON).
    #[arg(long, short = 'd', value_name = "FILE", env = "LORAUPLINK_DEVICES")]
    pub devices: PathBuf,
    /// Largest decoder script accepted, in KiB.
    #[arg(long, default_value_t = 256)]
    pub max_script_kib: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

impl PipelineArgs {
    pub fn decoder_config(&self) -> CliResult<DecoderConfig> {
        if self.stack_kib == 0 {
            return Err(CliError::new(USAGE, "--stack-kib must be greater than zero"));
        }
        Ok(DecoderConfig {
            timeout: parse_duration(&self.decode_timeout)?,
            stack_limit: self.stack_kib.saturating_mul(1024),
            max_script_size: self.max_script_kib.saturating_mul(1024),
            ..DecoderConfig::default()
        })
    }
}

/// Load the provisioning file and assemble a pipeline over it.
pub fn build_pipeline(args: &PipelineArgs) -> CliResult<UplinkPipeline> {
    let decoder_config = args.decoder_config()?;
    let config = load_devices(&args.devices)?;

    let registry = DeviceRegistry::from_config(&config)
        .map_err(|err| config_error("invalid device config", err))?;
    let schemas = ReadingSchemas::from_config(&config)
        .map_err(|err| pipeline_error("invalid reading schema", err))?;
    tracing::info!(
        devices = registry.len(),
        schemas = schemas.len(),
        path = %args.devices.display(),
        "loaded device registry"
    );

    Ok(UplinkPipeline::new(Arc::new(registry))
        .with_decoder_config(decoder_config)
        .with_reading_schemas(Arc::new(schemas)))
}

pub fn load_devices(path: &std::path::Path) -> CliResult<DevicesConfig> {
    DevicesConfig::from_file_with_limit(path, DEFAULT_MAX_CONFIG_SIZE)
        .map_err(|err| config_error("failed loading devices", err))
}

/// Decode a hex frame, tolerating a `0x` prefix and embedded whitespace.
pub fn parse_hex_frame(input: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let compact: String = digits.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(compact)
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "ms")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(match unit {
        "s" => Duration::from_secs(value),
        _ => Duration::from_millis(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_defaults_to_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("25").unwrap(), Duration::from_millis(25));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert_eq!(parse_duration("0ms").unwrap_err().code, USAGE);
        assert!(parse_duration("fast").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn hex_frames_accept_prefix_and_spaces() {
        assert_eq!(parse_hex_frame("0x40 04 03").unwrap(), vec![0x40, 0x04, 0x03]);
        assert_eq!(parse_hex_frame("  3c37\n").unwrap(), vec![0x3C, 0x37]);
        assert!(parse_hex_frame("abc").is_err());
        assert!(parse_hex_frame("zz").is_err());
    }

    #[test]
    fn decoder_config_from_args() {
        let args = PipelineArgs {
            devices: PathBuf::from("devices.json"),
            decode_timeout: "50ms".to_string(),
            stack_kib: 128,
            max_script_kib: 4,
        };
        let config = args.decoder_config().unwrap();
        assert_eq!(config.timeout, Duration::from_millis(50));
        assert_eq!(config.stack_limit, 128 * 1024);
        assert_eq!(config.max_script_size, 4096);
        assert_eq!(config.entry_point, "Decode");
    }
}
