use std::fmt;
use std::io;

use lorauplink_decoder::DecodeError;
use lorauplink_device::ConfigError;
use lorauplink_pipeline::PipelineError;

// Exit code constants aligned with rsfulmen/DDR-0002 semantics.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => DATA_INVALID,
        io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn config_error(context: &str, err: ConfigError) -> CliError {
    let code = match err {
        ConfigError::LoadFailed(_) => FAILURE,
        ConfigError::Parse(_) | ConfigError::Invalid { .. } => DATA_INVALID,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn decode_exit_code(err: &DecodeError) -> i32 {
    match err {
        DecodeError::Timeout(_) => TIMEOUT,
        DecodeError::ScriptLoad(_) => FAILURE,
        DecodeError::Engine(_) => INTERNAL,
        DecodeError::StackLimitExceeded
        | DecodeError::Script(_)
        | DecodeError::InvalidResultShape(_) => DATA_INVALID,
    }
}

pub fn pipeline_error(context: &str, err: PipelineError) -> CliError {
    let code = match &err {
        PipelineError::MalformedFrame(_) | PipelineError::Decryption(_) => DATA_INVALID,
        PipelineError::Decode(inner) => decode_exit_code(inner),
        PipelineError::InvalidSchema { .. } | PipelineError::ReadingRejected { .. } => {
            DATA_INVALID
        }
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}
