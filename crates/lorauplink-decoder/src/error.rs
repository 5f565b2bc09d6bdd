use std::time::Duration;

/// Errors that can occur while running a decoder script.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The script recursed past the interpreter stack budget.
    #[error("decoder exceeded the stack limit")]
    StackLimitExceeded,

    /// The watchdog interrupted the script.
    #[error("decoder timed out after {0:?}")]
    Timeout(Duration),

    /// The script threw or failed at runtime.
    #[error("decoder script error: {0}")]
    Script(String),

    /// The script returned something other than a string-keyed object.
    #[error("decoder returned unexpected data: {0}")]
    InvalidResultShape(String),

    /// The script file could not be read.
    #[error("failed to load decoder script: {0}")]
    ScriptLoad(String),

    /// The interpreter could not be set up.
    #[error("decoder engine error: {0}")]
    Engine(String),
}

pub type Result<T> = std::result::Result<T, DecodeError>;
