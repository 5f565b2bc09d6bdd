/// Errors that can occur while loading or validating device provisioning.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to load device config: {0}")]
    LoadFailed(String),

    /// The config is not valid JSON or has an unexpected structure.
    #[error("device config is not valid: {0}")]
    Parse(#[from] serde_json::Error),

    /// A device entry failed validation.
    #[error("device {device:?}: {message}")]
    Invalid { device: String, message: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
