/// Errors that can occur while processing an uplink.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// The raw frame is too short or internally inconsistent.
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] lorauplink_frame::FrameError),

    /// The payload could not be decrypted with the device's key material.
    #[error("error while decrypting uplink: {0}")]
    Decryption(#[from] lorauplink_cipher::CipherError),

    /// The device's decoder script failed or returned bad data.
    #[error("error decoding payload: {0}")]
    Decode(#[from] lorauplink_decoder::DecodeError),

    /// A reading schema could not be compiled.
    #[cfg(feature = "schema")]
    #[error("invalid reading schema for {device}: {message}")]
    InvalidSchema { device: String, message: String },

    /// Decoded readings failed the device's reading schema.
    #[cfg(feature = "schema")]
    #[error("readings from {device} rejected: {message}")]
    ReadingRejected { device: String, message: String },

    /// The blocking worker running the pipeline failed.
    #[cfg(feature = "async")]
    #[error("pipeline worker failed: {0}")]
    Worker(String),
}

impl PipelineError {
    /// The underlying decoder failure, if any.
    pub fn as_decode_error(&self) -> Option<&lorauplink_decoder::DecodeError> {
        match self {
            PipelineError::Decode(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
