/// Errors that can occur while applying the payload keystream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CipherError {
    /// The session key is not 16 bytes.
    #[error("invalid session key length ({0} bytes, expected 16)")]
    InvalidKeyLength(usize),

    /// The payload needs more counter blocks than the 1-byte block index allows.
    #[error("payload too long for keystream ({len} bytes, max {max})")]
    PayloadTooLong { len: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, CipherError>;
