/// Errors that can occur while parsing or encoding an uplink frame.
///
/// `Truncated` and `OptionsOverrun` both mean the frame is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The frame is shorter than the fixed header, port and MIC.
    #[error("frame too short ({len} bytes, need at least {required})")]
    Truncated { len: usize, required: usize },

    /// The FOpts length in FCtrl runs past the end of the frame.
    #[error("frame options overrun ({fopts_len} option bytes need {required} bytes, got {len})")]
    OptionsOverrun {
        fopts_len: usize,
        len: usize,
        required: usize,
    },

    /// Encoder input does not fit the FOpts length nibble.
    #[error("frame options too long ({len} bytes, max 15)")]
    OptionsTooLong { len: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
