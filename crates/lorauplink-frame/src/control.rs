/// MHDR message type (bits 7..5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    JoinRequest,
    JoinAccept,
    UnconfirmedDataUp,
    UnconfirmedDataDown,
    ConfirmedDataUp,
    ConfirmedDataDown,
    RejoinRequest,
    Proprietary,
}

impl MessageType {
    /// Decode the message type from an MHDR byte.
    pub fn from_mhdr(mhdr: u8) -> Self {
        match mhdr >> 5 {
            0 => Self::JoinRequest,
            1 => Self::JoinAccept,
            2 => Self::UnconfirmedDataUp,
            3 => Self::UnconfirmedDataDown,
            4 => Self::ConfirmedDataUp,
            5 => Self::ConfirmedDataDown,
            6 => Self::RejoinRequest,
            _ => Self::Proprietary,
        }
    }

    /// True for unconfirmed and confirmed data uplinks.
    pub fn is_data_uplink(self) -> bool {
        matches!(self, Self::UnconfirmedDataUp | Self::ConfirmedDataUp)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::JoinRequest => "JoinRequest",
            Self::JoinAccept => "JoinAccept",
            Self::UnconfirmedDataUp => "UnconfirmedDataUp",
            Self::UnconfirmedDataDown => "UnconfirmedDataDown",
            Self::ConfirmedDataUp => "ConfirmedDataUp",
            Self::ConfirmedDataDown => "ConfirmedDataDown",
            Self::RejoinRequest => "RejoinRequest",
            Self::Proprietary => "Proprietary",
        }
    }
}

/// Uplink FCtrl byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameControl(pub u8);

impl FrameControl {
    const ADR: u8 = 0x80;
    const ADR_ACK_REQ: u8 = 0x40;
    const ACK: u8 = 0x20;
    const FPENDING: u8 = 0x10;
    const FOPTS_LEN_MASK: u8 = 0x0F;

    /// Number of FOpts bytes that follow FCnt (0-15).
    pub fn fopts_len(self) -> usize {
        usize::from(self.0 & Self::FOPTS_LEN_MASK)
    }

    pub fn adr(self) -> bool {
        self.0 & Self::ADR != 0
    }

    pub fn adr_ack_req(self) -> bool {
        self.0 & Self::ADR_ACK_REQ != 0
    }

    pub fn ack(self) -> bool {
        self.0 & Self::ACK != 0
    }

    /// FPending on downlinks, ClassB on uplinks.
    pub fn fpending(self) -> bool {
        self.0 & Self::FPENDING != 0
    }
}
