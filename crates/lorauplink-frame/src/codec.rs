use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::addr::DevAddr;
use crate::control::{FrameControl, MessageType};
use crate::error::{FrameError, Result};

/// Trailing message integrity code.
pub const MIC_SIZE: usize = 4;

/// MHDR (1) + DevAddr (4) + FCtrl (1) + FCnt (2) + FPort (1) + MIC (4), no options.
pub const MIN_FRAME_SIZE: usize = 13;

const FCTRL_OFFSET: usize = 5;
const MAX_FOPTS_LEN: usize = 15;

/// A parsed data uplink.
///
/// The payload is still encrypted and the MIC is carried but not checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UplinkFrame {
    /// Message header, not interpreted beyond [`UplinkFrame::message_type`].
    pub mhdr: u8,
    /// Device address, already reordered to big-endian.
    pub dev_addr: DevAddr,
    /// Frame control byte.
    pub fctrl: FrameControl,
    /// 16-bit frame counter as sent.
    pub fcnt: u16,
    /// Raw MAC command options, skipped by this crate.
    pub fopts: Bytes,
    /// Application port.
    pub fport: u8,
    /// Encrypted FRMPayload.
    pub payload: Bytes,
    /// Message integrity code.
    pub mic: [u8; MIC_SIZE],
}

impl UplinkFrame {
    /// Parse a frame from a borrowed buffer.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        parse_uplink(Bytes::copy_from_slice(raw))
    }

    pub fn message_type(&self) -> MessageType {
        MessageType::from_mhdr(self.mhdr)
    }

    /// The total wire size of this frame.
    pub fn wire_size(&self) -> usize {
        MIN_FRAME_SIZE + self.fopts.len() + self.payload.len()
    }
}

/// Parse a PHYPayload into an uplink frame.
///
/// Wire format:
/// ```text
/// ┌──────┬──────────┬───────┬─────────┬──────────┬───────┬────────────┬─────┐
/// │ MHDR │ DevAddr  │ FCtrl │ FCnt    │ FOpts    │ FPort │ FRMPayload │ MIC │
/// │ 1B   │ 4B (LE)  │ 1B    │ 2B (LE) │ 0-15B    │ 1B    │ variable   │ 4B  │
/// └──────┴──────────┴───────┴─────────┴──────────┴───────┴────────────┴─────┘
/// ```
///
/// Payload and options slices share the input buffer.
pub fn parse_uplink(mut raw: Bytes) -> Result<UplinkFrame> {
    let len = raw.len();
    if len < MIN_FRAME_SIZE {
        return Err(FrameError::Truncated {
            len,
            required: MIN_FRAME_SIZE,
        });
    }

    let fopts_len = FrameControl(raw[FCTRL_OFFSET]).fopts_len();
    let required = MIN_FRAME_SIZE + fopts_len;
    if len < required {
        return Err(FrameError::OptionsOverrun {
            fopts_len,
            len,
            required,
        });
    }

    let mhdr = raw.get_u8();
    let mut wire_addr = [0u8; 4];
    raw.copy_to_slice(&mut wire_addr);
    let fctrl = FrameControl(raw.get_u8());
    let fcnt = raw.get_u16_le();
    let fopts = raw.split_to(fopts_len);
    let fport = raw.get_u8();
    let payload = raw.split_to(raw.len() - MIC_SIZE);
    let mut mic = [0u8; MIC_SIZE];
    raw.copy_to_slice(&mut mic);

    let frame = UplinkFrame {
        mhdr,
        dev_addr: DevAddr::from_wire(wire_addr),
        fctrl,
        fcnt,
        fopts,
        fport,
        payload,
        mic,
    };
    tracing::trace!(
        dev_addr = %frame.dev_addr,
        fcnt = frame.fcnt,
        fport = frame.fport,
        payload_len = frame.payload.len(),
        "parsed uplink frame"
    );
    Ok(frame)
}

/// Encode an uplink frame into the wire format.
///
/// The FOpts length nibble of FCtrl is taken from `frame.fopts`.
pub fn encode_uplink(frame: &UplinkFrame, dst: &mut BytesMut) -> Result<()> {
    let fopts_len = frame.fopts.len();
    if fopts_len > MAX_FOPTS_LEN {
        return Err(FrameError::OptionsTooLong { len: fopts_len });
    }

    dst.reserve(frame.wire_size());
    dst.put_u8(frame.mhdr);
    dst.put_slice(&frame.dev_addr.to_wire());
    dst.put_u8((frame.fctrl.0 & 0xF0) | fopts_len as u8);
    dst.put_u16_le(frame.fcnt);
    dst.put_slice(&frame.fopts);
    dst.put_u8(frame.fport);
    dst.put_slice(&frame.payload);
    dst.put_slice(&frame.mic);
    Ok(())
}
