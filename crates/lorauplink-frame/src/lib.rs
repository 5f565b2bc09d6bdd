//! LoRaWAN data uplink frame parsing.
//!
//! Turns a raw PHYPayload into typed fields without touching keys or devices:
//! - MHDR (1 byte), passed through uninterpreted
//! - DevAddr (4 bytes, least-significant byte first on the wire)
//! - FCtrl (1 byte, low nibble = FOpts length), FCnt (2 bytes LE), FOpts
//! - FPort (1 byte), encrypted FRMPayload, trailing 4-byte MIC
//!
//! Decryption and decoding live in the cipher and decoder crates.

pub mod addr;
pub mod codec;
pub mod control;
pub mod error;
pub mod port;

pub use addr::DevAddr;
pub use codec::{encode_uplink, parse_uplink, UplinkFrame, MIC_SIZE, MIN_FRAME_SIZE};
pub use control::{FrameControl, MessageType};
pub use error::{FrameError, Result};
pub use port::{MAC_COMMANDS, TEST_PORT};
