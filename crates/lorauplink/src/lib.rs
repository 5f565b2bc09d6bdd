//! Gateway-side LoRaWAN uplink decoding.
//!
//! lorauplink takes raw data uplinks off the radio, finds the owning device,
//! decrypts the application payload and turns it into readings by running a
//! per-device JavaScript decoder in a sandbox with time, stack and memory
//! budgets.
//!
//! # Crate Structure
//!
//! - [`frame`]: PHYPayload parsing and encoding
//! - [`cipher`]: AES-128 counter-mode payload keystream
//! - [`decoder`]: sandboxed decoder scripts
//! - [`device`]: device registry and provisioning config
//! - [`pipeline`]: parse, look up, decrypt, decode

/// Re-export frame types.
pub mod frame {
    pub use lorauplink_frame::*;
}

/// Re-export cipher types.
pub mod cipher {
    pub use lorauplink_cipher::*;
}

/// Re-export decoder types.
pub mod decoder {
    pub use lorauplink_decoder::*;
}

/// Re-export device types.
pub mod device {
    pub use lorauplink_device::*;
}

/// Re-export pipeline types.
pub mod pipeline {
    pub use lorauplink_pipeline::*;
}

pub use lorauplink_pipeline::{DecodedUplink, PipelineError, UplinkPipeline};
