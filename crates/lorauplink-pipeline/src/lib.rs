//! Uplink processing for gateway-owned devices.
//!
//! This is the "just works" layer: hand it a raw frame and get back the
//! owning device and its decoded readings. Frames from devices this gateway
//! does not know are expected on a shared radio and are dropped quietly
//! (`Ok(None)`); malformed frames and decode failures are errors.

pub mod error;
pub mod pipeline;
#[cfg(feature = "schema")]
pub mod schema;

pub use error::{PipelineError, Result};
pub use pipeline::{DecodedUplink, UplinkPipeline};
#[cfg(feature = "schema")]
pub use schema::ReadingSchemas;

pub use lorauplink_decoder::{DecoderConfig, Readings};
pub use lorauplink_device::{Device, DeviceRegistry};
