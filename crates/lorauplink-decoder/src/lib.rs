//! Sandboxed payload decoding.
//!
//! Each device ships a small JavaScript decoder defining
//! `function Decode(fPort, bytes)` that returns an object of readings.
//! Scripts are untrusted: every call gets a fresh interpreter with no file or
//! network access, a wall-clock budget enforced by a watchdog, a stack budget
//! and a memory cap. The result must be a string-keyed object.

pub mod config;
pub mod error;
pub mod reading;
pub mod sandbox;
pub mod script;
mod watchdog;

pub use config::DecoderConfig;
pub use error::{DecodeError, Result};
pub use reading::Readings;
pub use sandbox::{ScriptDecoder, BYTES_BINDING, PORT_BINDING};
pub use script::load_script;
