//! Known end devices and their session material.
//!
//! The registry answers one question on the hot path: which device owns this
//! DevAddr? Provisioning (hex keys, join types, decoder paths) is parsed and
//! validated by [`config`] before devices reach the registry.

pub mod config;
pub mod device;
pub mod error;
pub mod registry;

pub use config::{DeviceConfig, DevicesConfig, JoinType, DEFAULT_MAX_CONFIG_SIZE};
pub use device::Device;
pub use error::{ConfigError, Result};
pub use registry::DeviceRegistry;
