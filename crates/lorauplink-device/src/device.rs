use std::fmt;
use std::path::{Path, PathBuf};

use lorauplink_frame::DevAddr;

/// One end device with an active session.
///
/// Devices are immutable once built; the registry swaps whole entries.
#[derive(Clone, PartialEq, Eq)]
pub struct Device {
    name: String,
    address: DevAddr,
    app_s_key: Vec<u8>,
    decoder_path: PathBuf,
}

impl Device {
    /// Build a device from already-validated material.
    pub fn new(
        name: impl Into<String>,
        address: DevAddr,
        app_s_key: impl Into<Vec<u8>>,
        decoder_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            address,
            app_s_key: app_s_key.into(),
            decoder_path: decoder_path.into(),
        }
    }

    /// Stable identifier used to tag readings.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> DevAddr {
        self.address
    }

    /// Application session key. Treat as secret; never log it.
    pub fn app_s_key(&self) -> &[u8] {
        &self.app_s_key
    }

    pub fn decoder_path(&self) -> &Path {
        &self.decoder_path
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("address", &self.address)
            .field(
                "app_s_key",
                &format_args!("<redacted:{} bytes>", self.app_s_key.len()),
            )
            .field("decoder_path", &self.decoder_path)
            .finish()
    }
}
