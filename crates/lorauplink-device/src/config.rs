use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use lorauplink_frame::DevAddr;
use serde::{Deserialize, Serialize};

use crate::device::Device;
use crate::error::{ConfigError, Result};

/// Default cap on a provisioning file: 1 MiB.
pub const DEFAULT_MAX_CONFIG_SIZE: usize = 1024 * 1024;

const KEY_LEN: usize = 16;
const EUI_LEN: usize = 8;
const DEV_ADDR_LEN: usize = 4;

/// How a device obtained its session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinType {
    /// Over-the-air activation. Session keys come from the join procedure.
    #[default]
    #[serde(rename = "OTAA", alias = "")]
    Otaa,
    /// Activation by personalization. Session keys are provisioned directly.
    #[serde(rename = "ABP")]
    Abp,
}

impl JoinType {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinType::Otaa => "OTAA",
            JoinType::Abp => "ABP",
        }
    }
}

/// Provisioning for one device. Keys and addresses are hex strings.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    #[serde(default)]
    pub join_type: JoinType,
    #[serde(default)]
    pub decoder_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_eui: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_s_key: Option<String>,
    #[serde(
        default,
        rename = "network_s_key",
        skip_serializing_if = "Option::is_none"
    )]
    pub nwk_s_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_addr: Option<String>,
    /// Optional JSON Schema the decoded readings must satisfy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_schema: Option<serde_json::Value>,
}

impl std::fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |value: &Option<String>| {
            value
                .as_ref()
                .map(|v| format!("<redacted:{} chars>", v.len()))
        };
        f.debug_struct("DeviceConfig")
            .field("name", &self.name)
            .field("join_type", &self.join_type)
            .field("decoder_path", &self.decoder_path)
            .field("dev_eui", &self.dev_eui)
            .field("app_key", &redact(&self.app_key))
            .field("app_s_key", &redact(&self.app_s_key))
            .field("nwk_s_key", &redact(&self.nwk_s_key))
            .field("dev_addr", &self.dev_addr)
            .field("reading_schema", &self.reading_schema.is_some())
            .finish()
    }
}

impl DeviceConfig {
    /// Check required fields and hex lengths for the join type.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(self.invalid("name is required"));
        }
        if self.decoder_path.is_empty() {
            return Err(self.invalid("decoder path is required"));
        }

        match self.join_type {
            JoinType::Otaa => {
                self.require_hex(&self.dev_eui, "dev EUI", EUI_LEN)?;
                self.require_hex(&self.app_key, "app key", KEY_LEN)?;
            }
            JoinType::Abp => {
                self.require_hex(&self.app_s_key, "app session key", KEY_LEN)?;
                self.require_hex(&self.nwk_s_key, "network session key", KEY_LEN)?;
                self.require_hex(&self.dev_addr, "device address", DEV_ADDR_LEN)?;
            }
        }
        Ok(())
    }

    /// Build a registry entry, resolving relative decoder paths against `base_dir`.
    ///
    /// Returns `Ok(None)` for OTAA devices: their session keys only exist
    /// after a join, which this crate does not perform.
    pub fn to_device(&self, base_dir: Option<&Path>) -> Result<Option<Device>> {
        self.validate()?;

        if self.join_type == JoinType::Otaa {
            return Ok(None);
        }

        let addr = self.require_hex(&self.dev_addr, "device address", DEV_ADDR_LEN)?;
        let address = DevAddr::try_from(addr.as_slice())
            .map_err(|_| self.invalid("device address must be 4 bytes"))?;
        let app_s_key = self.require_hex(&self.app_s_key, "app session key", KEY_LEN)?;

        Ok(Some(Device::new(
            self.name.clone(),
            address,
            app_s_key,
            self.resolve_decoder_path(base_dir),
        )))
    }

    pub fn resolve_decoder_path(&self, base_dir: Option<&Path>) -> PathBuf {
        let path = PathBuf::from(&self.decoder_path);
        match base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        }
    }

    fn require_hex(&self, value: &Option<String>, field: &str, len: usize) -> Result<Vec<u8>> {
        let Some(text) = value.as_deref().filter(|v| !v.is_empty()) else {
            return Err(self.invalid(&format!(
                "{field} is required for {} join type",
                self.join_type.as_str()
            )));
        };
        let bytes = hex::decode(text)
            .map_err(|err| self.invalid(&format!("{field} is not valid hex: {err}")))?;
        if bytes.len() != len {
            return Err(self.invalid(&format!("{field} must be {len} bytes")));
        }
        Ok(bytes)
    }

    fn invalid(&self, message: &str) -> ConfigError {
        ConfigError::Invalid {
            device: self.name.clone(),
            message: message.to_string(),
        }
    }
}

/// A provisioning file: `{ "devices": [ ... ] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevicesConfig {
    pub devices: Vec<DeviceConfig>,
    /// Directory relative decoder paths resolve against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl DevicesConfig {
    /// Parse provisioning JSON. Relative decoder paths stay relative.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a provisioning file with the default size cap.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_with_limit(path, DEFAULT_MAX_CONFIG_SIZE)
    }

    /// Load a provisioning file, refusing files larger than `max_size` bytes.
    pub fn from_file_with_limit(path: &Path, max_size: usize) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|err| ConfigError::LoadFailed(format!("{}: {err}", path.display())))?;
        let metadata = file
            .metadata()
            .map_err(|err| ConfigError::LoadFailed(err.to_string()))?;
        if metadata.len() > max_size as u64 {
            return Err(ConfigError::LoadFailed(format!(
                "config file too large ({} bytes, max {max_size}): {}",
                metadata.len(),
                path.display()
            )));
        }

        let read_limit = u64::try_from(max_size.saturating_add(1)).unwrap_or(u64::MAX);
        let mut content = String::new();
        file.take(read_limit)
            .read_to_string(&mut content)
            .map_err(|err| {
                ConfigError::LoadFailed(format!("failed reading {}: {err}", path.display()))
            })?;
        if content.len() > max_size {
            return Err(ConfigError::LoadFailed(format!(
                "config file too large while reading: {}",
                path.display()
            )));
        }

        let mut config = Self::from_json(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Validate every entry and reject duplicate names.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for device in &self.devices {
            device.validate()?;
            if !seen.insert(device.name.as_str()) {
                return Err(device.invalid("duplicate device name"));
            }
        }
        Ok(())
    }

    /// Validate and build registry entries for every device with a session.
    pub fn to_devices(&self) -> Result<Vec<Device>> {
        self.validate()?;

        let mut devices = Vec::with_capacity(self.devices.len());
        for entry in &self.devices {
            match entry.to_device(self.base_dir.as_deref())? {
                Some(device) => devices.push(device),
                None => tracing::warn!(
                    device = entry.name.as_str(),
                    "skipping OTAA device: no session keys without a join"
                ),
            }
        }
        Ok(devices)
    }
}
