use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use lorauplink_frame::DevAddr;

use crate::config::DevicesConfig;
use crate::device::Device;
use crate::error::Result;

/// Shared registry of devices this gateway owns.
///
/// Lookups take a shared lock and hand out `Arc<Device>` clones, so
/// concurrent pipeline calls never block each other and never see a
/// half-written entry. Mutation replaces whole entries under the write lock.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<Vec<Arc<Device>>>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of devices.
    pub fn from_devices(devices: impl IntoIterator<Item = Device>) -> Self {
        let registry = Self::new();
        for device in devices {
            registry.register(device);
        }
        registry
    }

    /// Build a registry from validated provisioning config.
    ///
    /// Devices without session keys (OTAA before join) are skipped.
    pub fn from_config(config: &DevicesConfig) -> Result<Self> {
        Ok(Self::from_devices(config.to_devices()?))
    }

    /// Register a device, replacing any device with the same name.
    ///
    /// Returns the replaced entry, if any.
    pub fn register(&self, device: Device) -> Option<Arc<Device>> {
        let mut devices = self.write();

        if let Some(other) = devices
            .iter()
            .find(|d| d.address() == device.address() && d.name() != device.name())
        {
            tracing::warn!(
                device = device.name(),
                existing = other.name(),
                dev_addr = %device.address(),
                "duplicate device address, earlier registration wins lookups"
            );
        }

        let device = Arc::new(device);
        match devices.iter_mut().find(|d| d.name() == device.name()) {
            Some(slot) => Some(std::mem::replace(slot, device)),
            None => {
                tracing::debug!(device = device.name(), dev_addr = %device.address(), "registered device");
                devices.push(device);
                None
            }
        }
    }

    /// Remove a device by name.
    pub fn remove(&self, name: &str) -> Option<Arc<Device>> {
        let mut devices = self.write();
        let index = devices.iter().position(|d| d.name() == name)?;
        Some(devices.remove(index))
    }

    /// Find the device owning a (big-endian) address.
    pub fn lookup(&self, address: &DevAddr) -> Option<Arc<Device>> {
        self.read()
            .iter()
            .find(|d| d.address() == *address)
            .cloned()
    }

    /// Find a device by name.
    pub fn get(&self, name: &str) -> Option<Arc<Device>> {
        self.read().iter().find(|d| d.name() == name).cloned()
    }

    /// Registered device names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().iter().map(|d| d.name().to_string()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // Entries are replaced whole, so a poisoned lock still holds consistent data.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<Device>>> {
        self.devices.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<Device>>> {
        self.devices.write().unwrap_or_else(PoisonError::into_inner)
    }
}
