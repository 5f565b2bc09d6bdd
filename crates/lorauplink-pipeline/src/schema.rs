use std::collections::HashMap;

use jsonschema::Validator;
use lorauplink_decoder::Readings;
use lorauplink_device::DevicesConfig;
use serde_json::Value;

use crate::error::{PipelineError, Result};

/// Device-keyed compiled JSON Schemas for decoded readings.
///
/// Devices without a schema pass every reading through.
#[derive(Default)]
pub struct ReadingSchemas {
    validators: HashMap<String, Validator>,
}

impl ReadingSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile the `reading_schema` of every configured device that has one.
    pub fn from_config(config: &DevicesConfig) -> Result<Self> {
        let mut schemas = Self::new();
        for device in &config.devices {
            if let Some(schema) = &device.reading_schema {
                schemas.register(&device.name, schema)?;
            }
        }
        Ok(schemas)
    }

    /// Compile and register a schema for a device, replacing any previous one.
    pub fn register(&mut self, device: &str, schema: &Value) -> Result<()> {
        let compiled =
            jsonschema::validator_for(schema).map_err(|err| PipelineError::InvalidSchema {
                device: device.to_string(),
                message: err.to_string(),
            })?;
        self.validators.insert(device.to_string(), compiled);
        Ok(())
    }

    pub fn remove(&mut self, device: &str) -> bool {
        self.validators.remove(device).is_some()
    }

    pub fn has_schema(&self, device: &str) -> bool {
        self.validators.contains_key(device)
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Check readings against the device's schema, reporting up to four violations.
    pub fn validate(&self, device: &str, readings: &Readings) -> Result<()> {
        let Some(validator) = self.validators.get(device) else {
            return Ok(());
        };

        let value = Value::Object(readings.clone());
        let mut errors = validator.iter_errors(&value);
        if let Some(first) = errors.next() {
            let mut message = first.to_string();
            for err in errors.take(3) {
                message.push_str("; ");
                message.push_str(&err.to_string());
            }
            return Err(PipelineError::ReadingRejected {
                device: device.to_string(),
                message,
            });
        }

        Ok(())
    }
}

impl std::fmt::Debug for ReadingSchemas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut devices: Vec<&String> = self.validators.keys().collect();
        devices.sort_unstable();
        f.debug_struct("ReadingSchemas")
            .field("devices", &devices)
            .finish()
    }
}
