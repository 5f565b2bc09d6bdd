use std::sync::Arc;

use bytes::Bytes;
use lorauplink_cipher::decrypt_uplink;
use lorauplink_decoder::{load_script, DecoderConfig, Readings, ScriptDecoder};
use lorauplink_device::{Device, DeviceRegistry};
use lorauplink_frame::{parse_uplink, DevAddr, UplinkFrame};

#[cfg(feature = "async")]
use crate::error::PipelineError;
use crate::error::Result;
#[cfg(feature = "schema")]
use crate::schema::ReadingSchemas;

/// Readings decoded from one uplink, tagged with the owning device.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedUplink {
    pub device: String,
    pub dev_addr: DevAddr,
    pub fcnt: u16,
    pub fport: u8,
    pub readings: Readings,
}

/// Parse, look up, decrypt and decode uplinks.
///
/// The pipeline holds no per-frame state. It is `Send + Sync` and can be
/// shared across worker threads; each call reloads the device's decoder
/// script so edits on disk apply to the next frame.
#[derive(Debug)]
pub struct UplinkPipeline {
    registry: Arc<DeviceRegistry>,
    decoder: ScriptDecoder,
    #[cfg(feature = "schema")]
    schemas: Option<Arc<ReadingSchemas>>,
}

impl UplinkPipeline {
    /// Create a pipeline over a shared registry with default decoder limits.
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self {
            registry,
            decoder: ScriptDecoder::new(),
            #[cfg(feature = "schema")]
            schemas: None,
        }
    }

    pub fn with_decoder_config(mut self, config: DecoderConfig) -> Self {
        self.decoder = ScriptDecoder::with_config(config);
        self
    }

    /// Validate decoded readings against per-device schemas.
    #[cfg(feature = "schema")]
    pub fn with_reading_schemas(mut self, schemas: Arc<ReadingSchemas>) -> Self {
        self.schemas = Some(schemas);
        self
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    pub fn decoder(&self) -> &ScriptDecoder {
        &self.decoder
    }

    /// Process one raw PHYPayload.
    ///
    /// Returns `Ok(None)` when the frame belongs to a device not in the
    /// registry.
    pub fn process(&self, raw: &[u8]) -> Result<Option<DecodedUplink>> {
        self.process_frame(UplinkFrame::parse(raw)?)
    }

    /// Like [`process`](Self::process), without copying an owned buffer.
    pub fn process_bytes(&self, raw: Bytes) -> Result<Option<DecodedUplink>> {
        self.process_frame(parse_uplink(raw)?)
    }

    /// Process an already parsed frame.
    pub fn process_frame(&self, frame: UplinkFrame) -> Result<Option<DecodedUplink>> {
        let Some(device) = self.registry.lookup(&frame.dev_addr) else {
            tracing::info!(
                dev_addr = %frame.dev_addr,
                fcnt = frame.fcnt,
                "ignoring uplink from unknown device"
            );
            return Ok(None);
        };

        let plaintext = decrypt_uplink(
            device.app_s_key(),
            frame.dev_addr,
            u32::from(frame.fcnt),
            &frame.payload,
        )
        .inspect_err(|err| {
            tracing::warn!(device = device.name(), error = %err, "uplink decryption failed");
        })?;

        let readings = self
            .decode(&device, frame.fport, &plaintext)
            .inspect_err(|err| {
                tracing::warn!(
                    device = device.name(),
                    fport = frame.fport,
                    fcnt = frame.fcnt,
                    error = %err,
                    "payload decode failed"
                );
            })?;

        #[cfg(feature = "schema")]
        if let Some(schemas) = &self.schemas {
            schemas.validate(device.name(), &readings).inspect_err(|err| {
                tracing::warn!(device = device.name(), error = %err, "readings rejected");
            })?;
        }

        tracing::debug!(
            device = device.name(),
            fport = frame.fport,
            fcnt = frame.fcnt,
            readings = readings.len(),
            "decoded uplink"
        );

        Ok(Some(DecodedUplink {
            device: device.name().to_string(),
            dev_addr: frame.dev_addr,
            fcnt: frame.fcnt,
            fport: frame.fport,
            readings,
        }))
    }

    fn decode(&self, device: &Device, fport: u8, plaintext: &[u8]) -> Result<Readings> {
        let script = load_script(device.decoder_path(), self.decoder.config().max_script_size)?;
        let readings = self.decoder.decode(fport, &script, plaintext)?;
        Ok(readings)
    }
}

#[cfg(feature = "async")]
impl UplinkPipeline {
    /// Run [`process_bytes`](Self::process_bytes) on tokio's blocking pool.
    ///
    /// Decoding blocks for up to the decoder timeout, so it must not run on
    /// an async worker thread.
    pub async fn process_async(self: Arc<Self>, raw: Bytes) -> Result<Option<DecodedUplink>> {
        tokio::task::spawn_blocking(move || self.process_bytes(raw))
            .await
            .map_err(|err| PipelineError::Worker(err.to_string()))?
    }
}
