use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use lorauplink_cipher::encrypt_uplink;
use lorauplink_frame::{encode_uplink, DevAddr, FrameControl, UplinkFrame, MIN_FRAME_SIZE};
use lorauplink_pipeline::{DecoderConfig, Device, DeviceRegistry, PipelineError, UplinkPipeline};
use proptest::prelude::*;
use serde_json::{json, Value};

const ECHO: &str = "function Decode(fPort, bytes) { return { port: fPort, bytes: bytes }; }";

fn echo_script() -> PathBuf {
    static SCRIPT: OnceLock<PathBuf> = OnceLock::new();
    SCRIPT
        .get_or_init(|| {
            let dir = std::env::temp_dir().join(format!(
                "lorauplink-pipeline-props-{}-{}",
                std::process::id(),
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap()
                    .as_nanos()
            ));
            std::fs::create_dir_all(&dir).unwrap();
            let path = dir.join("echo.js");
            std::fs::write(&path, ECHO).unwrap();
            path
        })
        .clone()
}

fn pipeline_for(addr: DevAddr, key: [u8; 16]) -> UplinkPipeline {
    let device = Device::new("prop-device", addr, key, echo_script());
    UplinkPipeline::new(Arc::new(DeviceRegistry::from_devices([device]))).with_decoder_config(
        DecoderConfig {
            timeout: Duration::from_secs(1),
            ..DecoderConfig::default()
        },
    )
}

fn build_frame(
    key: &[u8; 16],
    addr: DevAddr,
    fcnt: u16,
    fport: u8,
    fopts: &[u8],
    plaintext: &[u8],
) -> Vec<u8> {
    let payload = encrypt_uplink(key, addr, u32::from(fcnt), plaintext).unwrap();
    let frame = UplinkFrame {
        mhdr: 0x40,
        dev_addr: addr,
        fctrl: FrameControl(0),
        fcnt,
        fopts: fopts.to_vec().into(),
        fport,
        payload: payload.into(),
        mic: [0xDE, 0xAD, 0xBE, 0xEF],
    };
    let mut buf = bytes::BytesMut::new();
    encode_uplink(&frame, &mut buf).unwrap();
    buf.to_vec()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn encrypted_payload_reaches_decoder_intact(
        key in any::<[u8; 16]>(),
        addr in any::<[u8; 4]>(),
        fcnt in any::<u16>(),
        fport in 1u8..=223,
        fopts in proptest::collection::vec(any::<u8>(), 0..=15),
        plaintext in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        let addr = DevAddr::new(addr);
        let raw = build_frame(&key, addr, fcnt, fport, &fopts, &plaintext);

        let uplink = pipeline_for(addr, key).process(&raw).unwrap().unwrap();
        prop_assert_eq!(uplink.dev_addr, addr);
        prop_assert_eq!(uplink.fcnt, fcnt);
        prop_assert_eq!(uplink.fport, fport);
        prop_assert_eq!(
            Value::Object(uplink.readings),
            json!({"port": fport, "bytes": plaintext})
        );
    }

    #[test]
    fn frames_for_other_addresses_are_ignored(
        key in any::<[u8; 16]>(),
        owned in any::<[u8; 4]>(),
        other in any::<[u8; 4]>(),
        plaintext in proptest::collection::vec(any::<u8>(), 0..16),
    ) {
        prop_assume!(owned != other);
        let raw = build_frame(&key, DevAddr::new(other), 1, 1, &[], &plaintext);

        let result = pipeline_for(DevAddr::new(owned), key).process(&raw);
        prop_assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn short_input_is_malformed(raw in proptest::collection::vec(any::<u8>(), 0..MIN_FRAME_SIZE)) {
        let pipeline = pipeline_for(DevAddr::new([1, 2, 3, 4]), [0u8; 16]);
        prop_assert!(matches!(
            pipeline.process(&raw),
            Err(PipelineError::MalformedFrame(_))
        ));
    }

    #[test]
    fn arbitrary_input_never_panics(raw in proptest::collection::vec(any::<u8>(), 0..96)) {
        let pipeline = UplinkPipeline::new(Arc::new(DeviceRegistry::new()));
        match pipeline.process(&raw) {
            Ok(None) | Err(PipelineError::MalformedFrame(_)) => {}
            other => prop_assert!(false, "unexpected outcome: {:?}", other),
        }
    }
}
