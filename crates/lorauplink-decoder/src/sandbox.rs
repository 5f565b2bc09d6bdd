use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rquickjs::{CatchResultExt, Context, Runtime, Value};

use crate::config::DecoderConfig;
use crate::error::{DecodeError, Result};
use crate::reading::{Readings, ResultConverter};
use crate::watchdog::Watchdog;

/// Global holding the frame port.
pub const PORT_BINDING: &str = "fPort";

/// Global holding the decrypted payload as an array of byte values.
pub const BYTES_BINDING: &str = "bytes";

/// Runs untrusted decoder scripts in throwaway interpreters.
///
/// The decoder itself holds only configuration, so one instance can be
/// shared across threads; each call builds and discards its own runtime.
#[derive(Debug, Clone, Default)]
pub struct ScriptDecoder {
    config: DecoderConfig,
}

impl ScriptDecoder {
    /// Create a decoder with default budgets.
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Create a decoder with explicit budgets.
    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Run `script` against one decrypted payload.
    ///
    /// The script is evaluated, then `Decode(fPort, bytes)` (or the configured
    /// entry point) is called and its result converted to [`Readings`].
    /// Panics inside the engine are caught and reported as script errors.
    pub fn decode(&self, port: u8, script: &str, data: &[u8]) -> Result<Readings> {
        validate_entry_point(&self.config.entry_point)?;
        let source = wrap_script(script, &self.config.entry_point);

        tracing::debug!(port, payload_len = data.len(), "running decoder script");
        match panic::catch_unwind(AssertUnwindSafe(|| self.run(port, &source, data))) {
            Ok(result) => result,
            Err(payload) => Err(DecodeError::Script(panic_message(payload.as_ref()))),
        }
    }

    fn run(&self, port: u8, source: &str, data: &[u8]) -> Result<Readings> {
        let runtime = Runtime::new().map_err(engine_error)?;
        runtime.set_max_stack_size(self.config.stack_limit);
        runtime.set_memory_limit(self.config.memory_limit);

        let interrupted = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&interrupted);
        runtime.set_interrupt_handler(Some(Box::new(move || flag.load(Ordering::SeqCst))));

        let context = Context::full(&runtime).map_err(engine_error)?;

        context.with(|ctx| {
            let globals = ctx.globals();
            globals
                .set(PORT_BINDING, i32::from(port))
                .map_err(engine_error)?;
            let bytes: Vec<i32> = data.iter().map(|byte| i32::from(*byte)).collect();
            globals.set(BYTES_BINDING, bytes).map_err(engine_error)?;

            let watchdog = Watchdog::arm(self.config.timeout, Arc::clone(&interrupted))
                .map_err(|err| DecodeError::Engine(format!("failed to start watchdog: {err}")))?;

            let outcome = ctx
                .eval::<Value, _>(source)
                .catch(&ctx)
                .map_err(|err| classify_failure(&err.to_string()))
                .and_then(|value| {
                    ResultConverter::new(&self.config, &interrupted).readings(&value)
                });

            let timed_out = watchdog.disarm();
            match outcome {
                Err(_) if timed_out => Err(DecodeError::Timeout(self.config.timeout)),
                other => other,
            }
        })
    }
}

fn wrap_script(script: &str, entry_point: &str) -> String {
    format!("{script}\n\n{entry_point}({PORT_BINDING}, {BYTES_BINDING});\n")
}

// The entry point is spliced into source, so only identifiers are allowed.
fn validate_entry_point(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');

    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(DecodeError::Engine(format!(
            "invalid decoder entry point: {name:?}"
        )))
    }
}

fn classify_failure(message: &str) -> DecodeError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("stack overflow") || lower.contains("call stack size") {
        return DecodeError::StackLimitExceeded;
    }

    let message = message.trim();
    if message.is_empty() {
        DecodeError::Script("script failed without a message".to_string())
    } else {
        DecodeError::Script(message.to_string())
    }
}

fn engine_error(err: rquickjs::Error) -> DecodeError {
    DecodeError::Engine(err.to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("decoder panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("decoder panicked: {message}")
    } else {
        "decoder panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::{Duration, Instant};

    use serde_json::json;

    use super::*;

    const FIRST_BYTE: &str = r#"function Decode(port, bytes){ return {"v": bytes[0]}; }"#;

    #[test]
    fn decodes_first_byte() {
        let readings = ScriptDecoder::new()
            .decode(1, FIRST_BYTE, &[0x17, 0x2A])
            .unwrap();
        assert_eq!(readings.get("v"), Some(&json!(0x17)));
        assert_eq!(readings.len(), 1);
    }

    #[test]
    fn port_and_length_are_visible() {
        let script = r#"
            function Decode(port, bytes) {
                return { port: port, len: bytes.length, global_port: fPort };
            }
        "#;
        let readings = ScriptDecoder::new().decode(42, script, &[1, 2, 3]).unwrap();
        assert_eq!(readings["port"], json!(42));
        assert_eq!(readings["len"], json!(3));
        assert_eq!(readings["global_port"], json!(42));
    }

    #[test]
    fn nested_and_typed_values() {
        let script = r#"
            function Decode(port, bytes) {
                return {
                    temperature: ((bytes[0] << 8) | bytes[1]) / 10,
                    flags: [true, false],
                    meta: { label: "sensor", ok: bytes[2] === 255 },
                    missing: null,
                    half: 4 / 2
                };
            }
        "#;
        let readings = ScriptDecoder::new()
            .decode(2, script, &[0x01, 0x02, 0xFF])
            .unwrap();
        assert_eq!(readings["temperature"], json!(25.8));
        assert_eq!(readings["flags"], json!([true, false]));
        assert_eq!(readings["meta"], json!({"label": "sensor", "ok": true}));
        assert_eq!(readings["missing"], json!(null));
        assert_eq!(readings["half"], json!(2));
    }

    #[test]
    fn infinite_loop_times_out() {
        let decoder = ScriptDecoder::new();
        let start = Instant::now();
        let err = decoder
            .decode(1, "function Decode(p, b) { while (true) {} }", &[])
            .unwrap_err();

        assert_eq!(err, DecodeError::Timeout(decoder.config().timeout));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    // Generous bound over the 10 ms budget for loaded CI machines.
    const TIMEOUT_BOUND: Duration = Duration::from_millis(500);

    fn assert_times_out(decoder: &ScriptDecoder, script: &str) {
        let start = Instant::now();
        let err = decoder.decode(1, script, &[]).unwrap_err();
        let elapsed = start.elapsed();

        assert_eq!(err, DecodeError::Timeout(decoder.config().timeout));
        assert!(elapsed < TIMEOUT_BOUND, "took {elapsed:?}");
    }

    #[test]
    fn catastrophic_regex_times_out() {
        let script = r#"
            function Decode(p, b) {
                var input = "a".repeat(40) + "!";
                return { matched: /^(a+)+$/.test(input) };
            }
        "#;
        assert_times_out(&ScriptDecoder::new(), script);
    }

    #[test]
    fn getter_loop_in_result_times_out() {
        let script = r#"
            function Decode(p, b) {
                return { get v() { while (true) {} } };
            }
        "#;
        assert_times_out(&ScriptDecoder::new(), script);
    }

    #[test]
    fn nested_getter_loop_times_out() {
        let script = r#"
            function Decode(p, b) {
                return { outer: { get v() { for (;;) {} } } };
            }
        "#;
        assert_times_out(&ScriptDecoder::new(), script);
    }

    // Every key of each level points at the same child object.
    const SHARED_GRAPH: &str = r#"
        function Decode(p, b) {
            var o = {};
            for (var d = 0; d < 14; d++) {
                var n = {};
                for (var i = 0; i < 8; i++) { n["k" + i] = o; }
                o = n;
            }
            return o;
        }
    "#;

    #[test]
    fn shared_result_graph_hits_value_budget() {
        let decoder = ScriptDecoder::new();
        let start = Instant::now();
        let err = decoder.decode(1, SHARED_GRAPH, &[]).unwrap_err();
        let elapsed = start.elapsed();

        match err {
            DecodeError::InvalidResultShape(message) => {
                assert!(message.contains("more than 4096 values"), "{message}")
            }
            // A slow machine may reach the deadline first.
            DecodeError::Timeout(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(elapsed < TIMEOUT_BOUND, "took {elapsed:?}");
    }

    #[test]
    fn result_conversion_stops_at_deadline() {
        let decoder = ScriptDecoder::with_config(DecoderConfig {
            max_result_values: usize::MAX,
            ..DecoderConfig::default()
        });
        assert_times_out(&decoder, SHARED_GRAPH);
    }

    #[test]
    fn results_within_value_budget_decode() {
        let decoder = ScriptDecoder::with_config(DecoderConfig {
            max_result_values: 4,
            ..DecoderConfig::default()
        });
        let readings = decoder
            .decode(1, "function Decode(p, b) { return { a: 1, b: [2, 3] }; }", &[])
            .unwrap();
        assert_eq!(readings["b"], json!([2, 3]));

        let err = decoder
            .decode(1, "function Decode(p, b) { return { a: 1, b: [2, 3, 4] }; }", &[])
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidResultShape(_)));
    }

    #[test]
    fn runaway_recursion_hits_stack_limit() {
        let script = r#"
            function deeper(n) { return deeper(n + 1) + 1; }
            function Decode(p, b) { return { depth: deeper(0) }; }
        "#;
        let err = ScriptDecoder::new().decode(1, script, &[]).unwrap_err();
        assert_eq!(err, DecodeError::StackLimitExceeded);
    }

    #[test]
    fn thrown_error_becomes_script_error() {
        let script = r#"function Decode(p, b) { throw new Error("sensor offline"); }"#;
        match ScriptDecoder::new().decode(1, script, &[]) {
            Err(DecodeError::Script(message)) => assert!(message.contains("sensor offline")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn thrown_value_becomes_script_error() {
        let script = "function Decode(p, b) { throw 42; }";
        match ScriptDecoder::new().decode(1, script, &[]) {
            Err(DecodeError::Script(message)) => assert!(!message.is_empty()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn undefined_variable_becomes_script_error() {
        let script = "function Decode(p, b) { return { v: notDefinedAnywhere }; }";
        match ScriptDecoder::new().decode(1, script, &[]) {
            Err(DecodeError::Script(message)) => assert!(!message.is_empty()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn syntax_error_becomes_script_error() {
        let err = ScriptDecoder::new()
            .decode(1, "function Decode(p, b) { return {", &[])
            .unwrap_err();
        assert!(matches!(err, DecodeError::Script(_)));
    }

    #[test]
    fn missing_entry_point_becomes_script_error() {
        let err = ScriptDecoder::new()
            .decode(1, "function decode(p, b) { return {}; }", &[])
            .unwrap_err();
        assert!(matches!(err, DecodeError::Script(_)));
    }

    #[test]
    fn non_object_results_are_rejected() {
        let decoder = ScriptDecoder::new();
        for body in [
            "return 7;",
            "return [1, 2];",
            "return 'text';",
            "return null;",
            "return;",
            "return function () {};",
        ] {
            let script = format!("function Decode(p, b) {{ {body} }}");
            let result = decoder.decode(1, &script, &[]);
            assert!(
                matches!(result, Err(DecodeError::InvalidResultShape(_))),
                "{body} gave {result:?}"
            );
        }
    }

    #[test]
    fn cyclic_result_is_rejected() {
        let script = "function Decode(p, b) { var o = {}; o.self = o; return o; }";
        let err = ScriptDecoder::new().decode(1, script, &[]).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidResultShape(_)));
    }

    #[test]
    fn function_field_is_rejected() {
        let script = "function Decode(p, b) { return { f: function () {} }; }";
        match ScriptDecoder::new().decode(1, script, &[]) {
            Err(DecodeError::InvalidResultShape(message)) => assert!(message.contains("'f'")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn state_does_not_leak_between_calls() {
        let decoder = ScriptDecoder::new();
        decoder
            .decode(
                1,
                "globalThis.leaked = 1; function Decode(p, b) { return {}; }",
                &[],
            )
            .unwrap();

        let readings = decoder
            .decode(1, "function Decode(p, b) { return { seen: typeof leaked }; }", &[])
            .unwrap();
        assert_eq!(readings["seen"], json!("undefined"));
    }

    #[test]
    fn no_host_capabilities_are_exposed() {
        let script = r#"
            function Decode(p, b) {
                return { std: typeof std, os: typeof os, require: typeof require };
            }
        "#;
        let readings = ScriptDecoder::new().decode(1, script, &[]).unwrap();
        assert_eq!(readings["std"], json!("undefined"));
        assert_eq!(readings["os"], json!("undefined"));
        assert_eq!(readings["require"], json!("undefined"));
    }

    #[test]
    fn timeout_does_not_affect_later_calls() {
        let decoder = ScriptDecoder::new();
        decoder
            .decode(1, "function Decode(p, b) { while (true) {} }", &[])
            .unwrap_err();

        thread::sleep(Duration::from_millis(30));
        let readings = decoder.decode(1, FIRST_BYTE, &[9]).unwrap();
        assert_eq!(readings["v"], json!(9));
    }

    #[test]
    fn concurrent_decodes_are_independent() {
        let decoder = Arc::new(ScriptDecoder::new());
        let handles: Vec<_> = (0u8..4)
            .map(|i| {
                let decoder = Arc::clone(&decoder);
                thread::spawn(move || decoder.decode(1, FIRST_BYTE, &[i]).unwrap())
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap()["v"], json!(i));
        }
    }

    #[test]
    fn custom_entry_point() {
        let decoder = ScriptDecoder::with_config(DecoderConfig {
            entry_point: "decodeUplink".to_string(),
            ..DecoderConfig::default()
        });
        let readings = decoder
            .decode(3, "function decodeUplink(p, b) { return { p: p }; }", &[])
            .unwrap();
        assert_eq!(readings["p"], json!(3));
    }

    #[test]
    fn entry_point_must_be_identifier() {
        assert!(validate_entry_point("Decode").is_ok());
        assert!(validate_entry_point("_decode$2").is_ok());
        assert!(validate_entry_point("").is_err());
        assert!(validate_entry_point("2fast").is_err());
        assert!(validate_entry_point("x(); evil").is_err());

        let decoder = ScriptDecoder::with_config(DecoderConfig {
            entry_point: "Decode(); while(true){}".to_string(),
            ..DecoderConfig::default()
        });
        assert!(matches!(
            decoder.decode(1, FIRST_BYTE, &[1]),
            Err(DecodeError::Engine(_))
        ));
    }

    #[test]
    fn classify_stack_messages() {
        assert_eq!(
            classify_failure("InternalError: stack overflow"),
            DecodeError::StackLimitExceeded
        );
        assert_eq!(
            classify_failure("RangeError: Maximum call stack size exceeded"),
            DecodeError::StackLimitExceeded
        );
        assert_eq!(
            classify_failure("  "),
            DecodeError::Script("script failed without a message".to_string())
        );
    }
}
