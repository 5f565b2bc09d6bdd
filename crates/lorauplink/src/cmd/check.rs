use lorauplink_decoder::load_script;
use lorauplink_device::{DeviceConfig, DevicesConfig, JoinType};
use lorauplink_pipeline::ReadingSchemas;
use serde::Serialize;

use crate::cmd::{load_devices, CheckArgs};
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Info,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    detail: String,
}

impl CheckResult {
    fn new(name: impl Into<String>, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CheckOutput {
    schema_id: &'static str,
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(args: CheckArgs, format: OutputFormat) -> CliResult<i32> {
    let max_script_size = args.max_script_kib.saturating_mul(1024);
    let mut checks = Vec::new();

    match load_devices(&args.devices) {
        Ok(config) => {
            checks.push(CheckResult::new(
                "config_load",
                CheckStatus::Pass,
                format!("{} ({} devices)", args.devices.display(), config.devices.len()),
            ));
            checks.extend(config_checks(&config, max_script_size));
        }
        Err(err) => checks.push(CheckResult::new("config_load", CheckStatus::Fail, err.message)),
    }
    checks.push(compiled_features_check());

    let has_fail = checks.iter().any(|c| c.status == CheckStatus::Fail);
    let output = CheckOutput {
        schema_id: "https://schemas.3leaps.dev/lorauplink/cli/v1/check-report.schema.json",
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    };
    print_check(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn config_checks(config: &DevicesConfig, max_script_size: usize) -> Vec<CheckResult> {
    let mut checks = Vec::new();

    match config.validate() {
        Ok(()) => checks.push(CheckResult::new(
            "config_valid",
            CheckStatus::Pass,
            "all entries valid",
        )),
        Err(err) => {
            checks.push(CheckResult::new("config_valid", CheckStatus::Fail, err.to_string()));
            return checks;
        }
    }

    for device in &config.devices {
        checks.push(decoder_check(config, device, max_script_size));
        if device.reading_schema.is_some() {
            checks.push(schema_check(device));
        }
    }
    checks
}

fn decoder_check(config: &DevicesConfig, device: &DeviceConfig, max_script_size: usize) -> CheckResult {
    let name = format!("decoder:{}", device.name);
    if device.join_type == JoinType::Otaa {
        return CheckResult::new(name, CheckStatus::Skip, "OTAA device is not registered without a join");
    }

    let path = device.resolve_decoder_path(config.base_dir.as_deref());
    match load_script(&path, max_script_size) {
        Ok(script) => CheckResult::new(
            name,
            CheckStatus::Pass,
            format!("{} ({} bytes)", path.display(), script.len()),
        ),
        Err(err) => CheckResult::new(name, CheckStatus::Fail, err.to_string()),
    }
}

fn schema_check(device: &DeviceConfig) -> CheckResult {
    let name = format!("schema:{}", device.name);
    let Some(schema) = &device.reading_schema else {
        return CheckResult::new(name, CheckStatus::Skip, "no reading schema");
    };
    let mut schemas = ReadingSchemas::new();
    match schemas.register(&device.name, schema) {
        Ok(()) => CheckResult::new(name, CheckStatus::Pass, "reading schema compiles"),
        Err(err) => CheckResult::new(name, CheckStatus::Fail, err.to_string()),
    }
}

fn compiled_features_check() -> CheckResult {
    let mut features = vec!["cli"];
    if cfg!(feature = "schema") {
        features.push("schema");
    }
    if cfg!(feature = "async") {
        features.push("async");
    }
    CheckResult::new("compiled_features", CheckStatus::Info, features.join(", "))
}

fn print_check(output: &CheckOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("lorauplink check\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<24} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Info => "INFO",
        CheckStatus::Skip => "SKIP",
    }
}
