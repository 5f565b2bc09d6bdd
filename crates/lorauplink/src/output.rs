use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use lorauplink_decoder::Readings;
use lorauplink_frame::{port, DevAddr, UplinkFrame};
use lorauplink_pipeline::DecodedUplink;
use serde::Serialize;

use crate::exit::CliError;

const UPLINK_SCHEMA_ID: &str =
    "https://schemas.3leaps.dev/lorauplink/cli/v1/decoded-uplink.schema.json";
const FRAME_SCHEMA_ID: &str = "https://schemas.3leaps.dev/lorauplink/cli/v1/parsed-frame.schema.json";

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Outcome of one uplink, as printed by `decode` and `stream`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UplinkStatus {
    Decoded,
    Ignored,
    Error,
}

#[derive(Debug, Serialize)]
pub struct UplinkRecord<'a> {
    schema_id: &'static str,
    status: UplinkStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dev_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fcnt: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fport: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    readings: Option<&'a Readings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exit_code: Option<i32>,
}

impl<'a> UplinkRecord<'a> {
    pub fn decoded(uplink: &'a DecodedUplink) -> Self {
        Self {
            status: UplinkStatus::Decoded,
            device: Some(&uplink.device),
            dev_addr: Some(uplink.dev_addr.to_string()),
            fcnt: Some(uplink.fcnt),
            fport: Some(uplink.fport),
            readings: Some(&uplink.readings),
            ..Self::empty()
        }
    }

    pub fn ignored(dev_addr: DevAddr, fcnt: u16) -> Self {
        Self {
            status: UplinkStatus::Ignored,
            dev_addr: Some(dev_addr.to_string()),
            fcnt: Some(fcnt),
            ..Self::empty()
        }
    }

    pub fn failed(err: &CliError) -> Self {
        Self {
            status: UplinkStatus::Error,
            error: Some(err.message.clone()),
            exit_code: Some(err.code),
            ..Self::empty()
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    fn empty() -> Self {
        Self {
            schema_id: UPLINK_SCHEMA_ID,
            status: UplinkStatus::Error,
            line: None,
            device: None,
            dev_addr: None,
            fcnt: None,
            fport: None,
            readings: None,
            error: None,
            exit_code: None,
        }
    }
}

/// Print a single record. Streams pass `Table` through as `Pretty`.
pub fn print_uplink(record: &UplinkRecord<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(record).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["STATUS", "DEVICE", "DEV_ADDR", "FCNT", "FPORT", "READINGS"])
                .add_row(vec![
                    status_text(&record.status).to_string(),
                    record.device.unwrap_or("-").to_string(),
                    record.dev_addr.clone().unwrap_or_else(|| "-".to_string()),
                    opt_text(record.fcnt),
                    opt_text(record.fport),
                    detail_text(record),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let mut line = String::new();
            if let Some(n) = record.line {
                line.push_str(&format!("line={n} "));
            }
            line.push_str(status_text(&record.status));
            if let Some(device) = record.device {
                line.push_str(&format!(" device={device}"));
            }
            if let Some(addr) = &record.dev_addr {
                line.push_str(&format!(" dev_addr={addr}"));
            }
            if let Some(fcnt) = record.fcnt {
                line.push_str(&format!(" fcnt={fcnt}"));
            }
            if let Some(fport) = record.fport {
                line.push_str(&format!(" fport={fport}"));
            }
            line.push(' ');
            line.push_str(&detail_text(record));
            println!("{}", line.trim_end());
        }
    }
}

#[derive(Debug, Serialize)]
struct FrameOutput {
    schema_id: &'static str,
    message_type: &'static str,
    dev_addr: String,
    nwk_id: u8,
    adr: bool,
    adr_ack_req: bool,
    ack: bool,
    fpending: bool,
    fcnt: u16,
    fopts: String,
    fport: u8,
    port_name: &'static str,
    application_data: bool,
    payload: String,
    payload_size: usize,
    mic: String,
}

impl FrameOutput {
    fn new(frame: &UplinkFrame) -> Self {
        Self {
            schema_id: FRAME_SCHEMA_ID,
            message_type: frame.message_type().as_str(),
            dev_addr: frame.dev_addr.to_string(),
            nwk_id: frame.dev_addr.nwk_id(),
            adr: frame.fctrl.adr(),
            adr_ack_req: frame.fctrl.adr_ack_req(),
            ack: frame.fctrl.ack(),
            fpending: frame.fctrl.fpending(),
            fcnt: frame.fcnt,
            fopts: hex::encode_upper(&frame.fopts),
            fport: frame.fport,
            port_name: port::port_name(frame.fport),
            application_data: port::is_application(frame.fport),
            payload: hex::encode_upper(&frame.payload),
            payload_size: frame.payload.len(),
            mic: hex::encode_upper(frame.mic),
        }
    }
}

/// Print the fields of a parsed (still encrypted) frame.
pub fn print_frame(frame: &UplinkFrame, format: OutputFormat) {
    let out = FrameOutput::new(frame);
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let flags = fctrl_flags(&out);
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["MType", out.message_type])
                .add_row(vec!["DevAddr".to_string(), out.dev_addr.clone()])
                .add_row(vec!["FCtrl".to_string(), flags])
                .add_row(vec!["FCnt".to_string(), out.fcnt.to_string()])
                .add_row(vec!["FOpts".to_string(), or_dash(&out.fopts)])
                .add_row(vec![
                    "FPort".to_string(),
                    format!("{} ({})", out.fport, out.port_name),
                ])
                .add_row(vec!["FRMPayload".to_string(), or_dash(&out.payload)])
                .add_row(vec!["MIC".to_string(), out.mic.clone()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "mtype={} dev_addr={} fctrl=[{}] fcnt={} fopts={} fport={} ({}) payload={} mic={}",
                out.message_type,
                out.dev_addr,
                fctrl_flags(&out),
                out.fcnt,
                or_dash(&out.fopts),
                out.fport,
                out.port_name,
                or_dash(&out.payload),
                out.mic
            );
        }
    }
}

fn fctrl_flags(out: &FrameOutput) -> String {
    let flags: Vec<&str> = [
        (out.adr, "ADR"),
        (out.adr_ack_req, "ADRACKReq"),
        (out.ack, "ACK"),
        (out.fpending, "FPending"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect();
    flags.join(" ")
}

fn status_text(status: &UplinkStatus) -> &'static str {
    match status {
        UplinkStatus::Decoded => "decoded",
        UplinkStatus::Ignored => "ignored",
        UplinkStatus::Error => "error",
    }
}

fn detail_text(record: &UplinkRecord<'_>) -> String {
    if let Some(readings) = record.readings {
        return serde_json::to_string(readings).unwrap_or_else(|_| "{}".to_string());
    }
    record.error.clone().unwrap_or_default()
}

fn opt_text<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decoded_record_serializes_readings() {
        let mut readings = Readings::new();
        readings.insert("v".to_string(), json!(23));
        let uplink = DecodedUplink {
            device: "thermo-1".to_string(),
            dev_addr: DevAddr::new([1, 2, 3, 4]),
            fcnt: 5,
            fport: 1,
            readings,
        };

        let json = serde_json::to_value(UplinkRecord::decoded(&uplink)).unwrap();
        assert_eq!(json["status"], "decoded");
        assert_eq!(json["device"], "thermo-1");
        assert_eq!(json["dev_addr"], "01020304");
        assert_eq!(json["readings"], json!({"v": 23}));
        assert!(json.get("error").is_none());
        assert!(json.get("line").is_none());
    }

    #[test]
    fn failed_record_carries_exit_code() {
        let err = CliError::new(60, "malformed frame: too short");
        let json = serde_json::to_value(UplinkRecord::failed(&err).at_line(7)).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["line"], 7);
        assert_eq!(json["exit_code"], 60);
        assert!(json.get("readings").is_none());
    }

    #[test]
    fn frame_output_renders_hex_fields() {
        let frame = UplinkFrame::parse(&[
            0x40, 0x04, 0x03, 0x02, 0x01, 0x80, 0x05, 0x00, 0x01, 0x3C, 0x37, 0xAA, 0xBB, 0xCC,
            0xDD,
        ])
        .unwrap();
        let out = FrameOutput::new(&frame);
        assert_eq!(out.dev_addr, "01020304");
        assert_eq!(out.payload, "3C37");
        assert_eq!(out.mic, "AABBCCDD");
        assert!(out.adr);
        assert_eq!(fctrl_flags(&out), "ADR");
        assert_eq!(out.message_type, "UnconfirmedDataUp");
        assert!(out.application_data);
    }

    #[test]
    fn mac_port_is_not_application_data() {
        let frame = UplinkFrame::parse(&[
            0x40, 0x04, 0x03, 0x02, 0x01, 0x00, 0x05, 0x00, 0x00, 0x02, 0xAA, 0xBB, 0xCC, 0xDD,
        ])
        .unwrap();
        let out = FrameOutput::new(&frame);
        assert_eq!(out.port_name, "MAC");
        assert!(!out.application_data);
    }
}
