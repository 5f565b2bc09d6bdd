use std::io::BufRead;

use lorauplink_frame::{DevAddr, UplinkFrame};
use lorauplink_pipeline::{DecodedUplink, UplinkPipeline};

use crate::cmd::{build_pipeline, parse_hex_frame, StreamArgs};
use crate::exit::{io_error, pipeline_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_uplink, OutputFormat, UplinkRecord};

#[derive(Debug, Default)]
struct StreamStats {
    decoded: usize,
    ignored: usize,
    failed: usize,
}

pub fn run(args: StreamArgs, format: OutputFormat) -> CliResult<i32> {
    let pipeline = build_pipeline(&args.pipeline)?;
    // One table per line is unreadable.
    let format = match format {
        OutputFormat::Table => OutputFormat::Pretty,
        other => other,
    };

    let stdin = std::io::stdin();
    let mut stats = StreamStats::default();

    for (index, line) in stdin.lock().lines().enumerate() {
        let line = line.map_err(|err| io_error("failed reading stdin", err))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no = index + 1;

        match process_line(&pipeline, line) {
            Ok(Outcome::Decoded(uplink)) => {
                stats.decoded += 1;
                print_uplink(&UplinkRecord::decoded(&uplink).at_line(line_no), format);
            }
            Ok(Outcome::Ignored { dev_addr, fcnt }) => {
                stats.ignored += 1;
                if args.show_ignored {
                    print_uplink(
                        &UplinkRecord::ignored(dev_addr, fcnt).at_line(line_no),
                        format,
                    );
                }
            }
            Err(err) => {
                stats.failed += 1;
                if args.fail_fast {
                    return Err(CliError::new(err.code, format!("line {line_no}: {err}")));
                }
                print_uplink(&UplinkRecord::failed(&err).at_line(line_no), format);
            }
        }
    }

    tracing::info!(
        decoded = stats.decoded,
        ignored = stats.ignored,
        failed = stats.failed,
        "stream finished"
    );

    if stats.failed > 0 {
        Ok(DATA_INVALID)
    } else {
        Ok(SUCCESS)
    }
}

enum Outcome {
    Decoded(DecodedUplink),
    Ignored { dev_addr: DevAddr, fcnt: u16 },
}

fn process_line(pipeline: &UplinkPipeline, line: &str) -> CliResult<Outcome> {
    let raw = parse_hex_frame(line)
        .map_err(|err| CliError::new(DATA_INVALID, format!("frame is not valid hex: {err}")))?;
    let frame =
        UplinkFrame::parse(&raw).map_err(|err| pipeline_error("decode failed", err.into()))?;

    let (dev_addr, fcnt) = (frame.dev_addr, frame.fcnt);
    match pipeline.process_frame(frame) {
        Ok(Some(uplink)) => Ok(Outcome::Decoded(uplink)),
        Ok(None) => Ok(Outcome::Ignored { dev_addr, fcnt }),
        Err(err) => Err(pipeline_error("decode failed", err)),
    }
}
