use lorauplink_frame::UplinkFrame;

use crate::cmd::{build_pipeline, parse_hex_frame, DecodeArgs};
use crate::exit::{pipeline_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{print_uplink, OutputFormat, UplinkRecord};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let raw = parse_hex_frame(&args.frame)
        .map_err(|err| CliError::new(USAGE, format!("frame is not valid hex: {err}")))?;
    let frame = UplinkFrame::parse(&raw)
        .map_err(|err| pipeline_error("decode failed", err.into()))?;
    let dev_addr = frame.dev_addr;

    let pipeline = build_pipeline(&args.pipeline)?;
    match pipeline.process_frame(frame) {
        Ok(Some(uplink)) => {
            print_uplink(&UplinkRecord::decoded(&uplink), format);
            Ok(SUCCESS)
        }
        Ok(None) => Err(CliError::new(
            FAILURE,
            format!("no registered device owns DevAddr {dev_addr}"),
        )),
        Err(err) => Err(pipeline_error("decode failed", err)),
    }
}
