use lorauplink_frame::UplinkFrame;

use crate::cmd::{parse_hex_frame, ParseArgs};
use crate::exit::{pipeline_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: ParseArgs, format: OutputFormat) -> CliResult<i32> {
    let raw = parse_hex_frame(&args.frame)
        .map_err(|err| CliError::new(USAGE, format!("frame is not valid hex: {err}")))?;
    let frame =
        UplinkFrame::parse(&raw).map_err(|err| pipeline_error("parse failed", err.into()))?;

    if !frame.message_type().is_data_uplink() {
        tracing::warn!(
            mtype = frame.message_type().as_str(),
            "frame is not a data uplink; fields may be meaningless"
        );
    }
    print_frame(&frame, format);
    Ok(SUCCESS)
}
