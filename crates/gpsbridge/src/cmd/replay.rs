use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use gpsbridge::transport::ReaderSource;
use gpsbridge::Bridge;
use tracing::info;

use crate::cmd::{log_stats, ReplayArgs};
use crate::exit::{bridge_error, io_error, CliResult, SUCCESS};

pub fn run(args: ReplayArgs) -> CliResult<i32> {
    let input = open_input(&args.input)
        .map_err(|err| io_error(&format!("cannot open {}", args.input.display()), err))?;
    let sink = args.pipeline.build_sink()?;

    let mut bridge = Bridge::with_clock(
        ReaderSource::new(input),
        sink,
        args.pipeline.bridge_config(),
        args.pipeline.clock(),
    );
    info!(input = %args.input.display(), "replaying");

    let stats = bridge
        .run()
        .map_err(|err| bridge_error("replay failed", err))?;
    log_stats(&stats);
    Ok(SUCCESS)
}

fn open_input(path: &Path) -> io::Result<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    Ok(Box::new(File::open(path)?))
}
