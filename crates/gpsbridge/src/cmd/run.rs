use crate::cmd::RunArgs;
use crate::exit::CliResult;

#[cfg(unix)]
pub fn run(args: RunArgs) -> CliResult<i32> {
    use gpsbridge::transport::{SerialConfig, SerialSource};
    use gpsbridge::Bridge;
    use tracing::info;

    use crate::cmd::log_stats;
    use crate::exit::{bridge_error, transport_error, CliError, TRANSPORT_ERROR};

    let config = SerialConfig {
        baud_rate: args.baud,
        ..SerialConfig::default()
    };
    let source = SerialSource::open_with_config(args.port.as_str(), &config)
        .map_err(|err| transport_error("open failed", err))?;
    let sink = args.pipeline.build_sink()?;

    let mut bridge = Bridge::with_clock(
        source,
        sink,
        args.pipeline.bridge_config(),
        args.pipeline.clock(),
    );
    info!(port = %args.port, baud = args.baud, "bridge running");

    match bridge.run() {
        Ok(stats) => {
            log_stats(&stats);
            Err(CliError::new(
                TRANSPORT_ERROR,
                format!("{}: device disconnected", args.port),
            ))
        }
        Err(err) => {
            log_stats(&bridge.stats());
            Err(bridge_error("receive failed", err))
        }
    }
}

#[cfg(not(unix))]
pub fn run(args: RunArgs) -> CliResult<i32> {
    Err(crate::exit::CliError::new(
        crate::exit::USAGE,
        format!("{}: serial devices are only supported on unix", args.port),
    ))
}
