use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use gpsbridge::frame::{
    AssemblerConfig, Clock, MonotonicClock, StartMarkerPolicy, SystemClock,
    DEFAULT_MAX_BUFF_SIZE, DEFAULT_SLACK,
};
use gpsbridge::sink::{MessageSink, TextLogWriter};
use gpsbridge::{BridgeConfig, BridgeStats};
use tracing::info;

use crate::exit::{sink_error, CliResult};
use crate::output::{OutputFormat, StdoutConsumer};

pub mod replay;
pub mod run;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read NMEA sentences from a serial GPS receiver until it disconnects.
    Run(RunArgs),
    /// Feed a captured NMEA text file through the bridge.
    Replay(ReplayArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args),
        Command::Replay(args) => replay::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Serial device path (e.g. /dev/ttyUSB0).
    #[arg(env = "GPSBRIDGE_PORT")]
    pub port: String,
    /// Serial baud rate.
    #[arg(long, default_value_t = 38_400, env = "GPSBRIDGE_BAUD")]
    pub baud: u32,
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Captured NMEA text, or `-` for stdin.
    pub input: PathBuf,
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Options shared by every command that runs the bridge.
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Write one `<TYPE>.log` text file per message type into DIR.
    #[arg(long, value_name = "DIR", env = "GPSBRIDGE_LOGTXTDIR")]
    pub logtxtdir: Option<PathBuf>,
    /// Print converted messages to stdout.
    #[arg(long, value_name = "FORMAT", env = "GPSBRIDGE_PRINT")]
    pub print: Option<OutputFormat>,
    /// Bytes kept when an unterminated sentence overflows the buffer.
    #[arg(
        long,
        value_name = "BYTES",
        default_value_t = DEFAULT_MAX_BUFF_SIZE,
        value_parser = parse_buffer_size,
        env = "GPSBRIDGE_MAX_BUFF_SIZE"
    )]
    pub max_buff_size: usize,
    /// Extra bytes tolerated past --max-buff-size before truncating.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_SLACK, env = "GPSBRIDGE_SLACK")]
    pub slack: usize,
    /// Handling of a `$` inside an open sentence.
    #[arg(long, value_enum, default_value_t = StartMarkerArg::Restart, env = "GPSBRIDGE_START_MARKER")]
    pub start_marker: StartMarkerArg,
    /// Clock used to timestamp sentences.
    #[arg(long, value_enum, default_value_t = ClockArg::Monotonic, env = "GPSBRIDGE_CLOCK")]
    pub clock: ClockArg,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StartMarkerArg {
    /// Drop the partial sentence and start over.
    Restart,
    /// Keep the `$` as payload.
    Append,
}

impl From<StartMarkerArg> for StartMarkerPolicy {
    fn from(arg: StartMarkerArg) -> Self {
        match arg {
            StartMarkerArg::Restart => StartMarkerPolicy::Restart,
            StartMarkerArg::Append => StartMarkerPolicy::Append,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ClockArg {
    /// Microseconds since the bridge started.
    Monotonic,
    /// Microseconds since the Unix epoch.
    Realtime,
}

impl PipelineArgs {
    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            assembler: AssemblerConfig {
                max_buff_size: self.max_buff_size,
                slack: self.slack,
                start_marker_policy: self.start_marker.into(),
            },
        }
    }

    pub fn clock(&self) -> Box<dyn Clock> {
        match self.clock {
            ClockArg::Monotonic => Box::new(MonotonicClock::new()),
            ClockArg::Realtime => Box::new(SystemClock),
        }
    }

    /// Build the sink: text logs first, then stdout.
    pub fn build_sink(&self) -> CliResult<MessageSink> {
        let mut sink = MessageSink::new();
        if let Some(dir) = &self.logtxtdir {
            let writer = TextLogWriter::create(dir)
                .map_err(|err| sink_error("cannot create log directory", err))?;
            info!(dir = %writer.dir().display(), "writing text logs");
            sink.register(writer);
        }
        if let Some(format) = self.print {
            sink.register(StdoutConsumer::new(format));
        }
        Ok(sink)
    }
}

fn parse_buffer_size(value: &str) -> Result<usize, String> {
    let size: usize = value
        .parse()
        .map_err(|err| format!("invalid buffer size {value:?}: {err}"))?;
    if size == 0 {
        return Err("buffer size must be at least 1".to_string());
    }
    Ok(size)
}

pub fn log_stats(stats: &BridgeStats) {
    info!(
        frames = stats.frames,
        messages = stats.messages,
        parse_failures = stats.parse_failures,
        unsupported = stats.unsupported,
        overflows = stats.overflows,
        consumer_failures = stats.consumer_failures,
        "bridge stopped"
    );
}
