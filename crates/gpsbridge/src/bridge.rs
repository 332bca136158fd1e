//! The receive loop: bytes in, converted messages out.

use gpsbridge_frame::{
    AssemblerConfig, Clock, CompletedFrame, FrameAssembler, FrameError, FrameReader,
    MonotonicClock,
};
use gpsbridge_nmea::{convert, parse};
use gpsbridge_sink::MessageSink;
use gpsbridge_transport::ByteSource;
use serde::Serialize;
use tracing::{debug, trace, warn};

/// Errors that stop the bridge.
///
/// Malformed input and consumer failures are not errors here; they are
/// logged and counted in [`BridgeStats`].
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Frame(#[from] FrameError),
}

impl BridgeError {
    /// True when the byte source reached end of stream.
    pub fn is_closed(&self) -> bool {
        match self {
            BridgeError::Frame(err) => err.is_closed(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Bridge configuration.
#[derive(Debug, Clone, Default)]
pub struct BridgeConfig {
    pub assembler: AssemblerConfig,
}

/// Running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BridgeStats {
    /// Frames delimited by the assembler.
    pub frames: u64,
    /// Frames that were not valid sentences.
    pub parse_failures: u64,
    /// Valid sentences with no message mapping.
    pub unsupported: u64,
    /// Messages handed to the sink.
    pub messages: u64,
    /// Receive buffer truncations.
    pub overflows: u64,
    /// Consumer errors reported by the sink.
    pub consumer_failures: u64,
}

/// Drives a [`ByteSource`] through framing, parsing and conversion into a
/// [`MessageSink`].
pub struct Bridge<S, C = MonotonicClock> {
    reader: FrameReader<S, C>,
    sink: MessageSink,
    stats: BridgeStats,
}

impl<S: ByteSource> Bridge<S, MonotonicClock> {
    /// Create a bridge with default configuration.
    pub fn new(source: S, sink: MessageSink) -> Self {
        Self::with_config(source, sink, BridgeConfig::default())
    }

    /// Create a bridge with explicit configuration.
    pub fn with_config(source: S, sink: MessageSink, config: BridgeConfig) -> Self {
        Self::with_clock(source, sink, config, MonotonicClock::new())
    }
}

impl<S: ByteSource, C: Clock> Bridge<S, C> {
    /// Create a bridge that stamps frames with `clock`.
    pub fn with_clock(source: S, sink: MessageSink, config: BridgeConfig, clock: C) -> Self {
        let assembler = FrameAssembler::with_clock(config.assembler, clock);
        Self {
            reader: FrameReader::with_assembler(source, assembler),
            sink,
            stats: BridgeStats::default(),
        }
    }

    /// Run one wait-and-drain cycle.
    ///
    /// Every frame completed during the cycle is parsed, converted and
    /// dispatched before this returns. Returns the number of frames.
    pub fn process(&mut self) -> Result<usize> {
        let sink = &mut self.sink;
        let stats = &mut self.stats;
        let result = self
            .reader
            .read_frames(|frame| dispatch_frame(&frame, sink, stats));

        self.stats.overflows = self.reader.assembler().overflow_count();
        self.stats.consumer_failures = self.sink.failure_count();
        Ok(result?)
    }

    /// Process until the source closes or fails.
    ///
    /// End of stream is a normal return; every other source error is
    /// propagated.
    pub fn run(&mut self) -> Result<BridgeStats> {
        loop {
            match self.process() {
                Ok(_) => {}
                Err(err) if err.is_closed() => {
                    debug!(
                        frames = self.stats.frames,
                        messages = self.stats.messages,
                        "byte source closed"
                    );
                    return Ok(self.stats);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Counters so far.
    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    pub fn sink(&self) -> &MessageSink {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut MessageSink {
        &mut self.sink
    }

    pub fn reader(&self) -> &FrameReader<S, C> {
        &self.reader
    }

    /// Consume the bridge and return the byte source.
    pub fn into_source(self) -> S {
        self.reader.into_inner()
    }
}

fn dispatch_frame(frame: &CompletedFrame, sink: &mut MessageSink, stats: &mut BridgeStats) {
    stats.frames += 1;

    let text = frame.text();
    let sentence = match parse(&text) {
        Ok(sentence) => sentence,
        Err(err) => {
            stats.parse_failures += 1;
            warn!(error = %err, raw = %text.trim_end(), "discarding malformed sentence");
            return;
        }
    };

    match convert(&sentence, frame.timestamp_us) {
        Some(message) => {
            stats.messages += 1;
            sink.handle(&message);
        }
        None => {
            stats.unsupported += 1;
            trace!(sentence_type = %sentence.sentence_type(), "sentence not forwarded");
        }
    }
}

impl<S, C> std::fmt::Debug for Bridge<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("sink", &self.sink)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
