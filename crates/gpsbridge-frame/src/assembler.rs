use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::clock::{Clock, MonotonicClock};

/// Byte that opens an NMEA sentence.
pub const START_MARKER: u8 = b'$';

/// Byte that closes an NMEA sentence (the `\n` of `\r\n`).
pub const TERMINATOR: u8 = b'\n';

/// Default number of bytes kept when an unterminated frame overflows.
pub const DEFAULT_MAX_BUFF_SIZE: usize = 100;

/// Default growth allowed past `max_buff_size` before truncating.
pub const DEFAULT_SLACK: usize = 50;

/// What to do when a start marker arrives in the middle of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartMarkerPolicy {
    /// Abandon the partial frame and start a new one.
    #[default]
    Restart,
    /// Keep the partial frame and treat the marker as payload.
    Append,
}

/// Configuration for the frame assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Bytes retained after an overflow truncation. Default: 100.
    pub max_buff_size: usize,
    /// Extra growth tolerated before truncating. Default: 50.
    pub slack: usize,
    /// Handling of a start marker inside an open frame.
    pub start_marker_policy: StartMarkerPolicy,
}

impl AssemblerConfig {
    /// Hard upper bound on the buffer length between `feed` calls.
    pub fn capacity(&self) -> usize {
        self.max_buff_size.saturating_add(self.slack)
    }
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            max_buff_size: DEFAULT_MAX_BUFF_SIZE,
            slack: DEFAULT_SLACK,
            start_marker_policy: StartMarkerPolicy::default(),
        }
    }
}

/// A candidate sentence, from start marker to terminator inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedFrame {
    /// Clock reading taken when the start marker was observed.
    pub timestamp_us: u64,
    /// Raw frame bytes.
    pub payload: Bytes,
}

impl CompletedFrame {
    /// Create a new frame.
    pub fn new(timestamp_us: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            timestamp_us,
            payload: payload.into(),
        }
    }

    /// Frame bytes as text. Bytes outside ASCII are dropped.
    pub fn text(&self) -> String {
        self.payload
            .iter()
            .filter(|b| b.is_ascii())
            .map(|&b| char::from(b))
            .collect()
    }
}

/// Assembler state. The start timestamp only exists while a frame is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    /// Waiting for a start marker; other bytes are dropped.
    Idle,
    /// A frame is open.
    Accumulating { started_us: u64 },
}

/// Turns a byte stream into delimited sentence frames.
///
/// State persists across calls, so a sentence split over any number of
/// reads assembles the same as one delivered whole.
pub struct FrameAssembler<C = MonotonicClock> {
    clock: C,
    config: AssemblerConfig,
    buf: BytesMut,
    state: AssemblerState,
    overflows: u64,
}

impl FrameAssembler<MonotonicClock> {
    /// Create an assembler with default configuration and a monotonic clock.
    pub fn new() -> Self {
        Self::with_config(AssemblerConfig::default())
    }

    /// Create an assembler with explicit configuration and a monotonic clock.
    pub fn with_config(config: AssemblerConfig) -> Self {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl Default for FrameAssembler<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> FrameAssembler<C> {
    /// Create an assembler stamping frames from `clock`.
    pub fn with_clock(config: AssemblerConfig, clock: C) -> Self {
        Self {
            buf: BytesMut::with_capacity(config.capacity() + 1),
            clock,
            config,
            state: AssemblerState::Idle,
            overflows: 0,
        }
    }

    /// Feed one byte. Returns a frame when `byte` terminates one.
    pub fn feed(&mut self, byte: u8) -> Option<CompletedFrame> {
        let started_us = match self.state {
            AssemblerState::Idle => {
                if byte == START_MARKER {
                    self.start_frame();
                }
                return None;
            }
            AssemblerState::Accumulating { started_us } => started_us,
        };

        if byte == START_MARKER && self.config.start_marker_policy == StartMarkerPolicy::Restart {
            debug!(discarded = self.buf.len(), "start marker inside open frame");
            self.start_frame();
            return None;
        }

        self.buf.extend_from_slice(&[byte]);

        if byte == TERMINATOR {
            let frame = CompletedFrame::new(started_us, Bytes::copy_from_slice(&self.buf));
            self.buf.clear();
            self.state = AssemblerState::Idle;
            trace!(len = frame.payload.len(), started_us, "frame complete");
            return Some(frame);
        }

        if self.buf.len() > self.config.capacity() {
            let excess = self.buf.len() - self.config.max_buff_size;
            self.buf.advance(excess);
            self.overflows += 1;
            debug!(
                dropped = excess,
                kept = self.buf.len(),
                "receive buffer overflow, keeping most recent bytes"
            );
        }

        None
    }

    /// Feed a chunk, handing every completed frame to `on_frame` in order.
    ///
    /// Returns the number of frames completed.
    pub fn feed_slice<F>(&mut self, bytes: &[u8], mut on_frame: F) -> usize
    where
        F: FnMut(CompletedFrame),
    {
        let mut completed = 0;
        for &byte in bytes {
            if let Some(frame) = self.feed(byte) {
                completed += 1;
                on_frame(frame);
            }
        }
        completed
    }

    /// Drop any partial frame and return to `Idle`.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.state = AssemblerState::Idle;
    }

    /// Current state.
    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// True when no frame is open.
    pub fn is_idle(&self) -> bool {
        self.state == AssemblerState::Idle
    }

    /// Bytes of the open frame accumulated so far.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Number of overflow truncations since creation.
    pub fn overflow_count(&self) -> u64 {
        self.overflows
    }

    /// Current configuration.
    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Clock used to stamp frames.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn start_frame(&mut self) {
        self.buf.clear();
        self.buf.extend_from_slice(&[START_MARKER]);
        self.state = AssemblerState::Accumulating {
            started_us: self.clock.now_us(),
        };
    }
}

impl<C> std::fmt::Debug for FrameAssembler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameAssembler")
            .field("state", &self.state)
            .field("buffered", &self.buf.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const GGA: &[u8] = b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";

    fn assembler(clock: &ManualClock) -> FrameAssembler<ManualClock> {
        FrameAssembler::with_clock(AssemblerConfig::default(), clock.clone())
    }

    fn feed_all<C: Clock>(asm: &mut FrameAssembler<C>, bytes: &[u8]) -> Vec<CompletedFrame> {
        let mut frames = Vec::new();
        asm.feed_slice(bytes, |f| frames.push(f));
        frames
    }

    #[test]
    fn assembles_single_sentence() {
        let clock = ManualClock::new(42);
        let mut asm = assembler(&clock);

        let frames = feed_all(&mut asm, GGA);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.as_ref(), GGA);
        assert_eq!(frames[0].timestamp_us, 42);
        assert!(asm.is_idle());
        assert!(asm.buffered().is_empty());
    }

    #[test]
    fn bytes_before_start_marker_are_dropped() {
        let clock = ManualClock::new(0);
        let mut asm = assembler(&clock);

        assert!(feed_all(&mut asm, b"garbage\r\n\n").is_empty());
        assert!(asm.is_idle());

        let frames = feed_all(&mut asm, b"xx$GPTXT,hi\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.as_ref(), b"$GPTXT,hi\r\n");
    }

    #[test]
    fn timestamp_is_taken_at_start_marker() {
        let clock = ManualClock::new(1_000);
        let mut asm = assembler(&clock);

        assert!(asm.feed(b'$').is_none());
        assert_eq!(
            asm.state(),
            AssemblerState::Accumulating { started_us: 1_000 }
        );

        clock.advance(500);
        let frames = feed_all(&mut asm, b"GPTXT\r\n");
        assert_eq!(frames[0].timestamp_us, 1_000);
    }

    #[test]
    fn split_chunks_assemble_identically() {
        let clock = ManualClock::new(7);
        let whole = feed_all(&mut assembler(&clock), GGA);

        for split in [1, 2, 5, 13, GGA.len() - 1] {
            let mut asm = assembler(&clock);
            let mut frames = Vec::new();
            for chunk in GGA.chunks(split) {
                frames.extend(feed_all(&mut asm, chunk));
            }
            assert_eq!(frames, whole, "chunk size {split}");
        }
    }

    #[test]
    fn buffer_never_exceeds_capacity() {
        let clock = ManualClock::new(0);
        let mut asm = assembler(&clock);
        let capacity = asm.config().capacity();

        asm.feed(b'$');
        for i in 0..1_000u32 {
            asm.feed(b'A' + (i % 26) as u8);
            assert!(asm.buffered().len() <= capacity);
        }
        assert!(!asm.is_idle());
    }

    #[test]
    fn overflow_by_one_truncates_once_keeping_recent_bytes() {
        let clock = ManualClock::new(0);
        let mut asm = assembler(&clock);
        let config = asm.config().clone();

        let mut stream = vec![b'$'];
        stream.extend((1..=config.capacity()).map(|i| b'a' + (i % 26) as u8));
        assert_eq!(stream.len(), config.capacity() + 1);

        assert!(feed_all(&mut asm, &stream[..config.capacity()]).is_empty());
        assert_eq!(asm.buffered().len(), config.capacity());
        assert_eq!(asm.overflow_count(), 0);

        asm.feed(stream[config.capacity()]);
        assert_eq!(asm.overflow_count(), 1);
        assert_eq!(asm.buffered(), &stream[stream.len() - config.max_buff_size..]);
        assert!(matches!(asm.state(), AssemblerState::Accumulating { .. }));
    }

    #[test]
    fn overflowed_frame_recovers_on_terminator() {
        let clock = ManualClock::new(3);
        let mut asm = assembler(&clock);

        let mut stream = vec![b'$'];
        stream.extend(std::iter::repeat_n(b'x', 200));
        stream.extend_from_slice(b"\r\n");

        let frames = feed_all(&mut asm, &stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].timestamp_us, 3);
        assert!(frames[0].payload.len() <= asm.config().capacity() + 1);
        assert!(frames[0].payload.ends_with(b"xx\r\n"));
        assert!(asm.is_idle());
    }

    #[test]
    fn new_start_marker_restarts_frame() {
        let clock = ManualClock::new(10);
        let mut asm = assembler(&clock);

        feed_all(&mut asm, b"$GPGGA,1234");
        clock.set(20);
        let frames = feed_all(&mut asm, b"$GPTXT,ok\r\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.as_ref(), b"$GPTXT,ok\r\n");
        assert_eq!(frames[0].timestamp_us, 20);
    }

    #[test]
    fn append_policy_keeps_partial_frame() {
        let clock = ManualClock::new(10);
        let config = AssemblerConfig {
            start_marker_policy: StartMarkerPolicy::Append,
            ..AssemblerConfig::default()
        };
        let mut asm = FrameAssembler::with_clock(config, clock.clone());

        feed_all(&mut asm, b"$GPGGA,12");
        clock.set(20);
        let frames = feed_all(&mut asm, b"$GPTXT\r\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.as_ref(), b"$GPGGA,12$GPTXT\r\n");
        assert_eq!(frames[0].timestamp_us, 10);
    }

    #[test]
    fn back_to_back_sentences() {
        let clock = ManualClock::new(0);
        let mut asm = assembler(&clock);

        let frames = feed_all(&mut asm, b"$A\r\n$B\r\n$C\r\n");
        let payloads: Vec<&[u8]> = frames.iter().map(|f| f.payload.as_ref()).collect();
        assert_eq!(payloads, vec![&b"$A\r\n"[..], b"$B\r\n", b"$C\r\n"]);
    }

    #[test]
    fn reset_discards_partial_frame() {
        let clock = ManualClock::new(0);
        let mut asm = assembler(&clock);

        feed_all(&mut asm, b"$GPGGA");
        asm.reset();
        assert!(asm.is_idle());
        assert!(feed_all(&mut asm, b",1\r\n").is_empty());
    }

    #[test]
    fn frame_text_drops_non_ascii() {
        let frame = CompletedFrame::new(0, Bytes::from_static(b"$GP\xffTXT\r\n"));
        assert_eq!(frame.text(), "$GPTXT\r\n");
    }

    #[test]
    fn default_config_values() {
        let config = AssemblerConfig::default();
        assert_eq!(config.max_buff_size, 100);
        assert_eq!(config.slack, 50);
        assert_eq!(config.capacity(), 150);
        assert_eq!(config.start_marker_policy, StartMarkerPolicy::Restart);
    }
}
