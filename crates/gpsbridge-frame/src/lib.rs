//! Streaming frame assembly for NMEA-0183 byte streams.
//!
//! Serial GPS receivers deliver sentences in arbitrary chunks. The
//! [`FrameAssembler`] consumes them one byte at a time and emits a
//! [`CompletedFrame`] for every `$`...`\n` span, stamped with the instant
//! its start marker was seen:
//! - At most one frame is in flight
//! - The receive buffer is bounded, keeping the most recent bytes
//! - `feed` never blocks and never fails
//!
//! [`FrameReader`] ties an assembler to a [`gpsbridge_transport::ByteSource`].

pub mod assembler;
pub mod clock;
pub mod error;
pub mod reader;

pub use assembler::{
    AssemblerConfig, AssemblerState, CompletedFrame, FrameAssembler, StartMarkerPolicy,
    DEFAULT_MAX_BUFF_SIZE, DEFAULT_SLACK, START_MARKER, TERMINATOR,
};
pub use clock::{Clock, ManualClock, MonotonicClock, SystemClock};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
