use std::collections::VecDeque;
use std::io::ErrorKind;

use gpsbridge_transport::{ByteSource, TransportError};

use crate::assembler::{AssemblerConfig, CompletedFrame, FrameAssembler};
use crate::clock::{Clock, MonotonicClock};
use crate::error::Result;

const READ_CHUNK_SIZE: usize = 1024;

/// Pulls frames out of a [`ByteSource`].
///
/// Each cycle waits for readiness once, drains at most one bounded chunk and
/// feeds it through the assembler byte by byte. Partial sentences carry over
/// to the next cycle.
pub struct FrameReader<S, C = MonotonicClock> {
    source: S,
    assembler: FrameAssembler<C>,
    pending: VecDeque<CompletedFrame>,
}

impl<S: ByteSource> FrameReader<S, MonotonicClock> {
    /// Create a reader with default assembler configuration.
    pub fn new(source: S) -> Self {
        Self::with_config(source, AssemblerConfig::default())
    }

    /// Create a reader with explicit assembler configuration.
    pub fn with_config(source: S, config: AssemblerConfig) -> Self {
        Self::with_assembler(source, FrameAssembler::with_config(config))
    }
}

impl<S: ByteSource, C: Clock> FrameReader<S, C> {
    /// Create a reader around an existing assembler.
    pub fn with_assembler(source: S, assembler: FrameAssembler<C>) -> Self {
        Self {
            source,
            assembler,
            pending: VecDeque::new(),
        }
    }

    /// Run one wait-and-drain cycle, handing completed frames to `on_frame`.
    ///
    /// Returns the number of frames completed during this cycle. Source
    /// errors, including closure, are returned as-is.
    pub fn read_frames<F>(&mut self, mut on_frame: F) -> Result<usize>
    where
        F: FnMut(CompletedFrame),
    {
        let mut delivered = 0;
        while let Some(frame) = self.pending.pop_front() {
            on_frame(frame);
            delivered += 1;
        }

        self.source.wait_readable()?;

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let read = loop {
            match self.source.read_available(&mut chunk) {
                Ok(n) => break n,
                Err(TransportError::Io(err)) if err.kind() == ErrorKind::Interrupted => continue,
                Err(TransportError::Io(err)) if err.kind() == ErrorKind::WouldBlock => break 0,
                Err(err) => return Err(err.into()),
            }
        };

        Ok(delivered + self.assembler.feed_slice(&chunk[..read], on_frame))
    }

    /// Read the next complete frame (blocking).
    pub fn read_frame(&mut self) -> Result<CompletedFrame> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(frame);
            }
            let mut batch = Vec::new();
            self.read_frames(|frame| batch.push(frame))?;
            self.pending.extend(batch);
        }
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Borrow the assembler.
    pub fn assembler(&self) -> &FrameAssembler<C> {
        &self.assembler
    }

    /// Consume the reader and return the inner source.
    pub fn into_inner(self) -> S {
        self.source
    }
}
