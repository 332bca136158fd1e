use std::io::Read;

use crate::error::{Result, TransportError};

/// A stream of raw bytes from a GPS device.
///
/// The acquisition loop alternates between [`wait_readable`] and
/// [`read_available`]; it never reads speculatively.
///
/// [`wait_readable`]: ByteSource::wait_readable
/// [`read_available`]: ByteSource::read_available
pub trait ByteSource {
    /// Block until bytes are available to read.
    ///
    /// Returns `Err(TransportError::Closed)` once the source can never become
    /// readable again. Any other error is fatal to the caller.
    fn wait_readable(&mut self) -> Result<()>;

    /// Read bytes that are already available without blocking.
    ///
    /// Returns the number of bytes written into `buf`. `Ok(0)` means nothing
    /// was pending (a spurious wakeup), not end of stream.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn wait_readable(&mut self) -> Result<()> {
        (**self).wait_readable()
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_available(buf)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn wait_readable(&mut self) -> Result<()> {
        (**self).wait_readable()
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_available(buf)
    }
}

/// Adapts any [`Read`] into a [`ByteSource`].
///
/// Reads are assumed to always be ready; end of stream is reported as
/// [`TransportError::Closed`]. Used to replay captured NMEA text.
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: R,
    eof: bool,
}

impl<R: Read> ReaderSource<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self { inner, eof: false }
    }

    /// Borrow the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Consume the source and return the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn wait_readable(&mut self) -> Result<()> {
        if self.eof {
            return Err(TransportError::Closed);
        }
        Ok(())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.inner.read(buf) {
            Ok(0) => {
                self.eof = true;
                Err(TransportError::Closed)
            }
            Ok(n) => Ok(n),
            Err(err) => Err(TransportError::Io(err)),
        }
    }
}
