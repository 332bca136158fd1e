use std::io::{ErrorKind, Read};
use std::os::fd::{AsRawFd, RawFd};
use std::time::Duration;

use serialport::{SerialPort, TTYPort};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::ByteSource;

/// Serial line settings for a GPS device.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Line speed in baud. Default: 38400.
    pub baud_rate: u32,
    /// Upper bound on a single driver read once data is reported ready.
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: SerialSource::DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_millis(10),
        }
    }
}

/// A serial GPS device polled for readiness.
///
/// Readiness is detected with `poll(2)` on the device descriptor and the
/// wait has no timeout. Once signaled, only the bytes the driver reports as
/// queued are read, so a read never stalls the loop.
pub struct SerialSource {
    port: TTYPort,
    path: String,
}

impl SerialSource {
    /// Default line speed of the receivers used in the acquisition system.
    pub const DEFAULT_BAUD_RATE: u32 = 38_400;

    /// Open a serial device with default settings.
    pub fn open(path: impl Into<String>) -> Result<Self> {
        Self::open_with_config(path, &SerialConfig::default())
    }

    /// Open a serial device with explicit settings.
    pub fn open_with_config(path: impl Into<String>, config: &SerialConfig) -> Result<Self> {
        let path = path.into();
        let port = serialport::new(&path, config.baud_rate)
            .timeout(config.read_timeout)
            .open_native()
            .map_err(|source| TransportError::Open {
                path: path.clone(),
                source,
            })?;

        info!(%path, baud_rate = config.baud_rate, "opened serial device");
        Ok(Self { port, path })
    }

    /// Device path this source was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl ByteSource for SerialSource {
    fn wait_readable(&mut self) -> Result<()> {
        wait_fd_readable(self.port.as_raw_fd())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        let queued = self
            .port
            .bytes_to_read()
            .map_err(|err| TransportError::Io(err.into()))? as usize;
        let len = queued.min(buf.len());
        if len == 0 {
            return Ok(0);
        }

        match self.port.read(&mut buf[..len]) {
            Ok(n) => Ok(n),
            Err(err) if err.kind() == ErrorKind::TimedOut => Ok(0),
            Err(err) => Err(TransportError::Io(err)),
        }
    }
}

impl std::fmt::Debug for SerialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialSource")
            .field("path", &self.path)
            .finish()
    }
}

/// Block until `fd` is readable. Hangup without pending data means closed.
fn wait_fd_readable(fd: RawFd) -> Result<()> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };

    loop {
        // SAFETY: `pfd` is a valid, writable pollfd and the count matches.
        let rc = unsafe { libc::poll(&mut pfd, 1, -1) };
        if rc < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == ErrorKind::Interrupted {
                continue;
            }
            return Err(TransportError::Readiness(err));
        }

        if pfd.revents & libc::POLLIN != 0 {
            return Ok(());
        }
        if pfd.revents & libc::POLLHUP != 0 {
            debug!(fd, "serial device hung up");
            return Err(TransportError::Closed);
        }
        if pfd.revents & (libc::POLLERR | libc::POLLNVAL) != 0 {
            return Err(TransportError::Readiness(std::io::Error::other(format!(
                "poll reported revents {:#x}",
                pfd.revents
            ))));
        }
    }
}
