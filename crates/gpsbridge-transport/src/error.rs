/// Errors that can occur while waiting on or reading from a byte source.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial device.
    #[cfg(feature = "serial")]
    #[error("failed to open serial device {path}: {source}")]
    Open {
        path: String,
        source: serialport::Error,
    },

    /// Waiting for the source to become readable failed.
    #[error("readiness wait failed: {0}")]
    Readiness(std::io::Error),

    /// An I/O error occurred while reading from the source.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source reached end of stream or the device hung up.
    #[error("byte source closed")]
    Closed,
}

impl TransportError {
    /// True when the source has no more data to give.
    pub fn is_closed(&self) -> bool {
        matches!(self, TransportError::Closed)
    }

    /// Kind of the underlying OS error, if there is one.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            #[cfg(feature = "serial")]
            TransportError::Open { source, .. } => match source.kind() {
                serialport::ErrorKind::Io(kind) => Some(kind),
                _ => None,
            },
            TransportError::Readiness(err) | TransportError::Io(err) => Some(err.kind()),
            TransportError::Closed => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
