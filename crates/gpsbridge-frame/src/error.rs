use gpsbridge_transport::TransportError;

/// Errors that can occur while pulling frames from a byte source.
///
/// Assembly itself is infallible; every error here comes from the source.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The byte source failed or closed.
    #[error("byte source error: {0}")]
    Source(#[from] TransportError),
}

impl FrameError {
    /// True when the underlying source reached end of stream.
    pub fn is_closed(&self) -> bool {
        matches!(self, FrameError::Source(err) if err.is_closed())
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
