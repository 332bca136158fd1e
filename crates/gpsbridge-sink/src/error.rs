use std::path::PathBuf;

/// Errors raised by message consumers.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// A log directory or file could not be created or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A consumer failed for a reason of its own.
    #[error("{consumer}: {message}")]
    Consumer { consumer: String, message: String },
}

impl SinkError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SinkError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SinkError>;
