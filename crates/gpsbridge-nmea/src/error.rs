/// Errors that can occur while parsing an NMEA sentence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Nothing but whitespace was received.
    #[error("empty sentence")]
    Empty,

    /// The sentence does not begin with `$`.
    #[error("missing '$' start marker")]
    MissingStartMarker,

    /// The checksum field is not two hex digits.
    #[error("malformed checksum field {0:?}")]
    InvalidChecksum(String),

    /// The transmitted checksum does not match the sentence body.
    #[error("checksum mismatch (expected {expected:02X}, computed {actual:02X})")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// The address field is too short or contains invalid characters.
    #[error("malformed address field {0:?}")]
    MalformedAddress(String),

    /// The sentence type is not one this parser knows.
    #[error("unknown sentence type {0:?}")]
    UnknownType(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;
