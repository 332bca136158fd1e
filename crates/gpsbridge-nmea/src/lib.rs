//! NMEA-0183 sentence parsing and conversion to telemetry messages.
//!
//! Two stages, both pure functions of their input:
//! - [`sentence::parse`] validates grammar and checksum and exposes the
//!   fields of a sentence by name
//! - [`convert::convert`] maps the supported sentence types onto
//!   [`ConvertedMessage`] values, applying unit and sign conversions
//!
//! Only position fixes (GGA), course/speed (RMC) and the Garmin PGRME/PGRMV
//! error and velocity sentences produce messages. Other recognised sentences
//! convert to nothing.

pub mod convert;
pub mod error;
pub mod message;
pub mod sentence;

pub use convert::{convert, to_float, to_int};
pub use error::{ParseError, Result};
pub use message::{
    ConvertedMessage, FieldValue, GpsFix, GpsPgrme, GpsPgrmv, GpsRmc, MessageKind,
};
pub use sentence::{checksum, parse, ParsedSentence, SentenceType};
