//! Message dispatch for converted GPS telemetry.
//!
//! A [`MessageSink`] hands every [`ConvertedMessage`] to its registered
//! [`Consumer`]s in order. [`TextLogWriter`] is the built-in consumer that
//! mirrors each message type into its own `<TYPE>.log` file.
//!
//! [`ConvertedMessage`]: gpsbridge_nmea::ConvertedMessage

pub mod error;
pub mod sink;
pub mod textlog;

pub use error::{Result, SinkError};
pub use sink::{Consumer, MessageSink};
pub use textlog::TextLogWriter;
