//! Byte sources feeding the GPS bridge.
//!
//! A [`ByteSource`] exposes the two operations the acquisition loop needs:
//! a blocking readiness wait and a non-blocking drain of whatever bytes are
//! currently available.
//! - [`SerialSource`] reads a serial GPS device (unix, `serial` feature)
//! - [`ReaderSource`] adapts any `std::io::Read`, e.g. a captured NMEA log
//!
//! This is the lowest layer of gpsbridge. Framing and conversion build on top
//! of the [`ByteSource`] trait provided here.

pub mod error;
pub mod traits;

#[cfg(all(unix, feature = "serial"))]
pub mod serial;

pub use error::{Result, TransportError};
pub use traits::{ByteSource, ReaderSource};

#[cfg(all(unix, feature = "serial"))]
pub use serial::{SerialConfig, SerialSource};
