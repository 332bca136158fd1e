//! Serial NMEA-0183 GPS to telemetry message bridge.
//!
//! Reads raw bytes from a GPS receiver, splits them into `$...\n` sentence
//! frames, converts the supported sentences into typed messages and hands
//! them to consumers such as per-type text logs.
//!
//! # Crate Structure
//!
//! - [`transport`] - Byte sources (serial devices, any `io::Read`)
//! - [`frame`] - Streaming frame assembly with bounded buffering
//! - [`nmea`] - Sentence parsing and message conversion
//! - [`sink`] - Message fan-out and text logs
//! - [`bridge`] - The driver loop tying them together

pub mod bridge;

pub use bridge::{Bridge, BridgeConfig, BridgeError, BridgeStats};

/// Re-export transport types.
pub mod transport {
    pub use gpsbridge_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use gpsbridge_frame::*;
}

/// Re-export NMEA types.
pub mod nmea {
    pub use gpsbridge_nmea::*;
}

/// Re-export sink types.
pub mod sink {
    pub use gpsbridge_sink::*;
}
