//! Telemetry messages produced from NMEA sentences.
//!
//! Every message carries `time_usec`, the receive timestamp of the frame it
//! came from (0 when unknown). Field order below is the order used by text
//! logs.

use std::fmt;

use serde::Serialize;

/// Position fix, from GGA.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpsFix {
    pub time_usec: u64,
    /// Seconds since midnight UTC.
    pub fix_time: f64,
    /// Signed decimal degrees, north positive.
    pub latitude: f64,
    /// Signed decimal degrees, east positive.
    pub longitude: f64,
    pub quality: i32,
    pub num_sats: i32,
    pub hdop: f64,
    pub altitude: f64,
    pub geoid_height: f64,
    pub age_dgps: f64,
    pub dgps_id: i32,
}

/// Course and speed, from RMC.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpsRmc {
    pub time_usec: u64,
    /// Fix date and time, microseconds since the Unix epoch (UTC).
    pub fix_time_usec: u64,
    /// Receiver status, `A` valid or `V` warning.
    pub warning: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Knots.
    pub speed: f64,
    /// Degrees true.
    pub course: f64,
    /// Degrees, east positive.
    pub mag_var: f64,
    pub mode: String,
}

/// Garmin estimated position error, from PGRME.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpsPgrme {
    pub time_usec: u64,
    pub hpe: f64,
    pub vpe: f64,
    pub epe: f64,
}

/// Garmin velocity, from PGRMV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpsPgrmv {
    pub time_usec: u64,
    pub veast: f64,
    pub vnorth: f64,
    pub vup: f64,
}

/// A converted message, one variant per output kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ConvertedMessage {
    #[serde(rename = "GPS_GGA")]
    GpsFix(GpsFix),
    #[serde(rename = "GPS_RMC")]
    GpsRmc(GpsRmc),
    #[serde(rename = "GPS_PGRME")]
    GpsPgrme(GpsPgrme),
    #[serde(rename = "GPS_PGRMV")]
    GpsPgrmv(GpsPgrmv),
}

/// Message kind without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    GpsFix,
    GpsRmc,
    GpsPgrme,
    GpsPgrmv,
}

impl MessageKind {
    pub const ALL: [MessageKind; 4] = [
        MessageKind::GpsFix,
        MessageKind::GpsRmc,
        MessageKind::GpsPgrme,
        MessageKind::GpsPgrmv,
    ];

    /// Message type name, used for log file names.
    pub fn name(self) -> &'static str {
        match self {
            MessageKind::GpsFix => "GPS_GGA",
            MessageKind::GpsRmc => "GPS_RMC",
            MessageKind::GpsPgrme => "GPS_PGRME",
            MessageKind::GpsPgrmv => "GPS_PGRMV",
        }
    }

    /// Field names in declared order.
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            MessageKind::GpsFix => &[
                "time_usec",
                "fix_time",
                "latitude",
                "longitude",
                "quality",
                "num_sats",
                "hdop",
                "altitude",
                "geoid_height",
                "age_dgps",
                "dgps_id",
            ],
            MessageKind::GpsRmc => &[
                "time_usec",
                "fix_time_usec",
                "warning",
                "latitude",
                "longitude",
                "speed",
                "course",
                "mag_var",
                "mode",
            ],
            MessageKind::GpsPgrme => &["time_usec", "hpe", "vpe", "epe"],
            MessageKind::GpsPgrmv => &["time_usec", "veast", "vnorth", "vup"],
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ConvertedMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            ConvertedMessage::GpsFix(_) => MessageKind::GpsFix,
            ConvertedMessage::GpsRmc(_) => MessageKind::GpsRmc,
            ConvertedMessage::GpsPgrme(_) => MessageKind::GpsPgrme,
            ConvertedMessage::GpsPgrmv(_) => MessageKind::GpsPgrmv,
        }
    }

    /// Message type name.
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Receive timestamp of the originating frame.
    pub fn time_usec(&self) -> u64 {
        match self {
            ConvertedMessage::GpsFix(m) => m.time_usec,
            ConvertedMessage::GpsRmc(m) => m.time_usec,
            ConvertedMessage::GpsPgrme(m) => m.time_usec,
            ConvertedMessage::GpsPgrmv(m) => m.time_usec,
        }
    }

    /// Field names in declared order.
    pub fn field_names(&self) -> &'static [&'static str] {
        self.kind().field_names()
    }

    /// Field values, aligned with [`field_names`](Self::field_names).
    pub fn field_values(&self) -> Vec<FieldValue<'_>> {
        use FieldValue::{Float, Int, Text, UInt};

        match self {
            ConvertedMessage::GpsFix(m) => vec![
                UInt(m.time_usec),
                Float(m.fix_time),
                Float(m.latitude),
                Float(m.longitude),
                Int(m.quality.into()),
                Int(m.num_sats.into()),
                Float(m.hdop),
                Float(m.altitude),
                Float(m.geoid_height),
                Float(m.age_dgps),
                Int(m.dgps_id.into()),
            ],
            ConvertedMessage::GpsRmc(m) => vec![
                UInt(m.time_usec),
                UInt(m.fix_time_usec),
                Text(&m.warning),
                Float(m.latitude),
                Float(m.longitude),
                Float(m.speed),
                Float(m.course),
                Float(m.mag_var),
                Text(&m.mode),
            ],
            ConvertedMessage::GpsPgrme(m) => vec![
                UInt(m.time_usec),
                Float(m.hpe),
                Float(m.vpe),
                Float(m.epe),
            ],
            ConvertedMessage::GpsPgrmv(m) => vec![
                UInt(m.time_usec),
                Float(m.veast),
                Float(m.vnorth),
                Float(m.vup),
            ],
        }
    }
}

/// One field value, rendered as a single whitespace-free token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Float(f64),
    Int(i64),
    UInt(u64),
    Text(&'a str),
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FieldValue::Float(v) if v.is_nan() => f.write_str("nan"),
            FieldValue::Float(v) if v.is_infinite() => {
                f.write_str(if v > 0.0 { "inf" } else { "-inf" })
            }
            FieldValue::Float(v) => write!(f, "{v:?}"),
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::UInt(v) => write!(f, "{v}"),
            // Empty text would collapse a column.
            FieldValue::Text("") => f.write_str("-"),
            FieldValue::Text(v) => f.write_str(v),
        }
    }
}
