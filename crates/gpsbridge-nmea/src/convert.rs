//! Sentence to message conversion.
//!
//! Conversion never fails. Invalid or missing numeric fields become NaN
//! (floats) or 0 (integers), so one bad field never drops a whole fix.

use std::str::FromStr;

use chrono::NaiveDate;
use tracing::trace;

use crate::message::{ConvertedMessage, GpsFix, GpsPgrme, GpsPgrmv, GpsRmc};
use crate::sentence::{ParsedSentence, SentenceType};

/// Convert a parsed sentence. Returns `None` for types with no message.
pub fn convert(sentence: &ParsedSentence, time_usec: u64) -> Option<ConvertedMessage> {
    let message = match sentence.sentence_type() {
        SentenceType::Gga => ConvertedMessage::GpsFix(gga(sentence, time_usec)),
        SentenceType::Rmc => ConvertedMessage::GpsRmc(rmc(sentence, time_usec)),
        SentenceType::Grme => ConvertedMessage::GpsPgrme(grme(sentence, time_usec)),
        SentenceType::Grmv => ConvertedMessage::GpsPgrmv(grmv(sentence, time_usec)),
        other => {
            trace!(sentence_type = %other, "no message for sentence type");
            return None;
        }
    };
    Some(message)
}

/// Parse a float field, negating it for a southern or western hemisphere.
///
/// Returns `on_error` when the field is missing or not a number.
pub fn to_float(value: Option<&str>, on_error: f64, hemisphere: Option<&str>) -> f64 {
    match value.and_then(|v| v.trim().parse::<f64>().ok()) {
        Some(x) if is_negative_hemisphere(hemisphere) => -x,
        Some(x) => x,
        None => on_error,
    }
}

/// Parse an integer field, returning `on_error` when missing or invalid.
pub fn to_int<T: FromStr>(value: Option<&str>, on_error: T) -> T {
    value
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(on_error)
}

fn is_negative_hemisphere(hemisphere: Option<&str>) -> bool {
    matches!(hemisphere.map(str::trim), Some("S" | "W"))
}

/// `[d]ddmm.mmmm` plus hemisphere to signed decimal degrees, NaN if invalid.
fn to_degrees(value: Option<&str>, hemisphere: Option<&str>) -> f64 {
    let Some(magnitude) = value.and_then(parse_degrees_minutes) else {
        return f64::NAN;
    };
    if is_negative_hemisphere(hemisphere) {
        -magnitude
    } else {
        magnitude
    }
}

fn parse_degrees_minutes(value: &str) -> Option<f64> {
    let value = value.trim();
    let int_len = value.find('.').unwrap_or(value.len());
    if int_len < 3 || !value[..int_len].bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let (degrees, minutes) = value.split_at(int_len - 2);
    let degrees: f64 = degrees.parse().ok()?;
    let minutes: f64 = minutes.parse().ok()?;
    Some(degrees + minutes / 60.0)
}

/// Time of day split into whole fields and microseconds.
struct TimeOfDay {
    hour: u32,
    minute: u32,
    second: u32,
    micros: u32,
}

impl TimeOfDay {
    /// Parse `hhmmss[.sss]`.
    fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
        if whole.len() != 6 || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let hour: u32 = whole[0..2].parse().ok()?;
        let minute: u32 = whole[2..4].parse().ok()?;
        let second: u32 = whole[4..6].parse().ok()?;
        if hour > 23 || minute > 59 || second > 60 {
            return None;
        }

        let micros = if fraction.is_empty() {
            0
        } else {
            let frac: f64 = format!("0.{fraction}").parse().ok()?;
            ((frac * 1e6).round() as u32).min(999_999)
        };

        Some(Self {
            hour,
            minute,
            second,
            micros,
        })
    }

    fn seconds_since_midnight(&self) -> f64 {
        f64::from((self.hour * 60 + self.minute) * 60 + self.second) + f64::from(self.micros) * 1e-6
    }
}

/// Seconds since midnight UTC, NaN when absent or invalid.
fn seconds_of_day(value: Option<&str>) -> f64 {
    value
        .and_then(TimeOfDay::parse)
        .map_or(f64::NAN, |t| t.seconds_since_midnight())
}

/// Combine `ddmmyy` and `hhmmss[.sss]` into microseconds since the epoch.
///
/// Two-digit years 69-99 fall in the 1900s, 00-68 in the 2000s.
fn epoch_micros(date: Option<&str>, time: Option<&str>) -> Option<i64> {
    let date = date?.trim();
    if date.len() != 6 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let day: u32 = date[0..2].parse().ok()?;
    let month: u32 = date[2..4].parse().ok()?;
    let yy: i32 = date[4..6].parse().ok()?;
    let year = if yy >= 69 { 1900 + yy } else { 2000 + yy };

    let time = TimeOfDay::parse(time?)?;
    let second = time.second.min(59);
    let stamp = NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_micro_opt(time.hour, time.minute, second, time.micros)?
        .and_utc();
    Some(stamp.timestamp_micros())
}

fn gga(s: &ParsedSentence, time_usec: u64) -> GpsFix {
    let geo_sep = to_float(s.field("geo_sep"), f64::NAN, None);
    GpsFix {
        time_usec,
        fix_time: seconds_of_day(s.field("timestamp")),
        latitude: to_degrees(s.field("lat"), s.field("lat_dir")),
        longitude: to_degrees(s.field("lon"), s.field("lon_dir")),
        quality: to_int(s.field("gps_qual"), 0),
        num_sats: to_int(s.field("num_sats"), 0),
        hdop: to_float(s.field("horizontal_dil"), f64::NAN, None),
        altitude: to_float(s.field("altitude"), f64::NAN, None),
        // The receiver reports no separate correction age here; both fields
        // carry the geoid separation.
        geoid_height: geo_sep,
        age_dgps: geo_sep,
        dgps_id: to_int(s.field("ref_station_id"), 0),
    }
}

fn rmc(s: &ParsedSentence, time_usec: u64) -> GpsRmc {
    let fix_time_usec = epoch_micros(s.field("datestamp"), s.field("timestamp"))
        .and_then(|us| u64::try_from(us).ok())
        .unwrap_or(0);

    GpsRmc {
        time_usec,
        fix_time_usec,
        warning: s.field("status").unwrap_or_default().to_string(),
        latitude: to_degrees(s.field("lat"), s.field("lat_dir")),
        longitude: to_degrees(s.field("lon"), s.field("lon_dir")),
        speed: to_float(s.field("spd_over_grnd"), f64::NAN, None),
        course: to_float(s.field("true_course"), f64::NAN, None),
        mag_var: to_float(s.field("mag_variation"), f64::NAN, s.field("mag_var_dir")),
        mode: s.field("mode").unwrap_or_default().to_string(),
    }
}

fn grme(s: &ParsedSentence, time_usec: u64) -> GpsPgrme {
    GpsPgrme {
        time_usec,
        hpe: to_float(s.field("hpe"), f64::NAN, None),
        vpe: to_float(s.field("vpe"), f64::NAN, None),
        epe: to_float(s.field("osepe"), f64::NAN, None),
    }
}

fn grmv(s: &ParsedSentence, time_usec: u64) -> GpsPgrmv {
    GpsPgrmv {
        time_usec,
        veast: to_float(s.field("veast"), f64::NAN, None),
        vnorth: to_float(s.field("vnorth"), f64::NAN, None),
        vup: to_float(s.field("vup"), f64::NAN, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentence::parse;

    const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";
    const RMC: &str = "$GPRMC,081836,A,3751.65,S,14507.36,E,000.0,360.0,130998,011.3,E*62\r\n";

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-4
    }

    fn fix(text: &str) -> GpsFix {
        match convert(&parse(text).unwrap(), 99) {
            Some(ConvertedMessage::GpsFix(m)) => m,
            other => panic!("expected GpsFix, got {other:?}"),
        }
    }

    fn rmc_msg(text: &str) -> GpsRmc {
        match convert(&parse(text).unwrap(), 99) {
            Some(ConvertedMessage::GpsRmc(m)) => m,
            other => panic!("expected GpsRmc, got {other:?}"),
        }
    }

    #[test]
    fn gga_converts_to_fix() {
        let m = fix(GGA);

        assert_eq!(m.time_usec, 99);
        assert!(close(m.latitude, 48.1173));
        assert!(close(m.longitude, 11.516_667));
        assert_eq!(m.quality, 1);
        assert_eq!(m.num_sats, 8);
        assert!(close(m.hdop, 0.9));
        assert!(close(m.altitude, 545.4));
        assert!(close(m.fix_time, 45_319.0));
        assert_eq!(m.dgps_id, 0);
    }

    #[test]
    fn gga_reuses_geoid_separation_for_age() {
        let m = fix(GGA);
        assert!(close(m.geoid_height, 46.9));
        assert_eq!(m.geoid_height.to_bits(), m.age_dgps.to_bits());
    }

    #[test]
    fn southern_western_hemispheres_negate() {
        let north_east = fix(GGA);
        let south_west = fix("$GPGGA,123519,4807.038,S,01131.000,W,1,08,0.9,545.4,M,46.9,M,,");

        assert!(close(south_west.latitude, -north_east.latitude));
        assert!(close(south_west.longitude, -north_east.longitude));
        assert_eq!(
            GpsFix {
                latitude: 0.0,
                longitude: 0.0,
                ..south_west
            },
            GpsFix {
                latitude: 0.0,
                longitude: 0.0,
                ..north_east
            }
        );
    }

    #[test]
    fn missing_altitude_is_nan_without_failing() {
        let m = fix("$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,,M,46.9,M,,");
        assert!(m.altitude.is_nan());
        assert!(close(m.latitude, 48.1173));
        assert_eq!(m.num_sats, 8);

        let m = fix("$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,abc,M,46.9,M,,");
        assert!(m.altitude.is_nan());
    }

    #[test]
    fn empty_fix_uses_sentinels() {
        let m = fix("$GPGGA,,,,,,0,,,,,,,,");
        assert!(m.fix_time.is_nan());
        assert!(m.latitude.is_nan());
        assert!(m.longitude.is_nan());
        assert_eq!(m.quality, 0);
        assert_eq!(m.num_sats, 0);
        assert!(m.hdop.is_nan());
        assert!(m.geoid_height.is_nan());
    }

    #[test]
    fn rmc_converts_with_signed_position() {
        let m = rmc_msg(RMC);

        assert_eq!(m.warning, "A");
        assert!(close(m.latitude, -(37.0 + 51.65 / 60.0)));
        assert!(close(m.longitude, 145.0 + 7.36 / 60.0));
        assert!(close(m.speed, 0.0));
        assert!(close(m.course, 360.0));
        assert!(close(m.mag_var, 11.3));
        assert_eq!(m.mode, "");
        // 1998-09-13T08:18:36Z
        assert_eq!(m.fix_time_usec, 905_674_716_000_000);
    }

    #[test]
    fn rmc_southern_variation_is_negative() {
        let m = rmc_msg("$GPRMC,081836,A,3751.65,S,14507.36,E,000.0,360.0,130998,011.3,S");
        assert!(close(m.mag_var, -11.3));

        let m = rmc_msg("$GPRMC,081836,A,3751.65,S,14507.36,E,000.0,360.0,130998,011.3,W");
        assert!(close(m.mag_var, -11.3));
    }

    #[test]
    fn rmc_mode_and_fractional_time() {
        let m = rmc_msg("$GNRMC,235959.50,V,,,,,,,010124,,,N");
        assert_eq!(m.warning, "V");
        assert_eq!(m.mode, "N");
        assert!(m.latitude.is_nan());
        assert!(m.speed.is_nan());
        // 2024-01-01T23:59:59.5Z
        assert_eq!(m.fix_time_usec, 1_704_153_599_500_000);
    }

    #[test]
    fn rmc_without_date_has_zero_fix_time() {
        let m = rmc_msg("$GPRMC,081836,A,3751.65,S,14507.36,E,000.0,360.0,,011.3,E");
        assert_eq!(m.fix_time_usec, 0);
    }

    #[test]
    fn garmin_error_and_velocity() {
        let grme = convert(&parse("$PGRME,15.0,M,,M,25.0,M").unwrap(), 7);
        assert_eq!(
            grme.as_ref().map(ConvertedMessage::name),
            Some("GPS_PGRME")
        );
        let Some(ConvertedMessage::GpsPgrme(e)) = grme else {
            unreachable!()
        };
        assert_eq!(e.time_usec, 7);
        assert!(close(e.hpe, 15.0));
        assert!(e.vpe.is_nan());
        assert!(close(e.epe, 25.0));

        let Some(ConvertedMessage::GpsPgrmv(v)) = convert(&parse("$PGRMV,1.5,-0.2").unwrap(), 7)
        else {
            panic!("expected GpsPgrmv");
        };
        assert!(close(v.veast, 1.5));
        assert!(close(v.vnorth, -0.2));
        assert!(v.vup.is_nan());
    }

    #[test]
    fn unsupported_types_yield_nothing() {
        let gsa = parse("$GPGSA,A,3,04,05,,09,12,,,24,,,,,2.5,1.3,2.1").unwrap();
        assert_eq!(convert(&gsa, 0), None);
        let grmz = parse("$PGRMZ,246,f,3").unwrap();
        assert_eq!(convert(&grmz, 0), None);
    }

    #[test]
    fn to_float_and_to_int_primitives() {
        assert_eq!(to_float(Some("1.5"), f64::NAN, None), 1.5);
        assert_eq!(to_float(Some("1.5"), f64::NAN, Some("W")), -1.5);
        assert_eq!(to_float(Some("1.5"), f64::NAN, Some("N")), 1.5);
        assert_eq!(to_float(Some("1.5"), f64::NAN, Some("")), 1.5);
        assert!(to_float(Some(""), f64::NAN, None).is_nan());
        assert_eq!(to_float(None, -1.0, None), -1.0);

        assert_eq!(to_int::<i32>(Some("08"), 0), 8);
        assert_eq!(to_int::<i32>(Some("8.0"), 0), 0);
        assert_eq!(to_int(None, 3u8), 3);
    }

    #[test]
    fn degrees_minutes_edge_cases() {
        assert!(close(parse_degrees_minutes("4807").unwrap(), 48.116_667));
        assert!(close(parse_degrees_minutes("00000.0").unwrap(), 0.0));
        assert_eq!(parse_degrees_minutes("07.5"), None);
        assert_eq!(parse_degrees_minutes("-4807.038"), None);
        assert!(to_degrees(Some("N/A"), Some("N")).is_nan());
    }
}
