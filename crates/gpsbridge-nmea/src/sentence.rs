//! NMEA-0183 sentence grammar.
//!
//! ```text
//! $<talker><type>,<field>,<field>,...*<hh>\r\n
//! $P<maker><type>,<field>,...*<hh>\r\n        (proprietary)
//! ```
//!
//! The checksum is optional. When present it is the XOR of every byte
//! between `$` and `*`, written as two hex digits.

use serde::Serialize;

use crate::error::{ParseError, Result};

/// Sentence types the parser recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SentenceType {
    /// Global positioning system fix data.
    Gga,
    /// Recommended minimum navigation information.
    Rmc,
    /// DOP and active satellites.
    Gsa,
    /// Satellites in view.
    Gsv,
    /// Geographic position.
    Gll,
    /// Track made good and ground speed.
    Vtg,
    /// Time and date.
    Zda,
    /// Text transmission.
    Txt,
    /// Garmin estimated position error.
    Grme,
    /// Garmin 3D velocity.
    Grmv,
    /// Garmin map datum.
    Grmm,
    /// Garmin altitude.
    Grmz,
}

const GGA_FIELDS: &[&str] = &[
    "timestamp",
    "lat",
    "lat_dir",
    "lon",
    "lon_dir",
    "gps_qual",
    "num_sats",
    "horizontal_dil",
    "altitude",
    "altitude_units",
    "geo_sep",
    "geo_sep_units",
    "age_gps_data",
    "ref_station_id",
];

const RMC_FIELDS: &[&str] = &[
    "timestamp",
    "status",
    "lat",
    "lat_dir",
    "lon",
    "lon_dir",
    "spd_over_grnd",
    "true_course",
    "datestamp",
    "mag_variation",
    "mag_var_dir",
    "mode",
    "nav_status",
];

const GRME_FIELDS: &[&str] = &["hpe", "hpe_unit", "vpe", "vpe_unit", "osepe", "osepe_unit"];

const GRMV_FIELDS: &[&str] = &["veast", "vnorth", "vup"];

impl SentenceType {
    /// Look up a type by its code (`GGA`, `GRME`, ...).
    pub fn from_code(code: &str) -> Option<Self> {
        let ty = match code {
            "GGA" => SentenceType::Gga,
            "RMC" => SentenceType::Rmc,
            "GSA" => SentenceType::Gsa,
            "GSV" => SentenceType::Gsv,
            "GLL" => SentenceType::Gll,
            "VTG" => SentenceType::Vtg,
            "ZDA" => SentenceType::Zda,
            "TXT" => SentenceType::Txt,
            "GRME" => SentenceType::Grme,
            "GRMV" => SentenceType::Grmv,
            "GRMM" => SentenceType::Grmm,
            "GRMZ" => SentenceType::Grmz,
            _ => return None,
        };
        Some(ty)
    }

    /// The type code as it appears after the talker id.
    pub fn code(self) -> &'static str {
        match self {
            SentenceType::Gga => "GGA",
            SentenceType::Rmc => "RMC",
            SentenceType::Gsa => "GSA",
            SentenceType::Gsv => "GSV",
            SentenceType::Gll => "GLL",
            SentenceType::Vtg => "VTG",
            SentenceType::Zda => "ZDA",
            SentenceType::Txt => "TXT",
            SentenceType::Grme => "GRME",
            SentenceType::Grmv => "GRMV",
            SentenceType::Grmm => "GRMM",
            SentenceType::Grmz => "GRMZ",
        }
    }

    /// True for manufacturer-specific (`$P...`) sentences.
    pub fn is_proprietary(self) -> bool {
        matches!(
            self,
            SentenceType::Grme | SentenceType::Grmv | SentenceType::Grmm | SentenceType::Grmz
        )
    }

    /// Names of the data fields, in wire order.
    ///
    /// Empty for types whose fields are never accessed by name.
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            SentenceType::Gga => GGA_FIELDS,
            SentenceType::Rmc => RMC_FIELDS,
            SentenceType::Grme => GRME_FIELDS,
            SentenceType::Grmv => GRMV_FIELDS,
            _ => &[],
        }
    }
}

impl std::fmt::Display for SentenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A syntactically valid sentence with its raw text fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSentence {
    talker: String,
    sentence_type: SentenceType,
    fields: Vec<String>,
}

impl ParsedSentence {
    /// Talker id (`GP`, `GN`, ...). Empty for proprietary sentences.
    pub fn talker(&self) -> &str {
        &self.talker
    }

    /// Sentence type tag.
    pub fn sentence_type(&self) -> SentenceType {
        self.sentence_type
    }

    /// All data fields after the address, in wire order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Field by position. `None` when the sentence is shorter.
    pub fn field_at(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Field by name. `None` when the name is unknown for this type or the
    /// sentence is too short to carry it.
    pub fn field(&self, name: &str) -> Option<&str> {
        let index = self
            .sentence_type
            .field_names()
            .iter()
            .position(|candidate| *candidate == name)?;
        self.field_at(index)
    }
}

/// Compute the NMEA checksum of a sentence body.
pub fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0, |acc, b| acc ^ b)
}

/// Parse one sentence. Surrounding whitespace, including `\r\n`, is ignored.
pub fn parse(text: &str) -> Result<ParsedSentence> {
    let line = text.trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    let body = line
        .strip_prefix('$')
        .ok_or(ParseError::MissingStartMarker)?;

    let data = match body.split_once('*') {
        Some((data, transmitted)) => {
            let expected = parse_checksum(transmitted)?;
            let actual = checksum(data.as_bytes());
            if expected != actual {
                return Err(ParseError::ChecksumMismatch { expected, actual });
            }
            data
        }
        None => body,
    };

    let mut parts = data.split(',');
    let address = parts.next().unwrap_or_default();
    if address.len() < 3 || !address.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(ParseError::MalformedAddress(address.to_string()));
    }

    let (talker, code, proprietary) = match address.strip_prefix('P') {
        Some(rest) => ("", rest, true),
        None => (&address[..2], &address[2..], false),
    };

    let sentence_type = SentenceType::from_code(code)
        .filter(|ty| ty.is_proprietary() == proprietary)
        .ok_or_else(|| ParseError::UnknownType(address.to_string()))?;

    Ok(ParsedSentence {
        talker: talker.to_string(),
        sentence_type,
        fields: parts.map(str::to_string).collect(),
    })
}

fn parse_checksum(field: &str) -> Result<u8> {
    if field.len() != 2 || !field.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ParseError::InvalidChecksum(field.to_string()));
    }
    u8::from_str_radix(field, 16).map_err(|_| ParseError::InvalidChecksum(field.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";

    #[test]
    fn parses_gga_with_checksum() {
        let sentence = parse(GGA).unwrap();

        assert_eq!(sentence.talker(), "GP");
        assert_eq!(sentence.sentence_type(), SentenceType::Gga);
        assert_eq!(sentence.fields().len(), 14);
        assert_eq!(sentence.field("timestamp"), Some("123519"));
        assert_eq!(sentence.field("lat"), Some("4807.038"));
        assert_eq!(sentence.field("lon_dir"), Some("E"));
        assert_eq!(sentence.field("age_gps_data"), Some(""));
        assert_eq!(sentence.field("ref_station_id"), Some(""));
        assert_eq!(sentence.field("no_such_field"), None);
    }

    #[test]
    fn checksum_is_optional() {
        let sentence = parse("$GNGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,").unwrap();
        assert_eq!(sentence.talker(), "GN");
        assert_eq!(sentence.field("num_sats"), Some("08"));
    }

    #[test]
    fn checksum_accepts_lowercase_hex() {
        let body = "GPTXT,01,01,02,hello";
        let line = format!("${body}*{:02x}", checksum(body.as_bytes()));
        assert!(parse(&line).is_ok());
    }

    #[test]
    fn rejects_bad_checksum() {
        let bad = GGA.replace("*47", "*48");
        assert_eq!(
            parse(&bad).unwrap_err(),
            ParseError::ChecksumMismatch {
                expected: 0x48,
                actual: 0x47
            }
        );
    }

    #[test]
    fn rejects_malformed_checksum() {
        assert!(matches!(
            parse("$GPTXT,hi*4G"),
            Err(ParseError::InvalidChecksum(_))
        ));
        assert!(matches!(
            parse("$GPTXT,hi*4"),
            Err(ParseError::InvalidChecksum(_))
        ));
    }

    #[test]
    fn rejects_unknown_type() {
        assert_eq!(
            parse("$GPXYZ,1,2,3").unwrap_err(),
            ParseError::UnknownType("GPXYZ".into())
        );
        assert_eq!(
            parse("$PSRFXX,1").unwrap_err(),
            ParseError::UnknownType("PSRFXX".into())
        );
    }

    #[test]
    fn proprietary_codes_need_proprietary_address() {
        assert!(matches!(
            parse("$GPGRME,1,M"),
            Err(ParseError::UnknownType(_))
        ));
    }

    #[test]
    fn rejects_missing_start_marker_and_empty_input() {
        assert_eq!(parse("GPGGA,1").unwrap_err(), ParseError::MissingStartMarker);
        assert_eq!(parse(" \r\n").unwrap_err(), ParseError::Empty);
    }

    #[test]
    fn rejects_malformed_address() {
        assert!(matches!(parse("$G,1"), Err(ParseError::MalformedAddress(_))));
        assert!(matches!(parse("$GP-GA,1"), Err(ParseError::MalformedAddress(_))));
        assert!(matches!(parse("$"), Err(ParseError::MalformedAddress(_))));
    }

    #[test]
    fn parses_proprietary_garmin_sentences() {
        let grme = parse("$PGRME,15.0,M,45.0,M,25.0,M*1C").unwrap();
        assert_eq!(grme.talker(), "");
        assert_eq!(grme.sentence_type(), SentenceType::Grme);
        assert_eq!(grme.field("hpe"), Some("15.0"));
        assert_eq!(grme.field("osepe"), Some("25.0"));

        let grmv = parse("$PGRMV,1.5,-0.2,0.1").unwrap();
        assert_eq!(grmv.sentence_type(), SentenceType::Grmv);
        assert_eq!(grmv.field("vnorth"), Some("-0.2"));
    }

    #[test]
    fn short_sentence_fields_are_absent() {
        let rmc = parse("$GPRMC,081836,A").unwrap();
        assert_eq!(rmc.field("status"), Some("A"));
        assert_eq!(rmc.field("mode"), None);
    }

    #[test]
    fn type_codes_round_trip_through_display() {
        assert_eq!(SentenceType::Grmv.to_string(), "GRMV");
        assert_eq!(SentenceType::from_code("ZDA"), Some(SentenceType::Zda));
        assert_eq!(SentenceType::from_code("zda"), None);
    }
}
