//! Base64 and ISO 8601 helpers shared by the codecs

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::NaiveDateTime;

/// `YYYYMMDDTHH:MM:SS`, no timezone
pub const DATE_TIME_FORMAT: &str = "%Y%m%dT%H:%M:%S";

/// Line length of wrapped base64 output
pub const BASE64_LINE_LENGTH: usize = 76;

const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub fn format_iso8601(value: &NaiveDateTime) -> String {
    value.format(DATE_TIME_FORMAT).to_string()
}

pub fn parse_iso8601(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), DATE_TIME_FORMAT).ok()
}

/// Base64 without line breaks
pub fn base64_encode(data: &[u8]) -> String {
    BASE64.encode(data)
}

/// Base64 broken into lines of 76 characters separated by CRLF
pub fn base64_encode_wrapped(data: &[u8]) -> String {
    let encoded = BASE64.encode(data);
    if encoded.len() <= BASE64_LINE_LENGTH {
        return encoded;
    }

    let mut wrapped = String::with_capacity(encoded.len() + 2 * (encoded.len() / BASE64_LINE_LENGTH));
    // base64 output is ASCII, so byte chunks are valid str boundaries
    for (i, line) in encoded.as_bytes().chunks(BASE64_LINE_LENGTH).enumerate() {
        if i > 0 {
            wrapped.push_str("\r\n");
        }
        wrapped.extend(line.iter().map(|&b| char::from(b)));
    }
    wrapped
}

/// Decode base64, skipping whitespace and line breaks
pub fn base64_decode(text: &str) -> Option<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    BASE64.decode(compact).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_datetime_format() {
        let dt = NaiveDate::from_ymd_opt(1998, 7, 17)
            .unwrap()
            .and_hms_opt(14, 8, 55)
            .unwrap();
        assert_eq!(format_iso8601(&dt), "19980717T14:08:55");
        assert_eq!(parse_iso8601("19980717T14:08:55"), Some(dt));
        assert_eq!(parse_iso8601(" 19980717T14:08:55\n"), Some(dt));
        assert_eq!(parse_iso8601("1998-07-17T14:08:55"), None);
        assert_eq!(parse_iso8601("19980717T14:08:55Z"), None);
    }

    #[test]
    fn test_base64_short_output_is_not_wrapped() {
        // 57 bytes encode to exactly one full line
        let data = vec![0xA5u8; 57];
        let encoded = base64_encode_wrapped(&data);
        assert_eq!(encoded.len(), BASE64_LINE_LENGTH);
        assert!(!encoded.contains('\r'));
        assert_eq!(base64_encode_wrapped(b""), "");
    }

    #[test]
    fn test_base64_wraps_at_76_columns() {
        let data: Vec<u8> = (0..=255u8).cycle().take(200).collect();
        let encoded = base64_encode_wrapped(&data);

        let lines: Vec<&str> = encoded.split("\r\n").collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[..3].iter().all(|line| line.len() == BASE64_LINE_LENGTH));
        assert!(lines[3].len() <= BASE64_LINE_LENGTH);
        assert_eq!(encoded.matches("\r\n").count(), 3);
        assert!(!encoded.replace("\r\n", "").contains(['\r', '\n']));

        assert_eq!(base64_decode(&encoded), Some(data));
    }

    #[test]
    fn test_base64_first_break_position() {
        let data = vec![7u8; 58];
        let encoded = base64_encode_wrapped(&data);
        assert_eq!(encoded.find("\r\n"), Some(BASE64_LINE_LENGTH));
        assert_eq!(encoded.matches("\r\n").count(), 1);
    }

    #[test]
    fn test_base64_decode_tolerates_missing_padding() {
        assert_eq!(base64_decode("Zm9vYg"), Some(b"foob".to_vec()));
        assert_eq!(base64_decode("Zm9v\r\nYmFy"), Some(b"foobar".to_vec()));
        assert_eq!(base64_decode("!!!"), None);
    }
}
