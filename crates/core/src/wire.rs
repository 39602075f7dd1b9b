use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// How response records are encoded on the wire. Passed explicitly to the
/// writer; nothing process-wide is touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputEncoding {
    /// Non-ASCII characters written verbatim.
    #[default]
    Utf8,
    /// Every non-ASCII character escaped as `\uXXXX`.
    Ascii,
}

impl OutputEncoding {
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.trim().to_lowercase().replace('-', "").as_str() {
            "utf8" => Ok(Self::Utf8),
            "ascii" => Ok(Self::Ascii),
            other => Err(CoreError::InvalidConfig(format!(
                "unknown output encoding `{}`",
                other
            ))),
        }
    }
}

/// Parses one inbound line into a record.
pub fn decode_record<T: DeserializeOwned>(line: &str) -> Result<T, CoreError> {
    Ok(serde_json::from_str(line.trim())?)
}

/// Serializes a record as a single line without the trailing newline.
pub fn encode_record<T: Serialize>(
    record: &T,
    encoding: OutputEncoding,
) -> Result<String, CoreError> {
    let json = serde_json::to_string(record)?;
    Ok(match encoding {
        OutputEncoding::Utf8 => json,
        OutputEncoding::Ascii => escape_non_ascii(&json),
    })
}

/// Non-ASCII characters can only occur inside JSON string literals, so
/// escaping them over the whole document keeps it valid.
fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut units = [0_u16; 2];
    for ch in json.chars() {
        if ch.is_ascii() {
            out.push(ch);
            continue;
        }
        for unit in ch.encode_utf16(&mut units) {
            out.push_str(&format!("\\u{:04x}", unit));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchRequest, MatchResult, MatchSource};

    fn native_result() -> MatchResult {
        MatchResult {
            label: "WhatsApp".to_string(),
            source: MatchSource::Direct,
            corrected_native: "വാട്‌സാപ്പ്".to_string(),
            score: Some(1.0),
            error: None,
        }
    }

    #[test]
    fn utf8_keeps_native_script() {
        let line = encode_record(&native_result(), OutputEncoding::Utf8).unwrap();
        assert!(line.contains("വാട്‌സാപ്പ്"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn ascii_escapes_and_round_trips() {
        let line = encode_record(&native_result(), OutputEncoding::Ascii).unwrap();
        assert!(line.is_ascii());
        assert!(line.contains("\\u0d35"));

        let back: MatchResult = decode_record(&line).unwrap();
        assert_eq!(back, native_result());
    }

    #[test]
    fn escapes_astral_characters_as_surrogate_pairs() {
        assert_eq!(escape_non_ascii("\"😀\""), "\"\\ud83d\\ude00\"");
    }

    #[test]
    fn decode_reports_malformed_lines() {
        let err = decode_record::<MatchRequest>("{not json");
        assert!(matches!(err, Err(CoreError::MalformedRecord(_))));

        let err = decode_record::<MatchRequest>(r#"{"options": "GPay"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn parses_encoding_names() {
        assert_eq!(OutputEncoding::parse("UTF-8").unwrap(), OutputEncoding::Utf8);
        assert_eq!(OutputEncoding::parse("ascii").unwrap(), OutputEncoding::Ascii);
        assert!(OutputEncoding::parse("latin1").is_err());
    }
}
