//! Scan identifier normalization
//!
//! Both input modalities end up as one string: an NFC tag UID becomes
//! upper-case hex bytes joined by colons (`04:A1:B2:C3`), a QR payload is used
//! as decoded, minus surrounding whitespace.

use plamo_common::{Error, Result};

/// Format an NFC tag UID as `04:A1:B2:C3`
pub fn from_nfc_uid(uid: &[u8]) -> String {
    uid.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Parse a UID given as hex text
///
/// Accepts `04a1b2c3`, `04:A1:B2:C3`, `04-a1-b2-c3` and `04 A1 B2 C3`.
pub fn parse_hex_uid(text: &str) -> Result<Vec<u8>> {
    let digits: String = text
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | ' '))
        .collect();

    if digits.is_empty() {
        return Err(Error::InvalidInput("empty NFC UID".to_string()));
    }
    if digits.len() % 2 != 0 {
        return Err(Error::InvalidInput(format!(
            "NFC UID has an odd number of hex digits: {}",
            text
        )));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| Error::InvalidInput(format!("invalid hex in NFC UID: {}", text)))
        })
        .collect()
}

/// Normalize a decoded QR payload (or any typed identifier)
///
/// Returns None for blank input.
pub fn normalize_payload(payload: &str) -> Option<String> {
    let trimmed = payload.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_nfc_uid() {
        assert_eq!(from_nfc_uid(&[0x04, 0xa1, 0xb2, 0xc3]), "04:A1:B2:C3");
        assert_eq!(from_nfc_uid(&[0x00]), "00");
        assert_eq!(from_nfc_uid(&[]), "");
    }

    #[test]
    fn test_parse_hex_uid_formats() {
        let expected = vec![0x04, 0xa1, 0xb2, 0xc3];
        assert_eq!(parse_hex_uid("04a1b2c3").unwrap(), expected);
        assert_eq!(parse_hex_uid("04:A1:B2:C3").unwrap(), expected);
        assert_eq!(parse_hex_uid("04-a1-b2-c3").unwrap(), expected);
        assert_eq!(parse_hex_uid("04 A1 B2 C3").unwrap(), expected);
    }

    #[test]
    fn test_parse_hex_uid_rejects_bad_input() {
        assert!(parse_hex_uid("").is_err());
        assert!(parse_hex_uid("::").is_err());
        assert!(parse_hex_uid("04a").is_err());
        assert!(parse_hex_uid("zz11").is_err());
        assert!(parse_hex_uid("é1").is_err());
    }

    #[test]
    fn test_normalize_payload() {
        assert_eq!(normalize_payload("  BOXID1\n"), Some("BOXID1".to_string()));
        assert_eq!(normalize_payload("   "), None);
        assert_eq!(
            normalize_payload("https://example.com/a b"),
            Some("https://example.com/a b".to_string())
        );
    }
}
