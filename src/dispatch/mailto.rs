use std::{fmt::Write as _, io};

use crate::dispatch::MailClient;

/// A pre-filled message for the user's mail client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailtoLink {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

impl MailtoLink {
    /// Renders the `mailto:` URI.
    #[must_use]
    pub fn uri(&self) -> String {
        format!(
            "mailto:{}?subject={}&body={}",
            self.to,
            encode_component(&self.subject),
            encode_component(&self.body)
        )
    }
}

/// Percent-encodes a URI component.
///
/// Leaves the same characters unescaped as ECMAScript's
/// `encodeURIComponent`, which is what mail clients expect to decode.
#[must_use]
pub fn encode_component(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(char::from(byte)),
            _ => {
                let _ = write!(encoded, "%{byte:02X}");
            }
        }
    }
    encoded
}

/// Reverses [`encode_component`].
///
/// Malformed escapes are kept literally.
#[must_use]
pub fn decode_component(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(value) = hex.and_then(|hex| u8::from_str_radix(hex, 16).ok()) {
                decoded.push(value);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

/// Opens links with the operating system's default mail handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMailClient;

impl MailClient for SystemMailClient {
    fn open(&self, uri: &str) -> io::Result<()> {
        crate::launch::open_uri(uri)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("Sales Inquiry - Saavi", "Sales%20Inquiry%20-%20Saavi"; "spaces")]
    #[test_case("a@x.com", "a%40x.com"; "at sign")]
    #[test_case("line\nbreak", "line%0Abreak"; "newline")]
    #[test_case("₹25,000+", "%E2%82%B925%2C000%2B"; "multibyte and reserved")]
    #[test_case("Valentine's (Day)!", "Valentine's%20(Day)!"; "unreserved marks")]
    fn encodes_like_encode_uri_component(input: &str, expected: &str) {
        assert_eq!(encode_component(input), expected);
        assert_eq!(decode_component(expected), input);
    }

    #[test]
    fn decode_keeps_malformed_escapes() {
        assert_eq!(decode_component("100%"), "100%");
        assert_eq!(decode_component("%zz"), "%zz");
    }

    #[test]
    fn uri_has_subject_and_body() {
        let link = MailtoLink {
            to: "hello@example.com".to_string(),
            subject: "Hi there".to_string(),
            body: "Line one\nLine two".to_string(),
        };
        assert_eq!(
            link.uri(),
            "mailto:hello@example.com?subject=Hi%20there&body=Line%20one%0ALine%20two"
        );
    }
}
