//! Decoding of raw page titles from SQL dumps into display form.
//!
//! Titles in the dumps use underscores for spaces and carry MySQL string
//! escapes, including `\xNN` byte escapes that splice into multi-byte UTF-8
//! sequences. Decoding therefore works on bytes and validates UTF-8 once at
//! the end.

/// Decode a raw dump title: underscores become spaces, backslash escapes are
/// resolved. Returns `None` for malformed escapes or invalid UTF-8; callers
/// count and skip such pages.
pub fn decode_title(raw: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(raw.len());
    let mut chars = raw.chars();
    let mut utf8_buf = [0u8; 4];

    while let Some(c) = chars.next() {
        if c == '_' {
            bytes.push(b' ');
        } else if c != '\\' {
            bytes.extend_from_slice(c.encode_utf8(&mut utf8_buf).as_bytes());
        } else {
            match chars.next()? {
                'b' => bytes.push(8),
                'f' => bytes.push(12),
                'n' => bytes.push(b'\n'),
                'r' => bytes.push(b'\r'),
                't' => bytes.push(b'\t'),
                '\\' => bytes.push(b'\\'),
                '\'' => bytes.push(b'\''),
                '"' => bytes.push(b'"'),
                'x' => {
                    let hi = chars.next()?;
                    let lo = chars.next()?;
                    let mut hex = String::with_capacity(2);
                    hex.push(hi);
                    hex.push(lo);
                    bytes.push(u8::from_str_radix(&hex, 16).ok()?);
                }
                _ => return None,
            }
        }
    }

    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underscores_become_spaces() {
        assert_eq!(
            decode_title("Rust_(programming_language)").as_deref(),
            Some("Rust (programming language)")
        );
    }

    #[test]
    fn plain_title_unchanged() {
        assert_eq!(decode_title("Rust").as_deref(), Some("Rust"));
    }

    #[test]
    fn simple_escapes() {
        assert_eq!(decode_title(r#"O\'Brien"#).as_deref(), Some("O'Brien"));
        assert_eq!(decode_title(r#"a\"b"#).as_deref(), Some("a\"b"));
        assert_eq!(decode_title(r"back\\slash").as_deref(), Some(r"back\slash"));
    }

    #[test]
    fn hex_escapes_form_utf8() {
        // "Łódź" spelled out as UTF-8 byte escapes
        assert_eq!(
            decode_title(r"\xc5\x81\xc3\xb3d\xc5\xba").as_deref(),
            Some("Łódź")
        );
    }

    #[test]
    fn mixed_literal_and_hex() {
        assert_eq!(
            decode_title(r"Caf\xc3\xa9_au_lait").as_deref(),
            Some("Café au lait")
        );
    }

    #[test]
    fn invalid_utf8_rejected() {
        assert_eq!(decode_title(r"\xff\xfe"), None);
    }

    #[test]
    fn truncated_escape_rejected() {
        assert_eq!(decode_title(r"abc\"), None);
        assert_eq!(decode_title(r"abc\x4"), None);
    }

    #[test]
    fn unknown_escape_rejected() {
        assert_eq!(decode_title(r"abc\q"), None);
    }

    #[test]
    fn non_hex_digits_rejected() {
        assert_eq!(decode_title(r"\xzz"), None);
    }

    #[test]
    fn empty_title() {
        assert_eq!(decode_title("").as_deref(), Some(""));
    }
}
