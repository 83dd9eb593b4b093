//! Strict `application/x-www-form-urlencoded` parsing.
//!
//! Unlike a lenient decoder, a `%` that is not followed by two hex digits or
//! a `;` anywhere in a pair fails the whole payload.

use crate::error::{ExtractError, Result};

use super::FormFields;

/// Parses a trimmed form body into a key → values multimap.
pub fn parse_form(payload: &[u8]) -> Result<FormFields> {
    let text = String::from_utf8_lossy(payload.trim_ascii());
    let mut fields = FormFields::new();

    for pair in text.split('&') {
        if pair.contains(';') {
            return Err(ExtractError::Form(
                "invalid semicolon separator in query".to_string(),
            ));
        }
        if pair.is_empty() {
            continue;
        }

        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = unescape(key)?;
        let value = unescape(value)?;
        fields.entry(key).or_default().push(value);
    }

    Ok(fields)
}

/// Decodes `+` and `%XX` escapes.
fn unescape(s: &str) -> Result<String> {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let escape = bytes.get(i + 1..i + 3).ok_or_else(|| invalid_escape(&s[i..]))?;
                let high = hex_value(escape[0]).ok_or_else(|| invalid_escape(&s[i..]))?;
                let low = hex_value(escape[1]).ok_or_else(|| invalid_escape(&s[i..]))?;
                decoded.push(high << 4 | low);
                i += 3;
            }
            b'+' => {
                decoded.push(b' ');
                i += 1;
            }
            byte => {
                decoded.push(byte);
                i += 1;
            }
        }
    }

    Ok(String::from_utf8_lossy(&decoded).into_owned())
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn invalid_escape(rest: &str) -> ExtractError {
    let escape: String = rest.chars().take(3).collect();
    ExtractError::Form(format!("invalid URL escape {:?}", escape))
}
