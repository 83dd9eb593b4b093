//! Best-effort JSON object extraction.
//!
//! Bodies labelled JSON or plain text may wrap the object in noise, or be cut
//! short. The scanner counts braces without understanding strings, so a `}`
//! inside a string value still closes a level.

use serde_json::{Map, Value};

use crate::error::{ExtractError, Result};

/// Locates the first balanced `{ ... }` region in `text`.
///
/// An opened region that never closes extends to the end of `text`. Returns
/// `None` if `text` contains no `{` at depth zero.
pub fn find_json_object(text: &[u8]) -> Option<&[u8]> {
    let mut start = None;
    let mut end = None;
    let mut depth: isize = 0;

    for (index, &byte) in text.iter().enumerate() {
        match byte {
            b'{' if depth == 0 => {
                start = Some(index);
                depth = 1;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 && start.is_some() {
                    end = Some(index + 1);
                    break;
                }
            }
            _ => {}
        }
    }

    let start = start?;
    Some(&text[start..end.unwrap_or(text.len())])
}

/// Trims `payload`, finds its JSON object region, and parses it.
pub fn parse_json_object(payload: &[u8]) -> Result<Map<String, Value>> {
    let region = find_json_object(payload.trim_ascii()).ok_or(ExtractError::NoJsonObject)?;
    Ok(serde_json::from_slice(region)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_object_surrounded_by_noise() {
        assert_eq!(
            find_json_object(b"xx {\"a\":{\"b\":1}} yy {\"c\":2}"),
            Some(&b"{\"a\":{\"b\":1}}"[..])
        );
    }

    #[test]
    fn unclosed_object_runs_to_end() {
        assert_eq!(find_json_object(b"{\"a\":{\"b\":1}"), Some(&b"{\"a\":{\"b\":1}"[..]));
    }

    #[test]
    fn no_opening_brace() {
        assert_eq!(find_json_object(b"password=abc"), None);
        assert_eq!(find_json_object(b""), None);
    }

    #[test]
    fn leading_closing_brace_is_counted() {
        // The stray `}` drops the depth below zero, so the first `{` only
        // brings it back to zero and the second one opens the region.
        assert_eq!(find_json_object(b"}{{\"a\":1}}"), Some(&b"{\"a\":1}"[..]));
    }

    #[test]
    fn parses_nested_values() {
        let map = parse_json_object(b"  {\"user\":{\"email\":\"a@b\"},\"n\":[1,2]}  ").unwrap();
        assert_eq!(map["user"]["email"], "a@b");
        assert_eq!(map["n"][1], 2);
    }

    #[test]
    fn truncated_object_is_an_error_not_a_panic() {
        let err = parse_json_object(b"{\"password\":\"abc").unwrap_err();
        assert!(matches!(err, ExtractError::Json(_)));
    }

    #[test]
    fn brace_inside_string_closes_early() {
        let err = parse_json_object(b"{\"a\":\"}\"}").unwrap_err();
        assert!(matches!(err, ExtractError::Json(_)));
    }
}
