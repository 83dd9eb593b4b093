//! Content classification by declared MIME type.
//!
//! The `Content-Type` header is matched by substring, so
//! `application/json; charset=utf-8` and `text/plain;charset=UTF-8` dispatch
//! the same way as the bare types. Anything else is rejected without being
//! looked at.

mod form;
mod json;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

pub use form::parse_form;
pub use json::{find_json_object, parse_json_object};

/// Decoded form fields; a key maps to every value it was sent with.
pub type FormFields = BTreeMap<String, Vec<String>>;

/// Payload shapes the classifier understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// `application/json`.
    Json,
    /// `text/plain`, scanned for an embedded JSON object.
    PlainText,
    /// `application/x-www-form-urlencoded`.
    Form,
}

impl ContentKind {
    /// Maps a `Content-Type` value to a payload shape.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        if content_type.contains("application/json") {
            Some(Self::Json)
        } else if content_type.contains("text/plain") {
            Some(Self::PlainText)
        } else if content_type.contains("application/x-www-form-urlencoded") {
            Some(Self::Form)
        } else {
            None
        }
    }

    /// Returns a short name for log output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::PlainText => "text",
            Self::Form => "form",
        }
    }

    /// Parses a de-framed payload as this shape.
    pub fn parse(&self, payload: &[u8]) -> Result<ExtractedContent> {
        match self {
            Self::Json | Self::PlainText => parse_json_object(payload).map(ExtractedContent::JsonObject),
            Self::Form => parse_form(payload).map(ExtractedContent::FormFields),
        }
    }
}

/// Structured form of an intercepted request body.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedContent {
    /// A JSON object found in a JSON or plain-text body.
    JsonObject(Map<String, Value>),
    /// URL-encoded form fields.
    FormFields(FormFields),
    /// The content type is not one the classifier handles.
    Rejected,
}

impl ExtractedContent {
    /// Classifies `payload` according to `content_type`.
    ///
    /// Unknown content types yield [`ExtractedContent::Rejected`]; parse
    /// failures for known types are returned as errors.
    pub fn classify(content_type: &str, payload: &[u8]) -> Result<Self> {
        match ContentKind::from_content_type(content_type) {
            Some(kind) => kind.parse(payload),
            None => Ok(Self::Rejected),
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;

    #[test]
    fn dispatch_matches_by_substring() {
        assert_eq!(
            ContentKind::from_content_type("application/json; charset=utf-8"),
            Some(ContentKind::Json)
        );
        assert_eq!(
            ContentKind::from_content_type("text/plain;charset=UTF-8"),
            Some(ContentKind::PlainText)
        );
        assert_eq!(
            ContentKind::from_content_type("application/x-www-form-urlencoded"),
            Some(ContentKind::Form)
        );
        assert_eq!(ContentKind::from_content_type("multipart/form-data; boundary=x"), None);
    }

    #[test]
    fn dispatch_is_case_sensitive() {
        assert_eq!(ContentKind::from_content_type("Application/JSON"), None);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let content = ExtractedContent::classify("image/png", b"\x89PNG").unwrap();
        assert!(content.is_rejected());
    }

    #[test]
    fn json_body_becomes_object() {
        let content =
            ExtractedContent::classify("application/json", b"\r\n{\"password\":\"abc123\"}\r\n")
                .unwrap();
        match content {
            ExtractedContent::JsonObject(map) => {
                assert_eq!(map.get("password"), Some(&Value::from("abc123")));
            }
            other => panic!("expected json object, got {:?}", other),
        }
    }

    #[test]
    fn plain_text_uses_json_path() {
        let content =
            ExtractedContent::classify("text/plain", b"prefix {\"email\":\"a@b\"} suffix").unwrap();
        assert!(matches!(content, ExtractedContent::JsonObject(_)));
    }

    #[test]
    fn plain_text_without_object_fails() {
        let err = ExtractedContent::classify("text/plain", b"email=a@b").unwrap_err();
        assert!(matches!(err, ExtractError::NoJsonObject));
    }

    #[test]
    fn form_body_becomes_fields() {
        let content = ExtractedContent::classify(
            "application/x-www-form-urlencoded",
            b"\r\npassword=bar&user=a&user=b\r\n",
        )
        .unwrap();
        match content {
            ExtractedContent::FormFields(fields) => {
                assert_eq!(fields["password"], vec!["bar"]);
                assert_eq!(fields["user"], vec!["a", "b"]);
            }
            other => panic!("expected form fields, got {:?}", other),
        }
    }
}
