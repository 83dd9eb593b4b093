//! Audit log entry rendering.

use chrono::{DateTime, Local};
use icapture_core::{ExtractedContent, FormFields};

use crate::error::Result;
use crate::json_text::to_indented_json;

/// Timestamp format used in the entry header.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Rule framing every entry.
pub const SEPARATOR: &str = "=====================================";

/// How the payload section of an entry is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadLayout {
    /// Indented JSON document.
    Json,
    /// `key | value` table.
    Form,
}

/// One audit log record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// When the payload was extracted.
    pub timestamp: DateTime<Local>,
    /// The submitting page, taken from the `Referer` header.
    pub target_url: String,
    /// Pre-formatted payload text.
    pub payload: String,
    /// Layout of `payload`.
    pub layout: PayloadLayout,
}

impl LogEntry {
    /// Builds an entry stamped with the current local time.
    ///
    /// Returns `None` for rejected content.
    pub fn from_content(target_url: &str, content: &ExtractedContent) -> Result<Option<Self>> {
        let (payload, layout) = match content {
            ExtractedContent::JsonObject(object) => {
                (to_indented_json(object)?, PayloadLayout::Json)
            }
            ExtractedContent::FormFields(fields) => (format_form(fields), PayloadLayout::Form),
            ExtractedContent::Rejected => return Ok(None),
        };

        Ok(Some(Self {
            timestamp: Local::now(),
            target_url: target_url.to_string(),
            payload,
            layout,
        }))
    }

    /// Replaces the timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Renders the block appended to the log, including its trailing blank line.
    pub fn render(&self) -> String {
        let timestamp = self.timestamp.format(TIMESTAMP_FORMAT);
        match self.layout {
            PayloadLayout::Json => format!(
                "[{}]\n{}\n1. TargetURL: {}\n2. Payload\n{}\n{}\n\n",
                timestamp, SEPARATOR, self.target_url, self.payload, SEPARATOR
            ),
            PayloadLayout::Form => format!(
                "[{}]\n{}\n1. TargetURL: {}\n\n2. Payload\n{}{}\n\n",
                timestamp, SEPARATOR, self.target_url, self.payload, SEPARATOR
            ),
        }
    }
}

/// Formats form fields as `key | v1, v2` lines, keys padded to the widest one.
fn format_form(fields: &FormFields) -> String {
    let width = fields
        .keys()
        .map(|key| key.chars().count())
        .max()
        .unwrap_or(0);

    fields
        .iter()
        .map(|(key, values)| format!("{:<width$} | {}\n", key, values.join(", "), width = width))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 17, 9, 30, 5).unwrap()
    }

    #[test]
    fn json_entry_layout() {
        let content =
            ExtractedContent::classify("application/json", br#"{"password":"abc123"}"#).unwrap();
        let entry = LogEntry::from_content("https://site/login", &content)
            .unwrap()
            .unwrap()
            .with_timestamp(fixed_time());

        assert_eq!(
            entry.render(),
            "[2024-05-17 09:30:05]\n\
=====================================\n\
1. TargetURL: https://site/login\n\
2. Payload\n\
{\n  \"password\": \"abc123\"\n}\n\
=====================================\n\n"
        );
    }

    #[test]
    fn form_entry_layout() {
        let content = ExtractedContent::classify(
            "application/x-www-form-urlencoded",
            b"pw=x&username=a&username=b",
        )
        .unwrap();
        let entry = LogEntry::from_content("https://site/other", &content)
            .unwrap()
            .unwrap()
            .with_timestamp(fixed_time());

        assert_eq!(
            entry.render(),
            "[2024-05-17 09:30:05]\n\
=====================================\n\
1. TargetURL: https://site/other\n\n\
2. Payload\n\
pw       | x\n\
username | a, b\n\
=====================================\n\n"
        );
    }

    #[test]
    fn json_keys_are_sorted() {
        let content =
            ExtractedContent::classify("application/json", br#"{"b":1,"a":2}"#).unwrap();
        let entry = LogEntry::from_content("u", &content).unwrap().unwrap();
        assert!(entry.payload.find("\"a\"").unwrap() < entry.payload.find("\"b\"").unwrap());
    }

    #[test]
    fn json_payload_escapes_markup_and_normalizes_numbers() {
        let content = ExtractedContent::classify(
            "application/json",
            br#"{"comment":"<b>&","remember":1.0,"token":0.0000001}"#,
        )
        .unwrap();
        let entry = LogEntry::from_content("u", &content).unwrap().unwrap();
        assert_eq!(
            entry.payload,
            "{\n  \"comment\": \"\\u003cb\\u003e\\u0026\",\n  \"remember\": 1,\n  \"token\": 1e-7\n}"
        );
    }

    #[test]
    fn rejected_content_has_no_entry() {
        let entry = LogEntry::from_content("u", &ExtractedContent::Rejected).unwrap();
        assert!(entry.is_none());
    }
}
