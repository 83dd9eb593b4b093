//! `Encapsulated` header parsing.
//!
//! The header lists where each embedded part starts, relative to the first
//! byte after the ICAP header block:
//!
//! ```text
//! Encapsulated: req-hdr=0, req-body=412
//! ```

use std::collections::HashMap;

use crate::{split_lines, starts_with_ignore_case};

const HEADER_NAME: &[u8] = b"encapsulated:";

/// Encapsulated part carrying the HTTP request header.
pub const REQ_HDR: &str = "req-hdr";
/// Encapsulated part carrying the HTTP request body.
pub const REQ_BODY: &str = "req-body";
/// Marker for a message without a body.
pub const NULL_BODY: &str = "null-body";

/// Offset table decoded from the `Encapsulated` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncapsulatedOffsets {
    offsets: HashMap<String, usize>,
}

impl EncapsulatedOffsets {
    /// Parses every `Encapsulated:` line of an ICAP header block.
    ///
    /// The block excludes the terminating blank line. Later entries overwrite
    /// earlier ones with the same name.
    pub fn parse(icap_header: &[u8]) -> Self {
        let mut table = Self::default();

        for line in split_lines(icap_header) {
            if starts_with_ignore_case(line, HEADER_NAME) {
                let value = String::from_utf8_lossy(&line[HEADER_NAME.len()..]);
                table.extend_from_value(&value);
            }
        }

        table
    }

    fn extend_from_value(&mut self, value: &str) {
        for entry in value.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }

            let (name, offset) = match entry.split_once('=') {
                Some((name, offset)) => (name.trim(), parse_offset(name.trim(), offset.trim())),
                None => (entry, 0),
            };
            self.offsets.insert(name.to_string(), offset);
        }
    }

    /// Returns the offset recorded for `name`.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.offsets.get(name).copied()
    }

    /// Returns true if `name` was listed.
    pub fn contains(&self, name: &str) -> bool {
        self.offsets.contains_key(name)
    }

    pub fn has_null_body(&self) -> bool {
        self.contains(NULL_BODY)
    }

    pub fn req_hdr(&self) -> Option<usize> {
        self.get(REQ_HDR)
    }

    pub fn req_body(&self) -> Option<usize> {
        self.get(REQ_BODY)
    }

    /// Number of distinct parts listed.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

fn parse_offset(name: &str, raw: &str) -> usize {
    raw.parse().unwrap_or_else(|_| {
        tracing::debug!("Malformed {} offset {:?}, using 0", name, raw);
        0
    })
}
