//! icapture Core - ICAP envelope parsing and payload classification.
//!
//! This crate holds the protocol-independent pieces of the responder. Nothing
//! here performs I/O; every function works on byte slices borrowed from a
//! connection buffer.
//!
//! ## Pipeline
//!
//! ```text
//! ICAP header block ──► EncapsulatedOffsets ──► req-hdr / req-body / null-body
//!                                                   │
//! HTTP header block ──► HttpHeaders (Content-Length, Content-Type, Referer)
//!                                                   │
//! req-body range ──► extract_chunk_payload ──► Sensitivity gate
//!                                                   │
//!                                         ContentKind::classify
//!                                                   │
//!                                  JsonObject / FormFields / Rejected
//! ```

pub mod body;
pub mod classifier;
pub mod encapsulated;
pub mod error;
pub mod headers;
pub mod sensitivity;

pub use body::extract_chunk_payload;
pub use classifier::{ContentKind, ExtractedContent, FormFields};
pub use encapsulated::EncapsulatedOffsets;
pub use error::{ExtractError, Result};
pub use headers::HttpHeaders;
pub use sensitivity::{ExtractionDecision, SensitivityHeuristic, Signal};

/// Header/body delimiter shared by ICAP and HTTP.
pub const HEADER_DELIMITER: &[u8] = b"\r\n\r\n";

/// Line terminator.
pub const CRLF: &[u8] = b"\r\n";

/// Returns the index of the first occurrence of `needle` in `haystack`.
pub fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Case-insensitive ASCII prefix check.
pub fn starts_with_ignore_case(bytes: &[u8], prefix: &[u8]) -> bool {
    bytes.len() >= prefix.len() && bytes[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Splits `bytes` on every CRLF, like a line iterator that keeps empty lines.
pub fn split_lines(bytes: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut rest = Some(bytes);
    std::iter::from_fn(move || {
        let current = rest?;
        match find_subslice(current, CRLF) {
            Some(pos) => {
                rest = Some(&current[pos + CRLF.len()..]);
                Some(&current[..pos])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_subslice_locates_first_match() {
        assert_eq!(find_subslice(b"ab\r\n\r\ncd\r\n\r\n", HEADER_DELIMITER), Some(2));
        assert_eq!(find_subslice(b"abc", b"x"), None);
        assert_eq!(find_subslice(b"ab", b"abc"), None);
    }

    #[test]
    fn prefix_match_ignores_case() {
        assert!(starts_with_ignore_case(b"options icap://x", b"OPTIONS "));
        assert!(!starts_with_ignore_case(b"OPT", b"OPTIONS "));
    }

    #[test]
    fn split_lines_keeps_empty_segments() {
        let lines: Vec<&[u8]> = split_lines(b"a\r\n\r\nb").collect();
        assert_eq!(lines, vec![&b"a"[..], &b""[..], &b"b"[..]]);
    }
}
