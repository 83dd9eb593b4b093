//! Embedded HTTP header extraction.
//!
//! Only three headers matter to the responder. `Content-Length` is read from
//! the HTTP header block proper; `Content-Type` and `Referer` are read by
//! scanning from the start of the HTTP header through the rest of the
//! buffer, so a body line shaped like `referer: ...` can shadow the real
//! header. That scan is kept unbounded on purpose: bounding it would change
//! which URL ends up in the audit log.

use crate::{split_lines, starts_with_ignore_case};

const CONTENT_LENGTH: &[u8] = b"content-length:";
const CONTENT_TYPE: &[u8] = b"content-type:";
const REFERER: &[u8] = b"referer:";

/// The embedded HTTP headers the responder cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpHeaders {
    /// Declared body length. Malformed values read as `0`.
    pub content_length: Option<usize>,
    /// Declared MIME type, verbatim.
    pub content_type: Option<String>,
    /// Page that submitted the request; used as the target URL.
    pub referer: Option<String>,
}

impl HttpHeaders {
    /// Parses the headers.
    ///
    /// `header_block` is the HTTP header block without its terminating blank
    /// line. `from_header_start` starts at the same byte but runs to the end
    /// of the buffer.
    pub fn parse(header_block: &[u8], from_header_start: &[u8]) -> Self {
        let (content_type, referer) = scan_content_headers(from_header_start);
        Self {
            content_length: content_length(header_block),
            content_type,
            referer,
        }
    }

    /// Content length with the framer's default of `0`.
    pub fn content_length_or_zero(&self) -> usize {
        self.content_length.unwrap_or(0)
    }

    /// Target URL, if a non-empty `Referer` was sent.
    pub fn target_url(&self) -> Option<&str> {
        self.referer.as_deref().filter(|url| !url.is_empty())
    }
}

/// Reads `Content-Length` from an HTTP header block.
///
/// Returns `None` when the header is absent and `Some(0)` when its value is
/// not a non-negative integer. The last occurrence wins.
fn content_length(header_block: &[u8]) -> Option<usize> {
    let mut length = None;
    for line in split_lines(header_block) {
        if let Some(value) = header_value(line, CONTENT_LENGTH) {
            length = Some(value.parse().unwrap_or(0));
        }
    }
    length
}

/// Reads `Content-Type` and `Referer`, last occurrence winning.
fn scan_content_headers(from_header_start: &[u8]) -> (Option<String>, Option<String>) {
    let mut content_type = None;
    let mut referer = None;

    for line in split_lines(from_header_start) {
        if let Some(value) = header_value(line, CONTENT_TYPE) {
            content_type = Some(value);
        }
        if let Some(value) = header_value(line, REFERER) {
            referer = Some(value);
        }
    }

    (content_type, referer)
}

/// Returns the trimmed value of `line` if it starts with `name` (which must
/// include the colon), ignoring ASCII case.
fn header_value(line: &[u8], name: &[u8]) -> Option<String> {
    if !starts_with_ignore_case(line, name) {
        return None;
    }
    Some(String::from_utf8_lossy(&line[name.len()..]).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &[u8] = b"POST /login HTTP/1.1\r\n\
Host: site\r\n\
Content-Type: application/json\r\n\
Referer: https://site/login\r\n\
Content-Length: 21";

    #[test]
    fn parses_all_three_headers() {
        let headers = HttpHeaders::parse(HEADER, HEADER);
        assert_eq!(headers.content_length, Some(21));
        assert_eq!(headers.content_type.as_deref(), Some("application/json"));
        assert_eq!(headers.target_url(), Some("https://site/login"));
    }

    #[test]
    fn header_names_ignore_case() {
        let block = b"POST / HTTP/1.1\r\ncontent-LENGTH: 7\r\nREFERER: http://a/";
        let headers = HttpHeaders::parse(block, block);
        assert_eq!(headers.content_length, Some(7));
        assert_eq!(headers.referer.as_deref(), Some("http://a/"));
    }

    #[test]
    fn malformed_content_length_reads_as_zero() {
        assert_eq!(content_length(b"POST / HTTP/1.1\r\nContent-Length: abc"), Some(0));
        assert_eq!(content_length(b"POST / HTTP/1.1\r\nContent-Length: -3"), Some(0));
    }

    #[test]
    fn missing_content_length_defaults_to_zero() {
        let headers = HttpHeaders::parse(b"GET / HTTP/1.1", b"GET / HTTP/1.1");
        assert_eq!(headers.content_length, None);
        assert_eq!(headers.content_length_or_zero(), 0);
    }

    #[test]
    fn last_duplicate_wins() {
        let block = b"POST / HTTP/1.1\r\nContent-Length: 5\r\nContent-Length: 9";
        assert_eq!(content_length(block), Some(9));
    }

    #[test]
    fn content_type_scan_runs_past_header_block() {
        let block = b"POST / HTTP/1.1\r\nContent-Type: text/plain";
        let rest = b"POST / HTTP/1.1\r\nContent-Type: text/plain\r\n\r\n1a\r\nreferer: http://body/\r\n0\r\n\r\n";
        let headers = HttpHeaders::parse(block, rest);
        assert_eq!(headers.referer.as_deref(), Some("http://body/"));
    }

    #[test]
    fn empty_referer_is_not_a_target() {
        let block = b"POST / HTTP/1.1\r\nReferer:   ";
        let headers = HttpHeaders::parse(block, block);
        assert_eq!(headers.referer.as_deref(), Some(""));
        assert_eq!(headers.target_url(), None);
    }
}
