//! Chunked body de-framing.
//!
//! Only the first chunk-size line and the terminal `0\r\n\r\n` chunk are
//! removed. A body sent as several chunks keeps its interior size lines in
//! the returned payload.

use crate::{find_subslice, CRLF};

/// Terminal chunk of a chunked body.
pub const LAST_CHUNK: &[u8] = b"0\r\n\r\n";

/// Returns the payload between the first CRLF and the terminal chunk.
///
/// The payload starts *at* the first CRLF, so it carries a leading line
/// break that classifiers trim away. Returns `None` when the terminal chunk
/// has not been received.
pub fn extract_chunk_payload(body: &[u8]) -> Option<&[u8]> {
    let end = find_subslice(body, LAST_CHUNK)?;
    let start = find_subslice(body, CRLF).unwrap_or(0);

    if start > end {
        return Some(&[]);
    }
    Some(&body[start..end])
}

/// Returns true once the terminal chunk is present.
pub fn has_last_chunk(body: &[u8]) -> bool {
    find_subslice(body, LAST_CHUNK).is_some()
}
