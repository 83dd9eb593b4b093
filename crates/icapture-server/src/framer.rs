//! Message framing over a growing connection buffer.
//!
//! A [`Framer`] is fed the connection buffer after every read. The buffer
//! only ever grows, so header positions found on one call stay valid and
//! later calls resume their searches where the previous one stopped.

use icapture_core::body::{has_last_chunk, LAST_CHUNK};
use icapture_core::{find_subslice, starts_with_ignore_case, EncapsulatedOffsets, HttpHeaders, HEADER_DELIMITER};

use crate::error::{Result, ServerError};
use crate::response::IcapResponse;

/// Where the parts of a complete REQMOD message sit in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyLocation {
    /// Start of the embedded HTTP header block.
    pub http_header_start: usize,
    /// End of the HTTP header block, excluding its blank line.
    pub http_header_end: usize,
    /// Start of the chunked request body.
    pub body_start: usize,
}

impl BodyLocation {
    /// Parses the embedded HTTP headers.
    ///
    /// `Content-Type` and `Referer` are scanned through the end of `buf`.
    pub fn headers(&self, buf: &[u8]) -> HttpHeaders {
        let from_start = buf.get(self.http_header_start..).unwrap_or(&[]);
        let block = buf
            .get(self.http_header_start..self.http_header_end)
            .unwrap_or(&[]);
        HttpHeaders::parse(block, from_start)
    }
}

/// What the connection should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The message is incomplete; read again.
    NeedMore,
    /// Send a reply without looking at the body.
    Reply(IcapResponse),
    /// The message satisfies `Content-Length` but the terminal chunk has not
    /// been seen. Reading on is worthwhile; giving up must still extract.
    AwaitLastChunk,
    /// Run payload extraction, then reply `204`.
    Extract(BodyLocation),
}

/// Incremental framing state for one connection.
#[derive(Debug, Default)]
pub struct Framer {
    icap_header_end: Option<usize>,
    offsets: EncapsulatedOffsets,
    http_header_end: Option<usize>,
    declared_length: usize,
    /// Resume point for the current delimiter search.
    search_from: usize,
    /// Resume point for the terminal chunk search.
    last_chunk_from: usize,
}

impl Framer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides the next step for everything received so far.
    ///
    /// `buf` must be the same buffer on every call, only ever appended to.
    /// `eof` is true once the peer stopped sending or the connection gave up
    /// waiting; an extractable message is then extracted as it stands.
    pub fn advance(&mut self, buf: &[u8], eof: bool) -> Result<Step> {
        let icap_header_end = match self.icap_header_end {
            Some(end) => end,
            None => {
                let Some(end) = resume_find(buf, HEADER_DELIMITER, &mut self.search_from) else {
                    return Ok(Step::NeedMore);
                };
                self.icap_header_end = Some(end);
                self.offsets = EncapsulatedOffsets::parse(&buf[..end]);
                self.search_from = end + HEADER_DELIMITER.len();
                end
            }
        };

        if starts_with_ignore_case(buf, b"OPTIONS ") {
            return Ok(Step::Reply(IcapResponse::Options));
        }

        let http_header_start = icap_header_end + HEADER_DELIMITER.len();
        let http_header_end = match self.http_header_end {
            Some(end) => end,
            None => {
                let Some(end) = resume_find(buf, HEADER_DELIMITER, &mut self.search_from) else {
                    return Ok(Step::NeedMore);
                };
                let location = BodyLocation {
                    http_header_start,
                    http_header_end: end,
                    body_start: end,
                };
                self.declared_length = location.headers(buf).content_length_or_zero();
                self.http_header_end = Some(end);
                end
            }
        };

        if self.offsets.has_null_body() {
            return Ok(Step::Reply(IcapResponse::NoContent));
        }

        let required = (http_header_end + HEADER_DELIMITER.len()).saturating_add(self.declared_length);
        if required > buf.len() {
            return Ok(Step::NeedMore);
        }

        if self.offsets.req_hdr().is_none() {
            return Err(ServerError::MissingReqHdr);
        }

        let body_offset = self.offsets.req_body();
        let is_post = starts_with_ignore_case(&buf[http_header_start..], b"POST ");
        let Some(body_offset) = body_offset.filter(|_| is_post) else {
            return Ok(Step::Reply(IcapResponse::NoContent));
        };
        let body_start = http_header_start.saturating_add(body_offset);

        if !eof && body_start <= buf.len() {
            let from = self.last_chunk_from.max(body_start);
            if !has_last_chunk(&buf[from..]) {
                self.last_chunk_from = buf.len().saturating_sub(LAST_CHUNK.len() - 1).max(body_start);
                return Ok(Step::AwaitLastChunk);
            }
        }

        Ok(Step::Extract(BodyLocation {
            http_header_start,
            http_header_end,
            body_start,
        }))
    }
}

/// Finds `needle` in `buf` starting at `*from`, advancing `*from` past the
/// bytes that can no longer start a match.
fn resume_find(buf: &[u8], needle: &[u8], from: &mut usize) -> Option<usize> {
    let start = (*from).min(buf.len());
    match find_subslice(&buf[start..], needle) {
        Some(pos) => Some(start + pos),
        None => {
            *from = buf.len().saturating_sub(needle.len() - 1).max(start);
            None
        }
    }
}
