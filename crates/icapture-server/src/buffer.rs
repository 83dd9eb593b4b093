//! Per-connection byte accumulator.

use crate::error::{Result, ServerError};

/// Append-only buffer holding everything a connection has sent so far.
///
/// Offsets handed out by the framer are relative to the first byte, so the
/// buffer is never trimmed while a message is being parsed.
#[derive(Debug)]
pub struct ConnectionBuffer {
    data: Vec<u8>,
    limit: usize,
}

impl ConnectionBuffer {
    /// Creates an empty buffer that refuses to grow past `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            data: Vec::new(),
            limit,
        }
    }

    /// Appends a received chunk.
    pub fn append(&mut self, chunk: &[u8]) -> Result<()> {
        if self.data.len() + chunk.len() > self.limit {
            return Err(ServerError::BufferLimit { limit: self.limit });
        }
        self.data.extend_from_slice(chunk);
        Ok(())
    }

    /// Consumes the buffer, returning the received bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_in_order() {
        let mut buffer = ConnectionBuffer::with_limit(64);
        buffer.append(b"REQMOD ").unwrap();
        buffer.append(b"icap://x").unwrap();
        assert_eq!(buffer.as_slice(), b"REQMOD icap://x");
        assert_eq!(buffer.len(), 15);
    }

    #[test]
    fn refuses_to_exceed_limit() {
        let mut buffer = ConnectionBuffer::with_limit(8);
        buffer.append(b"12345678").unwrap();
        let err = buffer.append(b"9").unwrap_err();
        assert!(matches!(err, ServerError::BufferLimit { limit: 8 }));
        assert_eq!(buffer.len(), 8);
    }
}
