//! Fixed ICAP replies.

use std::io::ErrorKind;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::Result;

/// Reply to an `OPTIONS` request.
pub const OPTIONS_RESPONSE: &[u8] = b"ICAP/1.0 200 OK\r\n\
Server: Go-ICAP/1.0\r\n\
Methods: REQMOD\r\n\
ISTag: v1-local-1\r\n\
Allow: 204\r\n\
Encapsulated: null-body=0\r\n\r\n";

/// Reply to every other completed message.
pub const NO_CONTENT_RESPONSE: &[u8] = b"ICAP/1.0 204 No Content\r\n\r\n";

/// The two replies the responder ever sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcapResponse {
    /// `200 OK` advertising REQMOD with 204 support.
    Options,
    /// `204 No Content`: forward the request unmodified.
    NoContent,
}

impl IcapResponse {
    /// Wire bytes of the reply.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            Self::Options => OPTIONS_RESPONSE,
            Self::NoContent => NO_CONTENT_RESPONSE,
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Options => 200,
            Self::NoContent => 204,
        }
    }
}

/// Writes `response` in full.
///
/// A broken pipe or reset means the proxy already hung up; that is reported
/// as success. Other write errors are returned.
pub async fn write_response<W>(stream: &mut W, response: IcapResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    match write_all_and_flush(stream, response.as_bytes()).await {
        Ok(()) => Ok(()),
        Err(e) if is_peer_closed(&e) => {
            debug!("Client disconnected during {} response write: {}", response.status(), e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn write_all_and_flush<W>(stream: &mut W, bytes: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    stream.write_all(bytes).await?;
    stream.flush().await
}

fn is_peer_closed(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::BrokenPipe | ErrorKind::ConnectionReset
    )
}
