//! Per-connection request/response cycle.

use std::sync::Arc;
use std::time::Duration;

use icapture_storage::PayloadSink;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::buffer::ConnectionBuffer;
use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::extraction::PayloadExtractor;
use crate::framer::{Framer, Step};
use crate::response::{write_response, IcapResponse};

/// Read size per syscall.
const READ_CHUNK_SIZE: usize = 4096;

/// Everything a connection task needs, shared across tasks.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    /// Extraction pipeline and sink.
    pub extractor: PayloadExtractor,
    /// Per-connection buffer ceiling.
    pub max_buffer_bytes: usize,
    /// Time allowed between two reads.
    pub idle_timeout: Option<Duration>,
    /// Time allowed for the terminal chunk once the body is otherwise complete.
    pub last_chunk_grace: Duration,
}

impl ConnectionContext {
    /// Creates a context from server configuration.
    pub fn new(config: &ServerConfig, sink: Arc<dyn PayloadSink>) -> Self {
        Self {
            extractor: PayloadExtractor::new(sink),
            max_buffer_bytes: config.max_buffer_bytes,
            idle_timeout: config.idle_timeout(),
            last_chunk_grace: config.last_chunk_grace(),
        }
    }
}

/// Serves exactly one ICAP exchange on `stream`.
///
/// Returns the reply that was sent, or `None` if the peer closed the
/// connection before a complete message arrived.
pub async fn handle_connection<S>(mut stream: S, context: &ConnectionContext) -> Result<Option<IcapResponse>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buffer = ConnectionBuffer::with_limit(context.max_buffer_bytes);
    let mut framer = Framer::new();
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    let mut awaiting_last_chunk = false;

    loop {
        let eof = if awaiting_last_chunk {
            // The message is already answerable; running out of patience
            // counts as end of input.
            match read_chunk(&mut stream, &mut chunk, Some(context.last_chunk_grace)).await {
                Ok(read) => {
                    buffer.append(&chunk[..read])?;
                    read == 0
                }
                Err(ServerError::IdleTimeout(waited)) => {
                    debug!("No terminal chunk after {:?}; extracting the body as received", waited);
                    true
                }
                Err(e) => return Err(e),
            }
        } else {
            let read = read_chunk(&mut stream, &mut chunk, context.idle_timeout).await?;
            buffer.append(&chunk[..read])?;
            read == 0
        };

        let response = match framer.advance(buffer.as_slice(), eof)? {
            Step::NeedMore | Step::AwaitLastChunk if eof => {
                debug!("Peer closed after {} bytes without a complete message", buffer.len());
                return Ok(None);
            }
            Step::NeedMore => continue,
            Step::AwaitLastChunk => {
                awaiting_last_chunk = true;
                continue;
            }
            Step::Reply(response) => response,
            Step::Extract(location) => {
                let extractor = context.extractor.clone();
                let message = buffer.into_inner();
                // The sink does blocking file I/O
                match tokio::task::spawn_blocking(move || extractor.extract(&message, location)).await {
                    Ok(outcome) => debug!("Extraction outcome: {:?}", outcome),
                    Err(e) => warn!("Extraction task failed: {}", e),
                }
                IcapResponse::NoContent
            }
        };

        write_response(&mut stream, response).await?;
        // The exchange is single-shot; a failed shutdown only means the peer is gone.
        let _ = stream.shutdown().await;
        return Ok(Some(response));
    }
}

async fn read_chunk<S>(stream: &mut S, chunk: &mut [u8], limit: Option<Duration>) -> Result<usize>
where
    S: AsyncRead + Unpin,
{
    let read = match limit {
        Some(limit) => tokio::time::timeout(limit, stream.read(chunk))
            .await
            .map_err(|_| ServerError::IdleTimeout(limit))?,
        None => stream.read(chunk).await,
    };
    Ok(read?)
}
