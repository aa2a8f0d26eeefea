//! Length-prefixed framing of JSON envelopes
//!
//! Format: [4 bytes little-endian length][UTF-8 JSON payload]

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::game::constants::net::MAX_MESSAGE_SIZE;
use crate::net::protocol::{self, ProtocolError};

/// Errors that can occur during message framing
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Message too large: {0} bytes (max {1})")]
    MessageTooLarge(usize, usize),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl FramingError {
    /// Whether the stream is unusable after this error
    ///
    /// A frame that fails to decode is skipped; the stream stays in sync.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FramingError::Protocol(_))
    }
}

/// Read one raw frame
pub async fn read_message<R: AsyncRead + Unpin>(stream: &mut R) -> Result<Vec<u8>, FramingError> {
    let mut header = [0u8; 4];
    fill(stream, &mut header).await?;

    let len = u32::from_le_bytes(header) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(FramingError::MessageTooLarge(len, MAX_MESSAGE_SIZE));
    }

    let mut payload = vec![0u8; len];
    if len > 0 {
        fill(stream, &mut payload).await?;
    }
    Ok(payload)
}

/// `read_exact`, with a short read reported as a closed connection
async fn fill<R: AsyncRead + Unpin>(stream: &mut R, buf: &mut [u8]) -> Result<(), FramingError> {
    match stream.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(FramingError::ConnectionClosed),
        Err(e) => Err(FramingError::Io(e)),
    }
}

/// Write one raw frame and flush
pub async fn write_message<W: AsyncWrite + Unpin>(
    stream: &mut W,
    payload: &[u8],
) -> Result<(), FramingError> {
    let len = payload.len();
    if len > MAX_MESSAGE_SIZE {
        return Err(FramingError::MessageTooLarge(len, MAX_MESSAGE_SIZE));
    }

    stream.write_all(&(len as u32).to_le_bytes()).await?;
    stream.write_all(payload).await?;
    stream.flush().await?;
    Ok(())
}

/// Read and decode one JSON envelope
pub async fn read_json<R, T>(stream: &mut R) -> Result<T, FramingError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let frame = read_message(stream).await?;
    Ok(protocol::decode(&frame)?)
}

/// Encode and write one JSON envelope, returning the payload size
pub async fn write_json<W, T>(stream: &mut W, message: &T) -> Result<usize, FramingError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let bytes = protocol::encode(message)?;
    write_message(stream, &bytes).await?;
    Ok(bytes.len())
}
