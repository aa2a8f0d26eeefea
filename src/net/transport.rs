//! TCP transport
//!
//! A reader task decodes frames and hands them to the session's inbound
//! buffer. Writing happens on the session task itself, after each step of the
//! loop, so intents leave in the order they were queued.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::metrics::ClientMetrics;
use crate::net::event_buffer::{InboundSender, OutboundError};
use crate::net::framing::{self, FramingError};
use crate::net::protocol::{self, ClientIntent, ServerEvent};

/// Back-off while the inbound buffer is full
const INBOUND_RETRY: Duration = Duration::from_millis(1);

/// Open a connection to the game server
pub async fn connect(address: &str) -> anyhow::Result<TcpStream> {
    let stream = TcpStream::connect(address)
        .await
        .with_context(|| format!("failed to connect to {}", address))?;
    stream
        .set_nodelay(true)
        .context("failed to set TCP_NODELAY")?;
    info!("Connected to {}", address);
    Ok(stream)
}

/// Spawn the reader task
pub fn spawn_reader<R>(
    reader: R,
    sender: InboundSender,
    metrics: Arc<ClientMetrics>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(read_loop(reader, sender, metrics))
}

/// Read frames until the stream ends, then report a disconnect
///
/// Frames that fail to decode are skipped. The loop stops early if the
/// session has gone away.
pub async fn read_loop<R>(mut reader: R, sender: InboundSender, metrics: Arc<ClientMetrics>)
where
    R: AsyncRead + Unpin,
{
    loop {
        let result = framing::read_message(&mut reader).await.and_then(|frame| {
            metrics.record_received(frame.len());
            Ok(protocol::decode::<ServerEvent>(&frame)?)
        });

        match result {
            Ok(event) => {
                trace!("<- {}", event.name());
                if !deliver(&sender, event).await {
                    debug!("Session gone, reader stopping");
                    return;
                }
            }
            Err(e) if !e.is_fatal() => {
                warn!("Skipping undecodable frame: {}", e);
                ClientMetrics::add(&metrics.undecodable_frames, 1);
            }
            Err(FramingError::ConnectionClosed) => {
                info!("Server closed the connection");
                break;
            }
            Err(e) => {
                warn!("Read error: {}", e);
                break;
            }
        }
    }

    deliver(&sender, ServerEvent::Disconnect).await;
}

/// Push into the inbound buffer, waiting out backpressure
async fn deliver(sender: &InboundSender, mut event: ServerEvent) -> bool {
    loop {
        match sender.try_send(event) {
            Ok(()) => return true,
            Err((OutboundError::Full, returned)) => {
                event = returned;
                tokio::time::sleep(INBOUND_RETRY).await;
            }
            Err((OutboundError::Disconnected, _)) => return false,
        }
    }
}

/// Write queued intents in order
///
/// An intent that fails to encode is dropped; I/O errors end the batch.
pub async fn write_intents<W>(
    writer: &mut W,
    intents: &[ClientIntent],
    metrics: &ClientMetrics,
) -> Result<(), FramingError>
where
    W: AsyncWrite + Unpin,
{
    for intent in intents {
        match framing::write_json(writer, intent).await {
            Ok(bytes) => {
                metrics.record_sent(bytes);
                trace!("-> {} bytes", bytes);
            }
            Err(e) if !e.is_fatal() => warn!("Dropping unencodable intent: {}", e),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::event_buffer::InboundBuffer;
    use crate::util::vec2::Vec2;
    use serde_json::json;
    use std::io::Cursor;
    use std::sync::atomic::Ordering;

    fn raw_frame(payload: &[u8]) -> Vec<u8> {
        let mut out = (payload.len() as u32).to_le_bytes().to_vec();
        out.extend_from_slice(payload);
        out
    }

    fn frame(value: serde_json::Value) -> Vec<u8> {
        raw_frame(&serde_json::to_vec(&value).unwrap())
    }

    #[tokio::test]
    async fn test_reader_decodes_then_reports_disconnect() {
        let mut bytes = frame(json!({"event": "RIP"}));
        bytes.extend(frame(json!({"event": "serverMSG", "data": "hello"})));

        let buffer = InboundBuffer::new(16);
        let metrics = Arc::new(ClientMetrics::new());
        read_loop(Cursor::new(bytes), buffer.sender(), metrics.clone()).await;

        assert_eq!(
            buffer.drain(),
            vec![
                ServerEvent::Rip,
                ServerEvent::ServerMessage("hello".to_string()),
                ServerEvent::Disconnect,
            ]
        );
        assert_eq!(metrics.messages_received.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_reader_skips_undecodable_frames() {
        let mut bytes = frame(json!({"event": "not-a-thing"}));
        bytes.extend(frame(json!({"event": "pongcheck"})));

        let buffer = InboundBuffer::new(16);
        let metrics = Arc::new(ClientMetrics::new());
        read_loop(Cursor::new(bytes), buffer.sender(), metrics.clone()).await;

        assert_eq!(
            buffer.drain(),
            vec![ServerEvent::PongCheck, ServerEvent::Disconnect]
        );
        assert_eq!(metrics.undecodable_frames.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_reader_waits_out_full_buffer() {
        let bytes: Vec<u8> = (0..3)
            .flat_map(|_| frame(json!({"event": "pongcheck"})))
            .collect();

        let buffer = InboundBuffer::new(1);
        let sender = buffer.sender();
        let metrics = Arc::new(ClientMetrics::new());
        let reader = tokio::spawn(read_loop(Cursor::new(bytes), sender, metrics));

        let mut received = Vec::new();
        while received.len() < 4 {
            received.extend(buffer.drain());
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        reader.await.unwrap();
        assert_eq!(received.last(), Some(&ServerEvent::Disconnect));
        assert_eq!(received.len(), 4);
    }

    #[tokio::test]
    async fn test_write_intents_frames_in_order() {
        let intents = vec![ClientIntent::Respawn, ClientIntent::heartbeat(Vec2::new(1.0, 2.0))];
        let mut expected = raw_frame(br#"{"event":"respawn"}"#);
        expected.extend(raw_frame(br#"{"event":"0","data":{"x":1.0,"y":2.0}}"#));

        let mut writer = tokio_test::io::Builder::new().write(&expected).build();
        let metrics = ClientMetrics::new();
        write_intents(&mut writer, &intents, &metrics).await.unwrap();

        assert_eq!(metrics.messages_sent.load(Ordering::Relaxed), 2);
        assert_eq!(
            metrics.bytes_sent.load(Ordering::Relaxed) as usize,
            expected.len() - 8
        );
    }

    #[tokio::test]
    async fn test_write_error_is_reported() {
        let mut writer = tokio_test::io::Builder::new()
            .write_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"))
            .build();
        let metrics = ClientMetrics::new();
        let result = write_intents(&mut writer, &[ClientIntent::FireGun], &metrics).await;
        assert!(matches!(result, Err(FramingError::Io(_))));
        assert_eq!(metrics.messages_sent.load(Ordering::Relaxed), 0);
    }
}
