//! WebSocket support: upgrade handshake, frame codec and a framed
//! connection wrapper.
//!
//! The split mirrors the HTTP side of the crate: [`handshake`] and [`frame`]
//! are pure byte-level codecs, while [`WsConnection`] owns the stream after
//! a successful upgrade and applies the control-frame semantics — automatic
//! pong replies, silently accepted pongs, and a clean termination signal
//! when the peer sends a close frame.

pub mod frame;
pub mod handshake;

pub use frame::{Frame, FrameCodec, Opcode};
pub use handshake::{accept_key, handshake_response, is_upgrade_request};

use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::debug;

use crate::protocol::WsError;

/// One received WebSocket message.
///
/// Pings surface here too: the pong echo has already been sent by the time
/// the caller sees [`WsMessage::Ping`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    Text(Bytes),
    Binary(Bytes),
    Ping(Bytes),
}

/// A WebSocket connection over a post-handshake stream.
pub struct WsConnection<R, W> {
    framed_read: FramedRead<R, FrameCodec>,
    framed_write: FramedWrite<W, FrameCodec>,
}

impl<R, W> WsConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_leftover(reader, writer, BytesMut::new())
    }

    /// Builds a connection that starts decoding from `leftover` — bytes the
    /// HTTP decoder had already buffered when the upgrade happened.
    pub fn with_leftover(reader: R, writer: W, leftover: BytesMut) -> Self {
        let mut framed_read = FramedRead::new(reader, FrameCodec::new());
        if !leftover.is_empty() {
            framed_read.read_buffer_mut().extend_from_slice(&leftover);
        }
        Self { framed_read, framed_write: FramedWrite::new(writer, FrameCodec::new()) }
    }

    /// Sends a single text frame.
    pub async fn send_text(&mut self, text: &str) -> Result<(), WsError> {
        self.framed_write.send(Frame::text(text.as_bytes().to_vec())).await
    }

    /// Sends a single binary frame.
    pub async fn send_binary(&mut self, payload: impl Into<Bytes>) -> Result<(), WsError> {
        self.framed_write.send(Frame::binary(payload.into())).await
    }

    /// Sends a close frame.
    pub async fn send_close(&mut self) -> Result<(), WsError> {
        self.framed_write.send(Frame::close()).await
    }

    /// Receives the next message, applying control-frame semantics.
    ///
    /// Returns `Ok(None)` when the peer sends a close frame or the stream
    /// ends — a normal termination, distinct from protocol errors. Pings are
    /// answered with a pong echo automatically and then reported to the
    /// caller; pongs are accepted silently.
    pub async fn next_message(&mut self) -> Result<Option<WsMessage>, WsError> {
        loop {
            let frame = match self.framed_read.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => return Err(e),
                None => return Ok(None),
            };

            match frame.opcode {
                Opcode::Close => {
                    debug!("peer sent close frame");
                    return Ok(None);
                }
                Opcode::Ping => {
                    self.framed_write.send(Frame::pong(frame.payload.clone())).await?;
                    return Ok(Some(WsMessage::Ping(frame.payload)));
                }
                Opcode::Pong => continue,
                Opcode::Text => return Ok(Some(WsMessage::Text(frame.payload))),
                Opcode::Binary => return Ok(Some(WsMessage::Binary(frame.payload))),
                // Fragmented messages are unsupported.
                Opcode::Continuation => return Err(WsError::protocol(Opcode::Continuation.bits())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;
    use tokio::io::AsyncWriteExt;

    use super::*;

    fn masked(frame_header: &[u8], mask: [u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut bytes = frame_header.to_vec();
        bytes.extend_from_slice(&mask);
        bytes.extend(payload.iter().enumerate().map(|(i, b)| b ^ mask[i % 4]));
        bytes
    }

    #[tokio::test]
    async fn text_message_received() {
        let (client, server) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);
        let mut connection = WsConnection::new(server_read, server_write);

        let (mut client_read, mut client_write) = tokio::io::split(client);
        client_write
            .write_all(&masked(&[0x81, 0x85], [0x37, 0xFA, 0x21, 0x3D], b"Hello"))
            .await
            .unwrap();

        let message = connection.next_message().await.unwrap().unwrap();
        assert_eq!(message, WsMessage::Text(Bytes::from_static(b"Hello")));

        connection.send_text("world").await.unwrap();
        let mut reply = [0u8; 7];
        client_read.read_exact(&mut reply).await.unwrap();
        assert_eq!(&reply, &[0x81, 0x05, b'w', b'o', b'r', b'l', b'd']);
    }

    #[tokio::test]
    async fn ping_gets_pong_echo_and_is_reported() {
        let (client, server) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);
        let mut connection = WsConnection::new(server_read, server_write);

        let (mut client_read, mut client_write) = tokio::io::split(client);
        client_write
            .write_all(&masked(&[0x89, 0x84], [1, 2, 3, 4], b"ping"))
            .await
            .unwrap();

        let message = connection.next_message().await.unwrap().unwrap();
        assert_eq!(message, WsMessage::Ping(Bytes::from_static(b"ping")));

        // The pong echo carries the same payload, unmasked.
        let mut pong = [0u8; 6];
        client_read.read_exact(&mut pong).await.unwrap();
        assert_eq!(&pong, &[0x8A, 0x04, b'p', b'i', b'n', b'g']);
    }

    #[tokio::test]
    async fn close_frame_terminates_normally() {
        let (client, server) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);
        let mut connection = WsConnection::new(server_read, server_write);

        let (_client_read, mut client_write) = tokio::io::split(client);
        client_write.write_all(&masked(&[0x88, 0x80], [9, 9, 9, 9], b"")).await.unwrap();

        assert!(connection.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pong_is_skipped_silently() {
        let (client, server) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);
        let mut connection = WsConnection::new(server_read, server_write);

        let (_client_read, mut client_write) = tokio::io::split(client);
        // a pong followed by a text frame: only the text surfaces
        let mut stream = masked(&[0x8A, 0x84], [5, 6, 7, 8], b"late");
        stream.extend(masked(&[0x81, 0x82], [1, 1, 1, 1], b"ok"));
        client_write.write_all(&stream).await.unwrap();

        let message = connection.next_message().await.unwrap().unwrap();
        assert_eq!(message, WsMessage::Text(Bytes::from_static(b"ok")));
    }

    #[tokio::test]
    async fn leftover_bytes_are_decoded_first() {
        let (client, server) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);

        let mut leftover = BytesMut::new();
        leftover.extend_from_slice(&[0x81, 0x02, b'h', b'i']);
        let mut connection = WsConnection::with_leftover(server_read, server_write, leftover);
        drop(client);

        let message = connection.next_message().await.unwrap().unwrap();
        assert_eq!(message, WsMessage::Text(Bytes::from_static(b"hi")));
        assert!(connection.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn continuation_frame_is_protocol_error() {
        let (client, server) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);
        let mut connection = WsConnection::new(server_read, server_write);

        let (_client_read, mut client_write) = tokio::io::split(client);
        client_write.write_all(&masked(&[0x80, 0x81], [1, 2, 3, 4], b"x")).await.unwrap();

        let result = connection.next_message().await;
        assert!(matches!(result, Err(WsError::Protocol { opcode: 0x0 })));
    }
}
