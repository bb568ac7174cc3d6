//! WebSocket frame codec.
//!
//! Implements the RFC 6455 subset this server speaks: single-frame messages,
//! 7-bit and 16-bit payload lengths, client-side masking. 64-bit extended
//! lengths are rejected on both sides of the codec.

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::ensure;
use crate::protocol::WsError;

/// Frame opcodes. `Continuation` is decoded but the connection layer rejects
/// it, since fragmented messages are unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl Opcode {
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0x0 => Some(Opcode::Continuation),
            0x1 => Some(Opcode::Text),
            0x2 => Some(Opcode::Binary),
            0x8 => Some(Opcode::Close),
            0x9 => Some(Opcode::Ping),
            0xA => Some(Opcode::Pong),
            _ => None,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Opcode::Continuation => 0x0,
            Opcode::Text => 0x1,
            Opcode::Binary => 0x2,
            Opcode::Close => 0x8,
            Opcode::Ping => 0x9,
            Opcode::Pong => 0xA,
        }
    }

    pub fn is_control(self) -> bool {
        matches!(self, Opcode::Close | Opcode::Ping | Opcode::Pong)
    }
}

/// One decoded WebSocket frame with its payload already unmasked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub fin: bool,
    pub opcode: Opcode,
    pub payload: Bytes,
}

impl Frame {
    pub fn text(payload: impl Into<Bytes>) -> Self {
        Self { fin: true, opcode: Opcode::Text, payload: payload.into() }
    }

    pub fn binary(payload: impl Into<Bytes>) -> Self {
        Self { fin: true, opcode: Opcode::Binary, payload: payload.into() }
    }

    pub fn close() -> Self {
        Self { fin: true, opcode: Opcode::Close, payload: Bytes::new() }
    }

    pub fn ping(payload: impl Into<Bytes>) -> Self {
        Self { fin: true, opcode: Opcode::Ping, payload: payload.into() }
    }

    pub fn pong(payload: impl Into<Bytes>) -> Self {
        Self { fin: true, opcode: Opcode::Pong, payload: payload.into() }
    }
}

/// Codec for WebSocket frames.
///
/// Outgoing frames are written unmasked with FIN set (single-frame messages
/// only). Incoming payloads above `max_payload` are rejected.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_payload: usize,
}

pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024;

impl FrameCodec {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_max_payload(max_payload: usize) -> Self {
        Self { max_payload }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD)
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = WsError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 2 {
            return Ok(None);
        }

        let first = src[0];
        let second = src[1];
        let masked = second & 0x80 != 0;

        let (payload_len, header_len) = match second & 0x7F {
            127 => return Err(WsError::UnsupportedLength),
            126 => {
                if src.len() < 4 {
                    return Ok(None);
                }
                ((usize::from(src[2]) << 8) | usize::from(src[3]), 4)
            }
            len => (usize::from(len), 2),
        };

        ensure!(
            payload_len <= self.max_payload,
            WsError::frame_too_large(payload_len, self.max_payload)
        );

        let mask_len = if masked { 4 } else { 0 };
        let frame_len = header_len + mask_len + payload_len;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        let opcode_bits = first & 0x0F;
        let opcode = Opcode::from_bits(opcode_bits).ok_or(WsError::protocol(opcode_bits))?;
        let fin = first & 0x80 != 0;

        let header = src.split_to(header_len + mask_len);
        let mut payload = src.split_to(payload_len);
        if masked {
            let mask = &header[header_len..header_len + 4];
            for (i, byte) in payload.iter_mut().enumerate() {
                *byte ^= mask[i % 4];
            }
        }

        Ok(Some(Frame { fin, opcode, payload: payload.freeze() }))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = WsError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let len = frame.payload.len();
        ensure!(len < 65536, WsError::frame_too_large(len, 65535));

        dst.reserve(4 + len);
        // FIN always set: this codec speaks single-frame messages only.
        dst.put_u8(0x80 | frame.opcode.bits());
        if len < 126 {
            dst.put_u8(len as u8);
        } else {
            dst.put_u8(126);
            dst.put_u16(len as u16);
        }
        dst.extend_from_slice(&frame.payload);
        Ok(())
    }
}
