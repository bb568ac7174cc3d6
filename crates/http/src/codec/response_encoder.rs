//! HTTP response encoder.
//!
//! Writes the status line, `Content-Type`, `Content-Length`, the custom
//! headers in insertion order, a blank line and the body bytes verbatim.
//! There is no chunked encoding and no transfer negotiation: the body length
//! is always announced up front.

use bytes::BytesMut;
use tokio_util::codec::Encoder;

use crate::protocol::{Response, SendError};

#[derive(Debug, Default)]
pub struct ResponseEncoder;

impl ResponseEncoder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Encoder<Response> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, response: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let status = response.status();
        let mut head = String::with_capacity(128);
        head.push_str(&format!("HTTP/1.1 {} {}\r\n", status.code(), status.reason()));
        head.push_str(&format!("Content-Type: {}\r\n", response.content_type().as_str()));
        head.push_str(&format!("Content-Length: {}\r\n", response.body_len()));
        for (name, value) in response.headers().iter() {
            head.push_str(&format!("{name}: {value}\r\n"));
        }
        head.push_str("\r\n");

        dst.reserve(head.len() + response.body_len());
        dst.extend_from_slice(head.as_bytes());
        dst.extend_from_slice(response.body());
        Ok(())
    }
}
