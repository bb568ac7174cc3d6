use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    Request {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    Response {
        #[from]
        source: SendError,
    },

    #[error("websocket error: {source}")]
    WebSocket {
        #[from]
        source: WsError,
    },
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed request line: {reason}")]
    MalformedRequestLine { reason: String },

    #[error("unknown http method: {token:?}")]
    UnknownMethod { token: String },

    #[error("header section too large, current: {current} exceed the limit {max}")]
    HeadTooLarge { current: usize, max: usize },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn malformed<S: ToString>(reason: S) -> Self {
        Self::MalformedRequestLine { reason: reason.to_string() }
    }

    pub fn unknown_method<S: ToString>(token: S) -> Self {
        Self::UnknownMethod { token: token.to_string() }
    }

    pub fn head_too_large(current: usize, max: usize) -> Self {
        Self::HeadTooLarge { current, max }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum WsError {
    #[error("64-bit extended payload length is not supported")]
    UnsupportedLength,

    #[error("frame payload {length} exceeds the limit {max}")]
    FrameTooLarge { length: usize, max: usize },

    #[error("protocol error: unsupported opcode {opcode:#03x}")]
    Protocol { opcode: u8 },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl WsError {
    pub fn frame_too_large(length: usize, max: usize) -> Self {
        Self::FrameTooLarge { length, max }
    }

    pub fn protocol(opcode: u8) -> Self {
        Self::Protocol { opcode }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
