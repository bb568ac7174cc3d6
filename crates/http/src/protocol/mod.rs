//! Core HTTP protocol types.
//!
//! This module holds the value types the rest of the crate is built around:
//!
//! - [`Request`] / [`Response`]: fully decoded protocol messages with owned
//!   bodies whose lifetime is scoped to one request/response cycle
//! - [`Method`], [`Status`], [`ContentType`]: the closed enumerations the
//!   wire format is written in terms of
//! - [`Headers`]: an ordered multimap with case-insensitive first-match
//!   lookup
//! - [`HttpError`] and friends: the error taxonomy shared by the codecs and
//!   the connection layer
//!
//! The types here carry no IO; the byte-level work lives in
//! [`crate::codec`] and [`crate::websocket`].

mod method;
pub use method::Method;

mod headers;
pub use headers::Headers;

mod request;
pub use request::Request;
pub use request::RequestBuilder;

mod response;
pub use response::ContentType;
pub use response::Response;
pub use response::Status;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
pub use error::WsError;
