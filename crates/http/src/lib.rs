//! An asynchronous HTTP/1.1 and WebSocket protocol layer
//!
//! This crate is the wire side of the lantern server: it decodes raw bytes
//! from a socket into a structured [`protocol::Request`], hands it to an
//! application [`handler::Handler`], and serializes the resulting
//! [`protocol::Response`] back onto the wire. It also speaks a subset of the
//! WebSocket protocol — upgrade handshake, single-frame messages, control
//! frames — for real-time endpoints.
//!
//! It knows nothing about routing, sessions or templates; those live in the
//! `lantern-web` crate on top.
//!
//! # Example
//!
//! ```no_run
//! use std::convert::Infallible;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn};
//! use lantern_http::connection::{HttpConnection, ServerStats};
//! use lantern_http::handler::make_handler;
//! use lantern_http::protocol::{Request, Response};
//!
//! #[tokio::main]
//! async fn main() {
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = Arc::new(make_handler(hello_world));
//!     let stats = Arc::new(ServerStats::new());
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = handler.clone();
//!         let stats = stats.clone();
//!
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let connection = HttpConnection::new(reader, writer, stats);
//!             match connection.process(handler).await {
//!                 Ok(_) => info!("finished process, connection shutdown"),
//!                 Err(e) => error!(cause = %e, "connection error, shutdown"),
//!             }
//!         });
//!     }
//! }
//!
//! async fn hello_world(request: Request) -> Result<Response, Infallible> {
//!     info!(path = request.path(), "incoming request");
//!     Ok(Response::text("Hello World!\r\n"))
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: request/response values, enumerations and errors
//! - [`codec`]: byte-level request decoding and response encoding
//! - [`websocket`]: upgrade handshake, frame codec, framed connection
//! - [`connection`]: per-connection dispatch and server statistics
//! - [`handler`]: the request handler contract
//!
//! # Limitations
//!
//! - HTTP/1.1 only, one request per connection (no keep-alive reuse)
//! - Body framing by `Content-Length` only — no chunked transfer encoding
//! - No TLS (terminate it in front of the server)
//! - WebSocket messages are single-frame; 64-bit payload lengths and
//!   fragmentation are not supported

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod websocket;

mod utils;
pub(crate) use utils::ensure;
