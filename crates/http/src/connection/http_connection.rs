//! Connection handling: the per-request dispatch state machine.
//!
//! [`HttpConnection`] drives one accepted connection through
//! parse → handle → respond. Every error exit still sends a well-formed
//! response (`400` for decode failures, `500` for handler failures) — a
//! connection is never dropped silently. Exactly one response goes out per
//! accepted connection; keep-alive is carried by [`Response`] but unused.

use std::future::Future;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{error, info};

use crate::codec::{DecodeLimits, RequestDecoder, ResponseEncoder};
use crate::handler::Handler;
use crate::protocol::{HttpError, ParseError, Request, Response, SendError, Status, WsError};
use crate::websocket::{self, WsConnection};

use super::ServerStats;

/// An HTTP connection that manages request processing and the response
/// write-back.
///
/// # Type Parameters
///
/// * `R`: the async readable half
/// * `W`: the async writable half
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
    stats: Arc<ServerStats>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, stats: Arc<ServerStats>) -> Self {
        Self::with_limits(reader, writer, stats, DecodeLimits::default())
    }

    pub fn with_limits(
        reader: R,
        writer: W,
        stats: Arc<ServerStats>,
        limits: DecodeLimits,
    ) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(
                reader,
                RequestDecoder::with_limits(limits),
                16 * 1024,
            ),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
            stats,
        }
    }

    /// Processes one request/response cycle, then closes.
    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
    {
        self.stats.connection_opened();
        let result = self.serve_one(handler).await;
        if result.is_err() {
            self.stats.record_error();
        }
        self.stats.connection_closed();
        result
    }

    /// Like [`HttpConnection::process`], but when the request qualifies as a
    /// WebSocket upgrade the handshake is answered and the connection is
    /// handed to `on_upgrade` as a [`WsConnection`] instead of dispatching
    /// to the handler.
    pub async fn process_with_upgrade<H, F, Fut>(
        mut self,
        handler: Arc<H>,
        on_upgrade: F,
    ) -> Result<(), HttpError>
    where
        H: Handler,
        F: FnOnce(Request, WsConnection<R, W>) -> Fut,
        Fut: Future<Output = Result<(), WsError>>,
    {
        self.stats.connection_opened();

        let first = self.framed_read.next().await;
        let result = match first {
            Some(Ok(request)) if websocket::is_upgrade_request(&request) => {
                self.stats.record_request(request.body_len() as u64);
                let stats = Arc::clone(&self.stats);

                let result = match self.upgrade(&request).await {
                    Ok(ws) => {
                        info!("websocket handshake completed");
                        on_upgrade(request, ws).await.map_err(HttpError::from)
                    }
                    Err(e) => Err(e),
                };
                if result.is_err() {
                    stats.record_error();
                }
                stats.connection_closed();
                return result;
            }
            other => self.finish_cycle(other, handler).await,
        };

        if result.is_err() {
            self.stats.record_error();
        }
        self.stats.connection_closed();
        result
    }

    async fn serve_one<H>(&mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
    {
        let first = self.framed_read.next().await;
        self.finish_cycle(first, handler).await
    }

    async fn finish_cycle<H>(
        &mut self,
        decoded: Option<Result<Request, ParseError>>,
        handler: Arc<H>,
    ) -> Result<(), HttpError>
    where
        H: Handler,
    {
        match decoded {
            Some(Ok(request)) => self.dispatch(request, handler).await,

            Some(Err(e)) => {
                error!(cause = %e, "failed to parse request");
                self.send_response(Response::error_page(Status::BadRequest, "Invalid HTTP request"))
                    .await?;
                Err(e.into())
            }

            None => {
                info!("connection closed before a request arrived");
                Ok(())
            }
        }
    }

    async fn dispatch<H>(&mut self, request: Request, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
    {
        self.stats.record_request(request.body_len() as u64);

        match handler.call(request).await {
            Ok(response) => self.send_response(response).await,
            Err(e) => {
                let cause: Box<dyn std::error::Error + Send + Sync> = e.into();
                error!(cause = %cause, "request handler failed");
                self.send_response(Response::error_page(
                    Status::InternalServerError,
                    "Handler error",
                ))
                .await
            }
        }
    }

    async fn send_response(&mut self, response: Response) -> Result<(), HttpError> {
        let body_len = response.body_len() as u64;
        self.framed_write.send(response).await?;
        self.stats.record_bytes_sent(body_len);
        Ok(())
    }

    /// Answers the handshake and converts this connection into a WebSocket
    /// one, carrying over any bytes the HTTP decoder had already buffered.
    async fn upgrade(mut self, request: &Request) -> Result<WsConnection<R, W>, HttpError> {
        let key = request.header("Sec-WebSocket-Key").unwrap_or_default();
        let handshake = websocket::handshake_response(key);

        let writer = self.framed_write.get_mut();
        writer.write_all(&handshake).await.map_err(SendError::io)?;
        writer.flush().await.map_err(SendError::io)?;

        let leftover = self.framed_read.read_buffer().clone();
        let reader = self.framed_read.into_inner();
        let writer = self.framed_write.into_inner();
        Ok(WsConnection::with_leftover(reader, writer, leftover))
    }
}
