//! The application server: accept loop, route dispatch, sessions and
//! policy.
//!
//! [`Server`] owns the shared mutable state — the route table behind a
//! read/write lock, the session store, the counters — and implements the
//! protocol layer's [`Handler`] so each spawned connection drives the full
//! parse → route → handle → respond cycle against it.

use std::net::SocketAddr;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::BytesMut;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::codec::Encoder;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use lantern_http::codec::ResponseEncoder;
use lantern_http::connection::{HttpConnection, ServerStats};
use lantern_http::handler::Handler;
use lantern_http::protocol::{Method, Request, Response, Status, WsError};
use lantern_http::websocket::WsConnection;

use crate::config::ServerConfig;
use crate::handler::{BoxError, RequestContext, RouteHandler};
use crate::router::{Route, RouteTable, RouterError};
use crate::security::{self, RateLimiter};
use crate::session::SessionStore;

/// A WebSocket connection as the server hands it to an upgrade handler.
pub type WsStream = WsConnection<OwnedReadHalf, OwnedWriteHalf>;

/// Handler for upgraded WebSocket connections.
#[async_trait]
pub trait WsHandler: Send + Sync {
    async fn handle(&self, request: Request, ws: WsStream) -> Result<(), WsError>;
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("address must be set")]
    MissingAddress,

    #[error("invalid listen address: {source}")]
    InvalidAddress {
        #[from]
        source: std::io::Error,
    },

    #[error(transparent)]
    Router(#[from] RouterError),
}

pub struct ServerBuilder {
    config: ServerConfig,
    address: Option<std::io::Result<Vec<SocketAddr>>>,
    routes: Vec<Route>,
    fallback: Option<Box<dyn RouteHandler>>,
    ws_handler: Option<Arc<dyn WsHandler>>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            address: None,
            routes: Vec::new(),
            fallback: None,
            ws_handler: None,
        }
    }

    pub fn address<A: std::net::ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(|addrs| addrs.collect()));
        self
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Handler invoked when no route matches, instead of the built-in 404.
    pub fn default_handler(mut self, handler: impl RouteHandler + 'static) -> Self {
        self.fallback = Some(Box::new(handler));
        self
    }

    pub fn websocket_handler(mut self, handler: impl WsHandler + 'static) -> Self {
        self.ws_handler = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let address = self.address.ok_or(ServerBuildError::MissingAddress)??;

        let mut table = RouteTable::with_capacity(self.config.route_capacity);
        for route in self.routes {
            table.add(route)?;
        }

        let sessions = Arc::new(SessionStore::with_settings(
            self.config.session_capacity,
            self.config.session_idle_timeout,
        ));
        let rate_limiter = self.config.rate_limit_per_minute.map(RateLimiter::with_limit);

        Ok(Server {
            config: self.config,
            address,
            routes: RwLock::new(table),
            sessions,
            rate_limiter,
            stats: Arc::new(ServerStats::new()),
            fallback: self.fallback,
            ws_handler: self.ws_handler,
        })
    }
}

pub struct Server {
    config: ServerConfig,
    address: Vec<SocketAddr>,
    routes: RwLock<RouteTable>,
    sessions: Arc<SessionStore>,
    rate_limiter: Option<RateLimiter>,
    stats: Arc<ServerStats>,
    fallback: Option<Box<dyn RouteHandler>>,
    ws_handler: Option<Arc<dyn WsHandler>>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn stats(&self) -> &Arc<ServerStats> {
        &self.stats
    }

    /// Registers a route. Callable while the server is running.
    pub fn add_route(&self, route: Route) -> Result<(), RouterError> {
        self.routes_mut().add(route)
    }

    /// Registers many routes, returning how many were accepted.
    pub fn add_routes(&self, routes: Vec<Route>) -> usize {
        self.routes_mut().add_all(routes)
    }

    /// Removes the first route with this method and exact pattern string.
    pub fn remove_route(&self, method: Method, pattern: &str) -> Result<(), RouterError> {
        self.routes_mut().remove(method, pattern)
    }

    pub fn route_count(&self) -> usize {
        self.routes().len()
    }

    /// Binds the listener and serves connections until the task is dropped.
    pub async fn start(self) {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("setting default subscriber failed");

        info!(address = ?self.address, routes = self.route_count(), "start listening");
        let tcp_listener = match TcpListener::bind(self.address.as_slice()).await {
            Ok(tcp_listener) => tcp_listener,
            Err(e) => {
                error!(cause = %e, "bind server error");
                return;
            }
        };

        let server = Arc::new(self);
        loop {
            let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            if let Some(rate_limiter) = &server.rate_limiter {
                if !rate_limiter.check(&remote_addr.ip().to_string()) {
                    tokio::spawn(reject_rate_limited(tcp_stream));
                    continue;
                }
            }

            let server = Arc::clone(&server);
            tokio::spawn(async move {
                let result = server.serve_connection(tcp_stream).await;
                match result {
                    Ok(_) => debug!("finished process, connection shutdown"),
                    Err(e) => error!(cause = %e, "connection error, shutdown"),
                }
            });
        }
    }

    async fn serve_connection(
        self: Arc<Self>,
        tcp_stream: tokio::net::TcpStream,
    ) -> Result<(), lantern_http::protocol::HttpError> {
        let (reader, writer) = tcp_stream.into_split();
        let connection = HttpConnection::with_limits(
            reader,
            writer,
            Arc::clone(&self.stats),
            self.config.decode_limits.clone(),
        );

        let upgrade_handler = if self.config.enable_websockets {
            self.ws_handler.clone()
        } else {
            None
        };

        match upgrade_handler {
            Some(ws_handler) => {
                connection
                    .process_with_upgrade(Arc::clone(&self), move |request, ws| async move {
                        ws_handler.handle(request, ws).await
                    })
                    .await
            }
            None => connection.process(self).await,
        }
    }

    fn routes(&self) -> RwLockReadGuard<'_, RouteTable> {
        self.routes.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn routes_mut(&self) -> RwLockWriteGuard<'_, RouteTable> {
        self.routes.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Answers `503` without dispatching when a client is over its budget.
async fn reject_rate_limited(mut tcp_stream: tokio::net::TcpStream) {
    let response = Response::error_page(Status::ServiceUnavailable, "Too many requests");
    let mut buf = BytesMut::new();
    if ResponseEncoder::new().encode(response, &mut buf).is_ok() {
        let _ = tcp_stream.write_all(&buf).await;
        let _ = tcp_stream.shutdown().await;
    }
}

#[async_trait]
impl Handler for Server {
    type Error = BoxError;

    async fn call(&self, request: Request) -> Result<Response, Self::Error> {
        let route = self.routes().find(request.method(), request.path());

        let mut response = match route {
            Some(route) => {
                debug!(
                    pattern = route.pattern(),
                    description = route.description(),
                    "route matched"
                );
                let ctx = RequestContext::new(request, Some(Arc::clone(&route)));
                match route.handler().handle(&ctx).await {
                    Ok(response) => response,
                    Err(e) => {
                        error!(cause = %e, pattern = route.pattern(), "route handler failed");
                        Response::error_page(Status::InternalServerError, "Handler error")
                    }
                }
            }
            None => {
                info!(method = %request.method(), path = request.path(), "no route found");
                let ctx = RequestContext::new(request, None);
                match &self.fallback {
                    Some(fallback) => match fallback.handle(&ctx).await {
                        Ok(response) => response,
                        Err(e) => {
                            error!(cause = %e, "fallback handler failed");
                            Response::error_page(Status::InternalServerError, "Handler error")
                        }
                    },
                    None => Response::error_page(Status::NotFound, "Page not found"),
                }
            }
        };

        if self.config.enable_security_headers {
            security::add_security_headers(&mut response);
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use lantern_http::protocol::ContentType;

    fn test_server() -> Server {
        Server::builder()
            .address("127.0.0.1:0")
            .route(Route::new(
                Method::Get,
                "/hello",
                handler_fn(|_ctx: &RequestContext| async {
                    Ok(Response::text("hello"))
                }),
                "hello",
            ))
            .route(Route::new(
                Method::Get,
                "/users/{id}",
                handler_fn(|ctx: &RequestContext| {
                    let id = ctx.path_param("id").unwrap_or_default();
                    async move { Ok(Response::text(id)) }
                }),
                "user profile",
            ))
            .route(Route::new(
                Method::Get,
                "/broken",
                handler_fn(|_ctx: &RequestContext| async {
                    Err::<Response, BoxError>("boom".into())
                }),
                "always fails",
            ))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn dispatches_to_matched_route() {
        let server = test_server();
        let request = Request::builder().path("/hello").build();
        let response = server.call(request).await.unwrap();
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.body(), b"hello");
    }

    #[tokio::test]
    async fn path_params_reach_the_handler() {
        let server = test_server();
        let request = Request::builder().path("/users/314").build();
        let response = server.call(request).await.unwrap();
        assert_eq!(response.body(), b"314");
    }

    #[tokio::test]
    async fn unmatched_path_is_404() {
        let server = test_server();
        let request = Request::builder().path("/nope").build();
        let response = server.call(request).await.unwrap();
        assert_eq!(response.status(), Status::NotFound);
    }

    #[tokio::test]
    async fn handler_failure_is_500() {
        let server = test_server();
        let request = Request::builder().path("/broken").build();
        let response = server.call(request).await.unwrap();
        assert_eq!(response.status(), Status::InternalServerError);
    }

    #[tokio::test]
    async fn method_mismatch_is_404() {
        let server = test_server();
        let request = Request::builder().method(Method::Post).path("/hello").build();
        let response = server.call(request).await.unwrap();
        assert_eq!(response.status(), Status::NotFound);
    }

    #[tokio::test]
    async fn security_headers_applied_when_enabled() {
        let config = ServerConfig { enable_security_headers: true, ..ServerConfig::default() };
        let server = Server::builder()
            .address("127.0.0.1:0")
            .config(config)
            .build()
            .unwrap();

        let request = Request::builder().path("/missing").build();
        let response = server.call(request).await.unwrap();
        assert_eq!(response.status(), Status::NotFound);
        assert_eq!(response.header("X-Frame-Options"), Some("DENY"));
    }

    #[tokio::test]
    async fn fallback_handler_replaces_404() {
        let server = Server::builder()
            .address("127.0.0.1:0")
            .default_handler(handler_fn(|ctx: &RequestContext| {
                let path = ctx.request().path().to_string();
                async move {
                    Ok(Response::new(
                        Status::NotFound,
                        ContentType::Plain,
                        format!("custom miss: {path}"),
                    ))
                }
            }))
            .build()
            .unwrap();

        let request = Request::builder().path("/ghost").build();
        let response = server.call(request).await.unwrap();
        assert_eq!(response.body(), b"custom miss: /ghost");
    }

    #[tokio::test]
    async fn routes_can_change_at_runtime() {
        let server = test_server();
        server
            .add_route(Route::new(
                Method::Get,
                "/late",
                handler_fn(|_ctx: &RequestContext| async { Ok(Response::text("late")) }),
                "added later",
            ))
            .unwrap();

        let response = server.call(Request::builder().path("/late").build()).await.unwrap();
        assert_eq!(response.body(), b"late");

        server.remove_route(Method::Get, "/late").unwrap();
        let response = server.call(Request::builder().path("/late").build()).await.unwrap();
        assert_eq!(response.status(), Status::NotFound);
    }

    #[test]
    fn build_without_address_fails() {
        let result = Server::builder().build();
        assert!(matches!(result, Err(ServerBuildError::MissingAddress)));
    }
}
