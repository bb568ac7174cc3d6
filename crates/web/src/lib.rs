//! The lantern web application layer
//!
//! Builds on `lantern-http` to provide what a dynamic web application needs
//! beyond the wire protocol:
//!
//! - [`router`]: an ordered route table with wildcard and `{param}` path
//!   patterns, first-match-wins
//! - [`handler`]: the route handler contract and [`handler_fn`] closure
//!   adaptor
//! - [`session`]: cookie-correlated server-side sessions with idle expiry
//! - [`template`]: strict `{{name}}` substitution for dynamic pages
//! - [`security`]: hardening headers, rate limiting and CSRF tokens
//! - [`json`]: JSON API response envelopes
//! - [`files`] and [`encode`]: static file responses and text escaping
//! - [`Server`]: the accept loop tying it all together
//!
//! # Example
//!
//! ```no_run
//! use lantern_http::protocol::{Method, Response};
//! use lantern_web::router::Route;
//! use lantern_web::{RequestContext, Server, handler_fn};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::builder()
//!         .address("127.0.0.1:8080")
//!         .route(Route::new(
//!             Method::Get,
//!             "/users/{id}",
//!             handler_fn(|ctx: &RequestContext| {
//!                 let id = ctx.path_param("id").unwrap_or_default();
//!                 async move { Ok(Response::text(format!("user {id}"))) }
//!             }),
//!             "User profile",
//!         ))
//!         .build()
//!         .expect("server configuration");
//!
//!     server.start().await;
//! }
//! ```

mod config;
mod handler;
mod server;

pub mod encode;
pub mod files;
pub mod json;
pub mod router;
pub mod security;
pub mod session;
pub mod template;

pub use config::ServerConfig;
pub use handler::BoxError;
pub use handler::FnHandler;
pub use handler::RequestContext;
pub use handler::RouteHandler;
pub use handler::handler_fn;
pub use server::Server;
pub use server::ServerBuildError;
pub use server::ServerBuilder;
pub use server::WsHandler;
pub use server::WsStream;
